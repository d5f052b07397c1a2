#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, header},
    routing::{get, post, put},
};
use base64::Engine as _;
use serde_json::{Value, json};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;
use url::Url;

#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Default)]
struct CouchState {
    dbs: BTreeMap<String, BTreeMap<String, Value>>,
    reqs: Vec<Captured>,
    required_auth: Option<String>,
    fail_replicate: bool,
    replicate_not_ok: bool,
}

/// Minimal document store speaking the subset of the CouchDB HTTP API the
/// transport uses.
#[derive(Clone, Default)]
pub struct FakeCouch {
    state: Arc<Mutex<CouchState>>,
}

type Reply = (StatusCode, Json<Value>);

fn not_found(reason: &str) -> Reply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not_found", "reason": reason })),
    )
}

impl FakeCouch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects requests lacking `Authorization: Basic base64(user:pass)`.
    pub fn require_basic_auth(&self, user: &str, pass: &str) {
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
        self.state.lock().unwrap().required_auth = Some(format!("Basic {token}"));
    }

    pub fn add_database(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .dbs
            .entry(name.to_string())
            .or_default();
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.state.lock().unwrap().dbs.contains_key(name)
    }

    pub fn set_fail_replicate(&self, fail: bool) {
        self.state.lock().unwrap().fail_replicate = fail;
    }

    pub fn set_replicate_not_ok(&self, not_ok: bool) {
        self.state.lock().unwrap().replicate_not_ok = not_ok;
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.state.lock().unwrap().reqs.clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Captured> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    fn capture(&self, method: Method, path: String, headers: &HeaderMap, body: &[u8]) -> Option<Reply> {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let mut state = self.state.lock().unwrap();
        state.reqs.push(Captured {
            method,
            path,
            authorization: authorization.clone(),
            body: body.to_vec(),
        });
        match state.required_auth.as_ref() {
            Some(expected) if authorization.as_ref() != Some(expected) => Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "unauthorized",
                    "reason": "Name or password is incorrect."
                })),
            )),
            _ => None,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/_all_dbs", get(all_dbs))
            .route("/_replicate", post(replicate))
            .route("/{db}", get(db_info).put(create_db).delete(delete_db))
            .route("/{db}/{doc}", put(put_doc).get(get_doc))
            .with_state(self.clone())
    }

    /// Serves on an ephemeral loopback port; returns the bound port.
    pub async fn spawn(&self) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let port = listener.local_addr().expect("local addr").port();
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server run");
        });
        port
    }
}

pub fn base_url(port: u16) -> Url {
    Url::parse(&format!("http://127.0.0.1:{port}/")).expect("valid base url")
}

async fn all_dbs(State(couch): State<FakeCouch>, headers: HeaderMap) -> Reply {
    if let Some(denied) = couch.capture(Method::GET, "/_all_dbs".to_string(), &headers, &[]) {
        return denied;
    }
    let names: Vec<String> = couch.state.lock().unwrap().dbs.keys().cloned().collect();
    (StatusCode::OK, Json(json!(names)))
}

async fn create_db(
    State(couch): State<FakeCouch>,
    Path(db): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Some(denied) = couch.capture(Method::PUT, format!("/{db}"), &headers, &[]) {
        return denied;
    }
    let mut state = couch.state.lock().unwrap();
    if state.dbs.contains_key(&db) {
        return (
            StatusCode::PRECONDITION_FAILED,
            Json(json!({
                "error": "file_exists",
                "reason": "The database could not be created, the file already exists."
            })),
        );
    }
    state.dbs.insert(db, BTreeMap::new());
    (StatusCode::CREATED, Json(json!({ "ok": true })))
}

async fn delete_db(
    State(couch): State<FakeCouch>,
    Path(db): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Some(denied) = couch.capture(Method::DELETE, format!("/{db}"), &headers, &[]) {
        return denied;
    }
    match couch.state.lock().unwrap().dbs.remove(&db) {
        Some(_) => (StatusCode::OK, Json(json!({ "ok": true }))),
        None => not_found("Database does not exist."),
    }
}

async fn db_info(
    State(couch): State<FakeCouch>,
    Path(db): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Some(denied) = couch.capture(Method::GET, format!("/{db}"), &headers, &[]) {
        return denied;
    }
    match couch.state.lock().unwrap().dbs.get(&db) {
        Some(docs) => (
            StatusCode::OK,
            Json(json!({
                "db_name": db,
                "doc_count": docs.len(),
                "doc_del_count": 0,
                "update_seq": format!("{}-g1AAAA", docs.len()),
                "purge_seq": "0-g1AAAA"
            })),
        ),
        None => not_found("Database does not exist."),
    }
}

async fn get_doc(
    State(couch): State<FakeCouch>,
    Path((db, doc)): Path<(String, String)>,
    headers: HeaderMap,
) -> Reply {
    if let Some(denied) = couch.capture(Method::GET, format!("/{db}/{doc}"), &headers, &[]) {
        return denied;
    }
    let state = couch.state.lock().unwrap();
    let Some(docs) = state.dbs.get(&db) else {
        return not_found("Database does not exist.");
    };
    match docs.get(&doc) {
        Some(body) => (StatusCode::OK, Json(body.clone())),
        None => not_found("missing"),
    }
}

async fn put_doc(
    State(couch): State<FakeCouch>,
    Path((db, doc)): Path<(String, String)>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Reply {
    if let Some(denied) = couch.capture(Method::PUT, format!("/{db}/{doc}"), &headers, &body) {
        return denied;
    }
    let Ok(mut value) = serde_json::from_slice::<Value>(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "bad_request", "reason": "invalid UTF-8 JSON" })),
        );
    };
    let mut state = couch.state.lock().unwrap();
    let Some(docs) = state.dbs.get_mut(&db) else {
        return not_found("Database does not exist.");
    };
    let rev = format!("{}-0123abcd", docs.len() + 1);
    if let Some(obj) = value.as_object_mut() {
        obj.insert("_id".to_string(), json!(doc));
        obj.insert("_rev".to_string(), json!(rev));
    }
    docs.insert(doc.clone(), value);
    (
        StatusCode::CREATED,
        Json(json!({ "ok": true, "id": doc, "rev": rev })),
    )
}

async fn replicate(
    State(couch): State<FakeCouch>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Reply {
    if let Some(denied) = couch.capture(Method::POST, "/_replicate".to_string(), &headers, &body) {
        return denied;
    }
    let state = couch.state.lock().unwrap();
    if state.fail_replicate {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "replication_failed",
                "reason": "{checkpoint_commit_failure, <<\"Target database out of sync\">>}"
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "ok": !state.replicate_not_ok,
            "session_id": "f0e1d2c3b4a5",
            "source_last_seq": "7-g1AAAA",
            "history": [{
                "session_id": "f0e1d2c3b4a5",
                "start_time": "Fri, 16 Oct 2026 09:00:00 GMT",
                "end_time": "Fri, 16 Oct 2026 09:00:01 GMT",
                "docs_read": 7,
                "docs_written": 7,
                "doc_write_failures": 0
            }]
        })),
    )
}
