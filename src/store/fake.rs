use super::{StoreEndpoint, StoreSide, StoreTransport, TransportFactory};
use crate::error::StoreError;
use foldersync_schema::{
    DatabaseInfo, DocumentWriteResponse, ReplicateRequest, ReplicationStatus, StoreErrorBody,
};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

/// One store call as observed by the fake: side and operation, e.g. `(Local, "list")`.
pub(crate) type Call = (StoreSide, String);

#[derive(Debug)]
struct StoreState {
    databases: BTreeSet<String>,
    docs: HashMap<(String, String), Value>,
    down: bool,
    fail_replicate: bool,
    replicate_ok: bool,
    replications: Vec<ReplicateRequest>,
}

/// In-memory store instance shared by every transport built for one side.
#[derive(Debug)]
pub(crate) struct FakeStore {
    side: StoreSide,
    state: Mutex<StoreState>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeStore {
    fn new(side: StoreSide, calls: Arc<Mutex<Vec<Call>>>) -> Self {
        Self {
            side,
            state: Mutex::new(StoreState {
                databases: BTreeSet::new(),
                docs: HashMap::new(),
                down: false,
                fail_replicate: false,
                replicate_ok: true,
                replications: Vec::new(),
            }),
            calls,
        }
    }

    pub(crate) fn add_database(&self, name: &str) {
        self.state.lock().unwrap().databases.insert(name.to_string());
    }

    pub(crate) fn has_database(&self, name: &str) -> bool {
        self.state.lock().unwrap().databases.contains(name)
    }

    pub(crate) fn set_down(&self, down: bool) {
        self.state.lock().unwrap().down = down;
    }

    pub(crate) fn set_fail_replicate(&self, fail: bool) {
        self.state.lock().unwrap().fail_replicate = fail;
    }

    pub(crate) fn set_replicate_ok(&self, ok: bool) {
        self.state.lock().unwrap().replicate_ok = ok;
    }

    pub(crate) fn replications(&self) -> Vec<ReplicateRequest> {
        self.state.lock().unwrap().replications.clone()
    }

    fn record(&self, op: &str) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push((self.side, op.to_string()));
        if self.state.lock().unwrap().down {
            return Err(StoreError::UpstreamStatus {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: None,
            });
        }
        Ok(())
    }

    fn missing(name: &str) -> StoreError {
        StoreError::UpstreamStatus {
            status: StatusCode::NOT_FOUND,
            body: Some(StoreErrorBody {
                error: "not_found".to_string(),
                reason: format!("{name} does not exist"),
                ..Default::default()
            }),
        }
    }
}

#[derive(Debug)]
pub(crate) struct FakeTransport {
    endpoint: StoreEndpoint,
    store: Arc<FakeStore>,
}

#[async_trait::async_trait]
impl StoreTransport for FakeTransport {
    fn endpoint(&self) -> &StoreEndpoint {
        &self.endpoint
    }

    async fn list_databases(&self) -> Result<Vec<String>, StoreError> {
        self.store.record("list")?;
        Ok(self
            .store
            .state
            .lock()
            .unwrap()
            .databases
            .iter()
            .cloned()
            .collect())
    }

    async fn create_database(&self, name: &str) -> Result<(), StoreError> {
        self.store.record(&format!("create:{name}"))?;
        self.store.add_database(name);
        Ok(())
    }

    async fn delete_database(&self, name: &str) -> Result<(), StoreError> {
        self.store.record(&format!("delete:{name}"))?;
        if self.store.state.lock().unwrap().databases.remove(name) {
            Ok(())
        } else {
            Err(FakeStore::missing(name))
        }
    }

    async fn database_info(&self, name: &str) -> Result<DatabaseInfo, StoreError> {
        self.store.record(&format!("info:{name}"))?;
        if !self.store.has_database(name) {
            return Err(FakeStore::missing(name));
        }
        Ok(DatabaseInfo {
            db_name: name.to_string(),
            ..Default::default()
        })
    }

    async fn replicate(&self, request: &ReplicateRequest) -> Result<ReplicationStatus, StoreError> {
        self.store.record("replicate")?;
        let mut state = self.store.state.lock().unwrap();
        if state.fail_replicate {
            return Err(StoreError::UpstreamStatus {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: None,
            });
        }
        state.replications.push(request.clone());
        Ok(ReplicationStatus {
            ok: state.replicate_ok,
            ..Default::default()
        })
    }

    async fn get_document(&self, db: &str, doc_id: &str) -> Result<Option<Value>, StoreError> {
        self.store.record(&format!("get:{db}/{doc_id}"))?;
        let state = self.store.state.lock().unwrap();
        if !state.databases.contains(db) {
            return Err(FakeStore::missing(db));
        }
        Ok(state
            .docs
            .get(&(db.to_string(), doc_id.to_string()))
            .cloned())
    }

    async fn put_document(
        &self,
        db: &str,
        doc_id: &str,
        body: &Value,
    ) -> Result<DocumentWriteResponse, StoreError> {
        self.store.record(&format!("put:{db}/{doc_id}"))?;
        let mut state = self.store.state.lock().unwrap();
        if !state.databases.contains(db) {
            return Err(FakeStore::missing(db));
        }
        state
            .docs
            .insert((db.to_string(), doc_id.to_string()), body.clone());
        Ok(DocumentWriteResponse {
            ok: true,
            id: doc_id.to_string(),
            rev: "1-fake".to_string(),
        })
    }
}

/// Factory handing out transports over two shared fake stores.
#[derive(Debug)]
pub(crate) struct FakeFactory {
    pub(crate) local: Arc<FakeStore>,
    pub(crate) remote: Arc<FakeStore>,
    calls: Arc<Mutex<Vec<Call>>>,
    local_builds: AtomicUsize,
    remote_builds: AtomicUsize,
}

impl FakeFactory {
    pub(crate) fn new() -> Arc<Self> {
        let calls = Arc::new(Mutex::new(Vec::new()));
        Arc::new(Self {
            local: Arc::new(FakeStore::new(StoreSide::Local, calls.clone())),
            remote: Arc::new(FakeStore::new(StoreSide::Remote, calls.clone())),
            calls,
            local_builds: AtomicUsize::new(0),
            remote_builds: AtomicUsize::new(0),
        })
    }

    pub(crate) fn builds(&self, side: StoreSide) -> usize {
        match side {
            StoreSide::Local => self.local_builds.load(Ordering::SeqCst),
            StoreSide::Remote => self.remote_builds.load(Ordering::SeqCst),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_on(&self, side: StoreSide) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(s, _)| *s == side)
            .map(|(_, op)| op)
            .collect()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl TransportFactory for FakeFactory {
    fn build(&self, endpoint: &StoreEndpoint) -> Result<Arc<dyn StoreTransport>, StoreError> {
        let store = match endpoint.side {
            StoreSide::Local => {
                self.local_builds.fetch_add(1, Ordering::SeqCst);
                self.local.clone()
            }
            StoreSide::Remote => {
                self.remote_builds.fetch_add(1, Ordering::SeqCst);
                self.remote.clone()
            }
        };
        Ok(Arc::new(FakeTransport {
            endpoint: endpoint.clone(),
            store,
        }))
    }
}
