use super::{StoreEndpoint, StoreTransport, TransportFactory};
use crate::error::{IsRetryable, StoreError};
use backon::{ExponentialBuilder, Retryable};
use foldersync_schema::{
    DatabaseInfo, DocumentWriteResponse, ReplicateRequest, ReplicationStatus, StoreErrorBody,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::debug;

/// Characters of an error body kept in logs.
const BODY_PREVIEW_CHARS: usize = 300;

/// Only reads are retried; writes and replication surface the first failure.
static READ_RETRY_POLICY: LazyLock<ExponentialBuilder> = LazyLock::new(|| {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_millis(300))
        .with_max_times(2)
        .with_jitter()
});

/// HTTP transport for one store instance.
#[derive(Debug)]
pub struct CouchTransport {
    endpoint: StoreEndpoint,
    client: reqwest::Client,
}

impl CouchTransport {
    pub fn new(endpoint: StoreEndpoint) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("foldersync/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(endpoint.connect_timeout)
            .timeout(endpoint.request_timeout)
            .pool_max_idle_per_host(endpoint.max_connections);

        if let Some(proxy_url) = endpoint.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        let client = builder.build()?;
        Ok(Self { endpoint, client })
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, StoreError> {
        let url = self.endpoint.url_for(segments)?;
        let mut request = self.client.request(method, url);
        if let Some(creds) = self.endpoint.credentials.as_ref() {
            request = request.basic_auth(&creds.device_id, Some(&creds.device_key));
        }
        Ok(request)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let resp = request.send().await?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        Err(status_error(resp).await)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let resp = self.send(request).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json_with_retry<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<T, StoreError> {
        (|| async { self.send_json(self.request(Method::GET, segments)?).await })
            .retry(*READ_RETRY_POLICY)
            .when(|e: &StoreError| e.is_retryable())
            .notify(|err, dur: Duration| {
                debug!(
                    side = %self.endpoint.side,
                    path = ?segments,
                    "Store read failed ({err}), retrying in {dur:?}"
                );
            })
            .await
    }
}

async fn status_error(resp: reqwest::Response) -> StoreError {
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap_or_default();
    let body = serde_json::from_slice::<StoreErrorBody>(&bytes).ok();

    if body.is_none() {
        let raw_body = String::from_utf8_lossy(&bytes);
        debug!(
            %status,
            body = %format!("{:.len$}", raw_body, len = BODY_PREVIEW_CHARS),
            "Store returned unstructured error"
        );
    }

    StoreError::UpstreamStatus { status, body }
}

#[async_trait::async_trait]
impl StoreTransport for CouchTransport {
    fn endpoint(&self) -> &StoreEndpoint {
        &self.endpoint
    }

    async fn list_databases(&self) -> Result<Vec<String>, StoreError> {
        self.get_json_with_retry(&["_all_dbs"]).await
    }

    async fn create_database(&self, name: &str) -> Result<(), StoreError> {
        self.send(self.request(Method::PUT, &[name])?).await?;
        Ok(())
    }

    async fn delete_database(&self, name: &str) -> Result<(), StoreError> {
        self.send(self.request(Method::DELETE, &[name])?).await?;
        Ok(())
    }

    async fn database_info(&self, name: &str) -> Result<DatabaseInfo, StoreError> {
        self.get_json_with_retry(&[name]).await
    }

    async fn replicate(&self, request: &ReplicateRequest) -> Result<ReplicationStatus, StoreError> {
        self.send_json(self.request(Method::POST, &["_replicate"])?.json(request))
            .await
    }

    async fn get_document(&self, db: &str, doc_id: &str) -> Result<Option<Value>, StoreError> {
        match self.get_json_with_retry(&[db, doc_id]).await {
            Ok(doc) => Ok(Some(doc)),
            Err(StoreError::UpstreamStatus {
                status: StatusCode::NOT_FOUND,
                body,
            }) if body.as_ref().is_none_or(|b| b.reason != "Database does not exist.") => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn put_document(
        &self,
        db: &str,
        doc_id: &str,
        body: &Value,
    ) -> Result<DocumentWriteResponse, StoreError> {
        self.send_json(self.request(Method::PUT, &[db, doc_id])?.json(body))
            .await
    }
}

/// Production factory: one pooled reqwest client per endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct CouchTransportFactory;

impl TransportFactory for CouchTransportFactory {
    fn build(&self, endpoint: &StoreEndpoint) -> Result<Arc<dyn StoreTransport>, StoreError> {
        Ok(Arc::new(CouchTransport::new(endpoint.clone())?))
    }
}
