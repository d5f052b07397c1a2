//! Document store transport: endpoints, storage naming, and the HTTP client.

mod couch;
mod naming;

#[cfg(test)]
pub(crate) mod fake;

pub use couch::{CouchTransport, CouchTransportFactory};
pub use naming::{STORAGE_PREFIX, folder_id_from_storage, is_system_storage, storage_name};

use crate::catalog::DeviceCredentials;
use crate::config::StoreResolvedConfig;
use crate::error::StoreError;
use foldersync_schema::{DatabaseInfo, DocumentWriteResponse, ReplicateRequest, ReplicationStatus};
use serde_json::Value;
use std::{fmt, sync::Arc, time::Duration};
use url::Url;

/// Which of the two stores a connection or database lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreSide {
    Local,
    Remote,
}

impl fmt::Display for StoreSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreSide::Local => f.write_str("local"),
            StoreSide::Remote => f.write_str("remote"),
        }
    }
}

/// Everything needed to build a transport. Two endpoints compare equal when a
/// transport built for one can serve the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEndpoint {
    pub side: StoreSide,
    pub base_url: Url,
    pub credentials: Option<DeviceCredentials>,
    pub max_connections: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub proxy: Option<Url>,
}

impl StoreEndpoint {
    pub fn from_config(
        side: StoreSide,
        cfg: &StoreResolvedConfig,
        credentials: Option<DeviceCredentials>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            side,
            base_url: cfg.base_url()?,
            credentials,
            max_connections: cfg.max_connections,
            connect_timeout: cfg.connect_timeout,
            request_timeout: cfg.request_timeout,
            proxy: cfg.proxy.clone(),
        })
    }

    /// `base_url` with `segments` appended, each percent-encoded as one path segment.
    pub fn url_for(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StoreError::Unexpected(format!("store base url cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Operations the service needs from a document store instance.
#[async_trait::async_trait]
pub trait StoreTransport: Send + Sync + fmt::Debug {
    fn endpoint(&self) -> &StoreEndpoint;

    /// Names of all databases, system databases included. Doubles as the liveness check.
    async fn list_databases(&self) -> Result<Vec<String>, StoreError>;

    async fn create_database(&self, name: &str) -> Result<(), StoreError>;

    async fn delete_database(&self, name: &str) -> Result<(), StoreError>;

    /// Fails eagerly on authorization problems, unlike a bare handle.
    async fn database_info(&self, name: &str) -> Result<DatabaseInfo, StoreError>;

    /// Runs a one-shot replication driven by this instance.
    async fn replicate(&self, request: &ReplicateRequest) -> Result<ReplicationStatus, StoreError>;

    /// `Ok(None)` when the document does not exist.
    async fn get_document(&self, db: &str, doc_id: &str) -> Result<Option<Value>, StoreError>;

    async fn put_document(
        &self,
        db: &str,
        doc_id: &str,
        body: &Value,
    ) -> Result<DocumentWriteResponse, StoreError>;
}

/// Builds transports; the connection actors are the only callers.
pub trait TransportFactory: Send + Sync {
    fn build(&self, endpoint: &StoreEndpoint) -> Result<Arc<dyn StoreTransport>, StoreError>;
}
