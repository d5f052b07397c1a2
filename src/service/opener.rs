use crate::catalog::{FolderCatalog, FolderRoute};
use crate::connection::ConnectionManager;
use crate::error::{IsRetryable, OpenError, StoreError};
use crate::store::{StoreSide, StoreTransport, storage_name};
use foldersync_schema::{DatabaseInfo, DocumentWriteResponse};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A verified per-folder database on one side.
#[derive(Debug, Clone)]
pub struct OpenDatabaseHandle {
    folder_id: String,
    side: StoreSide,
    storage: String,
    transport: Arc<dyn StoreTransport>,
}

impl OpenDatabaseHandle {
    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    pub fn side(&self) -> StoreSide {
        self.side
    }

    pub fn storage_name(&self) -> &str {
        &self.storage
    }

    pub async fn info(&self) -> Result<DatabaseInfo, StoreError> {
        self.transport.database_info(&self.storage).await
    }

    pub async fn get_document(&self, doc_id: &str) -> Result<Option<Value>, StoreError> {
        self.transport.get_document(&self.storage, doc_id).await
    }

    pub async fn put_document(
        &self,
        doc_id: &str,
        body: &Value,
    ) -> Result<DocumentWriteResponse, StoreError> {
        self.transport.put_document(&self.storage, doc_id, body).await
    }
}

#[derive(Default)]
struct OpenHandles {
    local: Option<OpenDatabaseHandle>,
    remote: Option<OpenDatabaseHandle>,
}

impl OpenHandles {
    fn slot(&mut self, side: StoreSide) -> &mut Option<OpenDatabaseHandle> {
        match side {
            StoreSide::Local => &mut self.local,
            StoreSide::Remote => &mut self.remote,
        }
    }
}

/// Resolves folder ids to open database handles on the right side.
pub struct DatabaseOpener {
    catalog: Arc<dyn FolderCatalog>,
    connections: ConnectionManager,
    current: Mutex<OpenHandles>,
}

impl DatabaseOpener {
    pub fn new(catalog: Arc<dyn FolderCatalog>, connections: ConnectionManager) -> Self {
        Self {
            catalog,
            connections,
            current: Mutex::new(OpenHandles::default()),
        }
    }

    pub async fn open(&self, folder_id: &str) -> Result<OpenDatabaseHandle, OpenError> {
        let Some(folder) = self.catalog.folder(folder_id) else {
            warn!(folder_id, "Metadata missing for folder");
            return Err(OpenError::MetadataUnavailable(folder_id.to_string()));
        };

        let side = match folder.route() {
            FolderRoute::Local => StoreSide::Local,
            FolderRoute::Remote if !self.catalog.is_signed_in() => {
                return Err(OpenError::UnavailableWhileOffline(folder_id.to_string()));
            }
            FolderRoute::Remote => StoreSide::Remote,
        };
        let storage = storage_name(folder_id);

        let transport = match self.connections.transport(side).await {
            Some(transport) => transport,
            None => self
                .connections
                .wait_connected(side)
                .await
                .map_err(|e| OpenError::db_unavailable(folder_id, e))?,
        };

        let mut current = self.current.lock().await;
        let slot = current.slot(side);
        let cached = slot
            .as_ref()
            .filter(|h| h.storage == storage && h.transport.endpoint() == transport.endpoint())
            .cloned();

        self.verify(folder_id, side, &storage, transport.as_ref())
            .await?;

        if let Some(handle) = cached {
            debug!(folder_id, %side, "Database already open");
            return Ok(handle);
        }

        debug!(folder_id, %side, %storage, "Opening database");
        let handle = OpenDatabaseHandle {
            folder_id: folder_id.to_string(),
            side,
            storage,
            transport,
        };
        *slot = Some(handle.clone());
        Ok(handle)
    }

    /// Opens the folder the user currently has selected.
    pub async fn open_current(&self) -> Result<OpenDatabaseHandle, OpenError> {
        let Some(folder_id) = self.catalog.selected_folder() else {
            return Err(OpenError::MetadataUnavailable(String::new()));
        };
        self.open(&folder_id).await
    }

    /// Whether the folder has storage on the local side. Errors count as "no".
    pub async fn is_db_local(&self, folder_id: &str) -> bool {
        let storage = storage_name(folder_id);
        let local = match self.connections.ensure_connected(StoreSide::Local).await {
            Ok(local) => local,
            Err(e) => {
                warn!(folder_id, "Local store unavailable: {e}");
                return false;
            }
        };
        match local.list_databases().await {
            Ok(dbs) => dbs.contains(&storage),
            Err(e) => {
                warn!(folder_id, "Listing local databases failed: {e}");
                false
            }
        }
    }

    /// Storage can vanish underneath an open handle (housekeeping), so this runs
    /// on every open. Local storage is never created here.
    async fn verify(
        &self,
        folder_id: &str,
        side: StoreSide,
        storage: &str,
        transport: &dyn StoreTransport,
    ) -> Result<(), OpenError> {
        let result = match side {
            StoreSide::Local => match transport.list_databases().await {
                Ok(dbs) if dbs.iter().any(|db| db == storage) => Ok(()),
                Ok(_) => {
                    warn!(folder_id, %storage, "Local database does not exist; failing open");
                    return Err(OpenError::db_unavailable(
                        folder_id,
                        "database does not exist locally",
                    ));
                }
                Err(e) => Err(e),
            },
            StoreSide::Remote => transport.database_info(storage).await.map(|_| ()),
        };

        result.map_err(|e| {
            warn!(folder_id, %side, error = %e, "Opening database failed");
            if e.is_retryable() {
                let connections = self.connections.clone();
                tokio::spawn(async move {
                    connections.report_failure(side).await;
                });
            }
            OpenError::db_unavailable(folder_id, e)
        })
    }
}
