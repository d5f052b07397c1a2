use crate::catalog::FolderCatalog;
use crate::connection::ConnectionManager;
use crate::replication::ReplicationEngine;
use crate::store::{StoreSide, folder_id_from_storage, is_system_storage};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What one housekeeping pass did.
#[derive(Debug, Clone)]
pub struct HousekeepingReport {
    pub started_at: DateTime<Utc>,
    /// Another pass was already running; nothing was done.
    pub skipped: bool,
    /// The pass stopped before looking at any storage (store unreachable).
    pub abandoned: Option<String>,
    /// Storage names deleted because the catalog has no entry for them.
    pub deleted_orphans: Vec<String>,
    /// Folder ids deselected from local sync whose storage was pushed and removed.
    pub removed_deselected: Vec<String>,
    /// Deselected folder ids still present locally (final push not ok or deferred).
    pub pending_removal: Vec<String>,
    /// Storage names whose deletion failed.
    pub failed: Vec<String>,
}

impl HousekeepingReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            skipped: false,
            abandoned: None,
            deleted_orphans: Vec::new(),
            removed_deselected: Vec::new(),
            pending_removal: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Reconciles local storage against the folder catalog.
pub struct Housekeeper {
    catalog: Arc<dyn FolderCatalog>,
    connections: ConnectionManager,
    replication: Arc<ReplicationEngine>,
    running: Mutex<()>,
}

impl Housekeeper {
    pub fn new(
        catalog: Arc<dyn FolderCatalog>,
        connections: ConnectionManager,
        replication: Arc<ReplicationEngine>,
    ) -> Self {
        Self {
            catalog,
            connections,
            replication,
            running: Mutex::new(()),
        }
    }

    /// One maintenance pass. Overlapping calls return immediately with `skipped`.
    pub async fn run_once(&self) -> HousekeepingReport {
        let mut report = HousekeepingReport::new();
        let Ok(_running) = self.running.try_lock() else {
            debug!("Housekeeping already in progress; skipping");
            report.skipped = true;
            return report;
        };

        let local = match self.connections.ensure_connected(StoreSide::Local).await {
            Ok(local) => local,
            Err(e) => {
                warn!("Housekeeping abandoned, local store unavailable: {e}");
                report.abandoned = Some(e.to_string());
                return report;
            }
        };
        let databases = match local.list_databases().await {
            Ok(dbs) => dbs,
            Err(e) => {
                warn!("Housekeeping abandoned, listing local databases failed: {e}");
                report.abandoned = Some(e.to_string());
                return report;
            }
        };

        for storage in databases {
            if is_system_storage(&storage) {
                continue;
            }

            let entry = folder_id_from_storage(&storage).and_then(|id| self.catalog.folder(id));
            match entry {
                None => {
                    info!(%storage, "No metadata for local database (removing)");
                    let deleted = self.replication.delete_orphan(&storage).await;
                    match deleted {
                        Ok(true) => report.deleted_orphans.push(storage),
                        Ok(false) => {}
                        Err(e) => {
                            warn!(%storage, "Deleting orphaned database failed: {e}");
                            report.failed.push(storage);
                        }
                    }
                }
                Some(folder) if !folder.is_replicated => {
                    if self.replication.remove_local_db(&folder.id).await {
                        report.removed_deselected.push(folder.id);
                    } else {
                        report.pending_removal.push(folder.id);
                    }
                }
                Some(_) => {}
            }
        }

        info!(
            deleted_orphans = report.deleted_orphans.len(),
            removed_deselected = report.removed_deselected.len(),
            pending_removal = report.pending_removal.len(),
            failed = report.failed.len(),
            "Housekeeping pass complete"
        );
        report
    }
}
