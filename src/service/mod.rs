//! The database service: one owned bundle of connections, opener, replication,
//! housekeeping and the background scheduler.

mod housekeeper;
mod opener;
mod scheduler;


pub use housekeeper::{Housekeeper, HousekeepingReport};
pub use opener::{DatabaseOpener, OpenDatabaseHandle};
pub use scheduler::{CycleReport, FolderSyncReport, SchedulerHandle, SyncScheduler, SyncState};

use crate::catalog::FolderCatalog;
use crate::config::{Config, StoreResolvedConfig, SyncResolvedConfig};
use crate::connection::ConnectionManager;
use crate::error::{ConnError, OpenError, ReplError};
use crate::replication::{
    DnsPeerResolver, PeerResolver, ReplicationDirection, ReplicationEngine, ReplicationOutcome,
};
use crate::store::{CouchTransportFactory, TransportFactory};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct DatabaseService {
    connections: ConnectionManager,
    opener: Arc<DatabaseOpener>,
    replication: Arc<ReplicationEngine>,
    housekeeper: Arc<Housekeeper>,
    scheduler: Arc<SyncScheduler>,
    sync_cfg: Arc<SyncResolvedConfig>,
}

impl DatabaseService {
    pub async fn spawn(
        catalog: Arc<dyn FolderCatalog>,
        factory: Arc<dyn TransportFactory>,
        resolver: Arc<dyn PeerResolver>,
        local_cfg: Arc<StoreResolvedConfig>,
        remote_cfg: Arc<StoreResolvedConfig>,
        sync_cfg: Arc<SyncResolvedConfig>,
    ) -> Result<Self, ConnError> {
        let connections = ConnectionManager::spawn(
            catalog.clone(),
            factory,
            local_cfg.clone(),
            remote_cfg.clone(),
            &sync_cfg,
        )
        .await?;

        let opener = Arc::new(DatabaseOpener::new(catalog.clone(), connections.clone()));
        let replication = Arc::new(ReplicationEngine::new(
            catalog.clone(),
            connections.clone(),
            resolver,
            local_cfg,
            remote_cfg,
        ));
        let housekeeper = Arc::new(Housekeeper::new(
            catalog.clone(),
            connections.clone(),
            replication.clone(),
        ));
        let scheduler = Arc::new(SyncScheduler::new(
            catalog,
            connections.clone(),
            housekeeper.clone(),
            replication.clone(),
        ));

        Ok(Self {
            connections,
            opener,
            replication,
            housekeeper,
            scheduler,
            sync_cfg,
        })
    }

    /// Production wiring: HTTP transports and system DNS.
    pub async fn from_config(
        catalog: Arc<dyn FolderCatalog>,
        cfg: &Config,
    ) -> Result<Self, ConnError> {
        let local_cfg = Arc::new(cfg.local_store());
        let remote_cfg = Arc::new(cfg.remote_store());
        let sync_cfg = Arc::new(cfg.sync());

        info!(
            local = %format!("{}:{}", local_cfg.host, local_cfg.port),
            remote = %format!("{}:{}", remote_cfg.host, remote_cfg.port),
            proxy = %remote_cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
            interval_secs = sync_cfg.interval.as_secs(),
            "Database service config (effective)"
        );

        Self::spawn(
            catalog,
            Arc::new(CouchTransportFactory),
            Arc::new(DnsPeerResolver),
            local_cfg,
            remote_cfg,
            sync_cfg,
        )
        .await
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub async fn open(&self, folder_id: &str) -> Result<OpenDatabaseHandle, OpenError> {
        self.opener.open(folder_id).await
    }

    pub async fn open_current(&self) -> Result<OpenDatabaseHandle, OpenError> {
        self.opener.open_current().await
    }

    pub async fn is_db_local(&self, folder_id: &str) -> bool {
        self.opener.is_db_local(folder_id).await
    }

    pub async fn replicate(
        &self,
        folder_id: &str,
        direction: ReplicationDirection,
    ) -> Result<ReplicationOutcome, ReplError> {
        self.replication.replicate(folder_id, direction).await
    }

    pub async fn init_local_db(&self, folder_id: &str) -> bool {
        self.replication.init_local_db(folder_id).await
    }

    pub async fn remove_local_db(&self, folder_id: &str) -> bool {
        self.replication.remove_local_db(folder_id).await
    }

    pub async fn run_housekeeping(&self) -> HousekeepingReport {
        self.housekeeper.run_once().await
    }

    pub async fn run_sync_cycle(&self) -> CycleReport {
        self.scheduler.run_cycle().await
    }

    pub fn sync_state(&self) -> SyncState {
        self.scheduler.state()
    }

    /// Starts the background loop at the configured interval.
    pub fn start_scheduler(&self) -> SchedulerHandle {
        self.scheduler.clone().start(self.sync_cfg.interval)
    }

    /// Stops the connection actors. Stop the scheduler first.
    pub fn shutdown(&self) {
        self.connections.shutdown();
    }
}
