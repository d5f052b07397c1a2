use super::housekeeper::{Housekeeper, HousekeepingReport};
use crate::catalog::FolderCatalog;
use crate::connection::ConnectionManager;
use crate::error::ReplError;
use crate::replication::{ReplicationDirection, ReplicationEngine};
use crate::store::StoreSide;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Running,
}

/// Per-folder result of a scheduled push + pull.
#[derive(Debug, Clone)]
pub struct FolderSyncReport {
    pub folder_id: String,
    pub push_ok: bool,
    /// `None` when the push failed before reaching the store, so no pull was tried.
    pub pull_ok: Option<bool>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    /// A cycle was already running.
    pub skipped: bool,
    /// The local store could not be reached; nothing else ran.
    pub aborted: Option<String>,
    pub housekeeping: Option<HousekeepingReport>,
    pub folders: Vec<FolderSyncReport>,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            skipped: false,
            aborted: None,
            housekeeping: None,
            folders: Vec::new(),
        }
    }
}

/// Periodic housekeeping plus push/pull of every replicated folder.
pub struct SyncScheduler {
    catalog: Arc<dyn FolderCatalog>,
    connections: ConnectionManager,
    housekeeper: Arc<Housekeeper>,
    replication: Arc<ReplicationEngine>,
    state: Mutex<SyncState>,
}

/// Resets the scheduler to `Idle` when a cycle ends, however it ends.
struct RunningGuard<'a>(&'a Mutex<SyncState>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = SyncState::Idle;
    }
}

impl SyncScheduler {
    pub fn new(
        catalog: Arc<dyn FolderCatalog>,
        connections: ConnectionManager,
        housekeeper: Arc<Housekeeper>,
        replication: Arc<ReplicationEngine>,
    ) -> Self {
        Self {
            catalog,
            connections,
            housekeeper,
            replication,
            state: Mutex::new(SyncState::Idle),
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_begin(&self) -> Option<RunningGuard<'_>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            SyncState::Running => None,
            SyncState::Idle => {
                *state = SyncState::Running;
                Some(RunningGuard(&self.state))
            }
        }
    }

    /// One sync cycle. Never fails; problems are logged and reported.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::new();
        let Some(_running) = self.try_begin() else {
            debug!("Sync cycle already running; skipping");
            report.skipped = true;
            return report;
        };

        if let Err(e) = self.connections.ensure_connected(StoreSide::Local).await {
            warn!("Sync cycle aborted, error automatically connecting to local store: {e}");
            report.aborted = Some(e.to_string());
            return report;
        }

        report.housekeeping = Some(self.housekeeper.run_once().await);

        for folder in self.catalog.replicated_folders() {
            info!(folder_id = %folder.id, name = %folder.name, "Beginning scheduled replication");
            report.folders.push(self.sync_folder(&folder.id).await);
        }

        report
    }

    /// Push strictly before pull, so local changes leave before remote ones arrive.
    /// A push the store rejected still pulls; a push that never got submitted does not.
    async fn sync_folder(&self, folder_id: &str) -> FolderSyncReport {
        let mut folder_report = FolderSyncReport {
            folder_id: folder_id.to_string(),
            push_ok: false,
            pull_ok: None,
            error: None,
        };

        match self
            .replication
            .replicate(folder_id, ReplicationDirection::Push)
            .await
        {
            Ok(outcome) => folder_report.push_ok = outcome.is_ok(),
            // The job reached the store and failed there; remote changes can still arrive.
            Err(e @ ReplError::Submission { .. }) => {
                warn!(folder_id, "Problem replicating: {e}");
                folder_report.error = Some(e.to_string());
            }
            Err(e) => {
                warn!(folder_id, "Problem replicating, skipping pull: {e}");
                folder_report.error = Some(e.to_string());
                return folder_report;
            }
        }

        match self
            .replication
            .replicate(folder_id, ReplicationDirection::Pull)
            .await
        {
            Ok(outcome) => folder_report.pull_ok = Some(outcome.is_ok()),
            Err(e) => {
                warn!(folder_id, "Problem replicating: {e}");
                folder_report.pull_ok = Some(false);
                folder_report.error.get_or_insert_with(|| e.to_string());
            }
        }
        folder_report
    }

    /// Spawns the background loop: a cycle right away, then one per `interval`
    /// until shut down. `sync_now` on the handle cuts the wait short.
    pub fn start(self: Arc<Self>, interval: Duration) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let trigger = Arc::new(Notify::new());
        let wake = trigger.clone();

        let join = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Sync scheduler started");
            loop {
                let report = self.run_cycle().await;
                log_cycle(&report);

                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    () = wake.notified() => debug!("Sync cycle requested"),
                    () = tokio::time::sleep(interval) => {}
                }
            }
            info!("Sync scheduler stopped");
        });

        SchedulerHandle {
            shutdown_tx,
            trigger,
            join,
        }
    }
}

fn log_cycle(report: &CycleReport) {
    if report.skipped || report.aborted.is_some() {
        return;
    }
    let failed = report
        .folders
        .iter()
        .filter(|f| f.error.is_some() || !f.push_ok || f.pull_ok != Some(true))
        .count();
    info!(
        folders = report.folders.len(),
        failed,
        elapsed_ms = (Utc::now() - report.started_at).num_milliseconds(),
        "Sync cycle complete"
    );
}

/// Owner of the background sync loop. Dropping it also stops the loop.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    trigger: Arc<Notify>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Runs a cycle as soon as the current wait (or cycle) ends.
    pub fn sync_now(&self) {
        self.trigger.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stops the loop for good and waits for an in-flight cycle to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join.await {
            warn!("Sync scheduler task ended abnormally: {e}");
        }
    }
}
