use super::peer::pick_peer;
use super::{AbstainReason, PeerResolver, ReplicationDirection, ReplicationJob, ReplicationOutcome};
use crate::catalog::{DeviceCredentials, FolderCatalog};
use crate::config::StoreResolvedConfig;
use crate::connection::ConnectionManager;
use crate::error::{ReplError, StoreError};
use crate::store::{StoreSide, folder_id_from_storage, storage_name};
use crate::utils::logging::with_pretty_json_debug;
use foldersync_schema::ReplicateRequest;
use std::{net::IpAddr, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

/// Runs replication jobs through the local store instance.
///
/// Jobs are serialized process-wide: the create, replicate, maybe-delete sequence
/// must not interleave with another job for the same folder.
pub struct ReplicationEngine {
    catalog: Arc<dyn FolderCatalog>,
    connections: ConnectionManager,
    resolver: Arc<dyn PeerResolver>,
    local_cfg: Arc<StoreResolvedConfig>,
    remote_cfg: Arc<StoreResolvedConfig>,
    gate: Mutex<()>,
}

impl ReplicationEngine {
    pub fn new(
        catalog: Arc<dyn FolderCatalog>,
        connections: ConnectionManager,
        resolver: Arc<dyn PeerResolver>,
        local_cfg: Arc<StoreResolvedConfig>,
        remote_cfg: Arc<StoreResolvedConfig>,
    ) -> Self {
        Self {
            catalog,
            connections,
            resolver,
            local_cfg,
            remote_cfg,
            gate: Mutex::new(()),
        }
    }

    fn abstain_reason(&self) -> Option<AbstainReason> {
        if self.catalog.is_offline_mode_enabled() {
            Some(AbstainReason::OfflineMode)
        } else if !self.catalog.is_signed_in() {
            Some(AbstainReason::SignedOut)
        } else {
            None
        }
    }

    pub async fn replicate(
        &self,
        folder_id: &str,
        direction: ReplicationDirection,
    ) -> Result<ReplicationOutcome, ReplError> {
        if let Some(reason) = self.abstain_reason() {
            debug!(folder_id, %direction, "Skipping replication ({reason})");
            return Ok(ReplicationOutcome::Abstained(reason));
        }

        let _gate = self.gate.lock().await;
        self.replicate_locked(folder_id, direction).await
    }

    /// Pulls a newly selected folder into local storage. True on success.
    pub async fn init_local_db(&self, folder_id: &str) -> bool {
        match self.replicate(folder_id, ReplicationDirection::Pull).await {
            Ok(outcome) => outcome.is_ok(),
            Err(e) => {
                error!(folder_id, "Initial pull failed: {e}");
                false
            }
        }
    }

    /// Pushes pending local changes, then deletes local storage only if that
    /// push reported ok. True when the storage was removed.
    pub async fn remove_local_db(&self, folder_id: &str) -> bool {
        if let Some(reason) = self.abstain_reason() {
            debug!(folder_id, "Deferring local removal ({reason})");
            return false;
        }

        let _gate = self.gate.lock().await;
        let outcome = match self
            .replicate_locked(folder_id, ReplicationDirection::Push)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(folder_id, "Final push failed: {e}");
                return false;
            }
        };

        if !outcome.is_ok() {
            warn!(folder_id, "Final push not ok; keeping local storage");
            return false;
        }

        info!(folder_id, "Final push successful, removing local storage");
        let storage = storage_name(folder_id);
        let deleted = match self.connections.ensure_connected(StoreSide::Local).await {
            Ok(local) => local.delete_database(&storage).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match deleted {
            Ok(()) => true,
            Err(e) => {
                error!(folder_id, %storage, "Removing local storage failed: {e}");
                false
            }
        }
    }

    /// Deletes local storage that has no catalog entry. Waits for any running job
    /// and re-checks the catalog under the gate; `Ok(false)` when the storage
    /// gained an entry in the meantime.
    pub async fn delete_orphan(&self, storage: &str) -> Result<bool, ReplError> {
        let _gate = self.gate.lock().await;
        if folder_id_from_storage(storage).is_some_and(|id| self.catalog.folder(id).is_some()) {
            debug!(%storage, "Storage gained catalog metadata; keeping");
            return Ok(false);
        }
        let local = self.connections.ensure_connected(StoreSide::Local).await?;
        local.delete_database(storage).await?;
        Ok(true)
    }

    async fn replicate_locked(
        &self,
        folder_id: &str,
        direction: ReplicationDirection,
    ) -> Result<ReplicationOutcome, ReplError> {
        let peer = pick_peer(
            self.resolver.as_ref(),
            &self.remote_cfg.host,
            self.remote_cfg.port,
        )
        .await;
        let credentials = self
            .catalog
            .device_credentials()
            .ok_or(ReplError::MissingCredentials)?;

        let storage = storage_name(folder_id);
        let local_url = self.local_url(&storage)?;
        let remote_url = self.remote_url(&storage, peer, &credentials)?;

        let local = self.connections.ensure_connected(StoreSide::Local).await?;
        let created = if local.list_databases().await?.contains(&storage) {
            false
        } else {
            info!(folder_id, %storage, "Creating local storage for replication");
            local.create_database(&storage).await?;
            true
        };

        let (source, target) = match direction {
            ReplicationDirection::Push => (local_url, remote_url),
            ReplicationDirection::Pull => (remote_url, local_url),
        };
        let job = ReplicationJob {
            folder_id: folder_id.to_string(),
            direction,
            source,
            target,
        };

        info!(
            folder_id,
            %direction,
            peer = %peer.map_or_else(|| self.remote_cfg.host.clone(), |ip| ip.to_string()),
            "Submitting replication"
        );

        let request = ReplicateRequest::one_shot(job.source.as_str(), job.target.as_str());
        match local.replicate(&request).await {
            Ok(status) => {
                with_pretty_json_debug(&status, |pretty| {
                    debug!(folder_id, %direction, status = %pretty, "Replication finished");
                });
                if !status.is_ok() {
                    warn!(folder_id, %direction, "Replication reported not ok");
                }
                Ok(ReplicationOutcome::Completed { job, status })
            }
            Err(source) => {
                if created {
                    // Do not leave an empty orphan behind a failed first pull.
                    if let Err(e) = local.delete_database(&storage).await {
                        warn!(folder_id, %storage, "Cleanup of new local storage failed: {e}");
                    }
                }
                error!(folder_id, %direction, "Replication submission failed: {source}");
                Err(ReplError::Submission {
                    folder_id: folder_id.to_string(),
                    source,
                })
            }
        }
    }

    fn local_url(&self, storage: &str) -> Result<Url, StoreError> {
        let mut url = self.local_cfg.base_url()?;
        push_segment(&mut url, storage)?;
        Ok(url)
    }

    /// Remote storage URL with credentials embedded. Addresses the resolved peer
    /// directly; without one it falls back to the configured hostname.
    fn remote_url(
        &self,
        storage: &str,
        peer: Option<IpAddr>,
        credentials: &DeviceCredentials,
    ) -> Result<Url, StoreError> {
        let mut url = self.remote_cfg.base_url()?;
        let host = self.remote_cfg.host.as_str();
        let invalid = |what: &str| StoreError::Unexpected(format!("cannot set {what} on {host}"));
        if let Some(ip) = peer {
            url.set_ip_host(ip).map_err(|()| invalid("peer address"))?;
        }
        url.set_username(&credentials.device_id)
            .map_err(|()| invalid("username"))?;
        url.set_password(Some(&credentials.device_key))
            .map_err(|()| invalid("password"))?;
        push_segment(&mut url, storage)?;
        Ok(url)
    }
}

fn push_segment(url: &mut Url, segment: &str) -> Result<(), StoreError> {
    url.path_segments_mut()
        .map_err(|()| StoreError::Unexpected("store url cannot be a base".to_string()))?
        .pop_if_empty()
        .push(segment);
    Ok(())
}
