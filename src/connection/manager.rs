use super::actor::{ConnectionActor, ConnectionMessage};
use crate::catalog::FolderCatalog;
use crate::config::{StoreResolvedConfig, SyncResolvedConfig};
use crate::error::{ConnError, IsRetryable};
use crate::store::{StoreEndpoint, StoreSide, StoreTransport, TransportFactory};
use backon::{ExponentialBuilder, Retryable};
use ractor::{Actor, ActorRef};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

/// Cloneable handle over the local and remote connection actors.
#[derive(Clone)]
pub struct ConnectionManager {
    local: ActorRef<ConnectionMessage>,
    remote: ActorRef<ConnectionMessage>,
    catalog: Arc<dyn FolderCatalog>,
    local_cfg: Arc<StoreResolvedConfig>,
    remote_cfg: Arc<StoreResolvedConfig>,
    retry_policy: ExponentialBuilder,
    retry_max_times: Option<usize>,
}

impl ConnectionManager {
    pub async fn spawn(
        catalog: Arc<dyn FolderCatalog>,
        factory: Arc<dyn TransportFactory>,
        local_cfg: Arc<StoreResolvedConfig>,
        remote_cfg: Arc<StoreResolvedConfig>,
        sync_cfg: &SyncResolvedConfig,
    ) -> Result<Self, ConnError> {
        let (local, _jh) = Actor::spawn(None, ConnectionActor, (StoreSide::Local, factory.clone()))
            .await
            .map_err(|e| ConnError::RactorError(format!("local ConnectionActor spawn failed: {e}")))?;
        let (remote, _jh) = Actor::spawn(None, ConnectionActor, (StoreSide::Remote, factory))
            .await
            .map_err(|e| {
                ConnError::RactorError(format!("remote ConnectionActor spawn failed: {e}"))
            })?;

        let mut retry_policy = ExponentialBuilder::default()
            .with_min_delay(sync_cfg.connect_retry_min_delay)
            .with_max_delay(sync_cfg.connect_retry_max_delay)
            .with_jitter();
        retry_policy = match sync_cfg.connect_retry_max_times {
            Some(times) => retry_policy.with_max_times(times),
            None => retry_policy.without_max_times(),
        };

        info!(
            local = %format!("{}:{}", local_cfg.host, local_cfg.port),
            remote = %format!("{}:{}", remote_cfg.host, remote_cfg.port),
            remote_tls = remote_cfg.tls,
            connect_retry_max_times = ?sync_cfg.connect_retry_max_times,
            "ConnectionManager started"
        );

        Ok(Self {
            local,
            remote,
            catalog,
            local_cfg,
            remote_cfg,
            retry_policy,
            retry_max_times: sync_cfg.connect_retry_max_times,
        })
    }

    fn actor(&self, side: StoreSide) -> &ActorRef<ConnectionMessage> {
        match side {
            StoreSide::Local => &self.local,
            StoreSide::Remote => &self.remote,
        }
    }

    /// The endpoint a side should currently be connected to. For the remote side
    /// this follows the catalog's device credentials.
    pub fn endpoint(&self, side: StoreSide) -> Result<StoreEndpoint, ConnError> {
        let endpoint = match side {
            StoreSide::Local => StoreEndpoint::from_config(side, &self.local_cfg, None),
            StoreSide::Remote => {
                let credentials = self
                    .catalog
                    .device_credentials()
                    .ok_or(ConnError::MissingCredentials { side })?;
                StoreEndpoint::from_config(side, &self.remote_cfg, Some(credentials))
            }
        };
        endpoint.map_err(|e| ConnError::unavailable(side, &e))
    }

    pub async fn connect_local(&self) -> Result<(), ConnError> {
        self.connect(StoreSide::Local).await
    }

    pub async fn connect_remote(&self) -> Result<(), ConnError> {
        self.connect(StoreSide::Remote).await
    }

    /// One connect attempt, checked. A no-op (besides the check) when already
    /// connected to the current endpoint.
    pub async fn connect(&self, side: StoreSide) -> Result<(), ConnError> {
        let endpoint = self.endpoint(side)?;
        ractor::call!(self.actor(side), ConnectionMessage::Connect, endpoint)
            .map_err(|e| ConnError::RactorError(format!("{side} Connect RPC failed: {e}")))?
    }

    pub async fn is_connected(&self, side: StoreSide) -> bool {
        self.transport(side).await.is_some()
    }

    /// Current transport if the side is connected.
    pub async fn transport(&self, side: StoreSide) -> Option<Arc<dyn StoreTransport>> {
        match ractor::call!(self.actor(side), ConnectionMessage::Transport) {
            Ok(transport) => transport,
            Err(e) => {
                warn!(%side, "Transport RPC failed: {e}");
                None
            }
        }
    }

    /// Connects if needed, retrying with capped exponential backoff. Retries
    /// indefinitely unless `sync.connect_retry_max_times` is set.
    pub async fn wait_connected(
        &self,
        side: StoreSide,
    ) -> Result<Arc<dyn StoreTransport>, ConnError> {
        if let Some(transport) = self.transport(side).await {
            return Ok(transport);
        }

        let result = (|| async { self.connect(side).await })
            .retry(self.retry_policy)
            .when(|e: &ConnError| e.is_retryable())
            .notify(|err, dur: Duration| {
                warn!(%side, "Waiting for {side} store: {err}; retrying in {dur:?}");
            })
            .await;

        match result {
            Ok(()) => self.transport(side).await.ok_or(ConnError::Unavailable {
                side,
                reason: "connection dropped right after connecting".to_string(),
            }),
            Err(ConnError::Unavailable { .. }) if self.retry_max_times.is_some() => {
                Err(ConnError::RetriesExhausted {
                    side,
                    attempts: self.retry_max_times.unwrap_or_default() + 1,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Current transport, connecting once if the side is down. No backoff.
    pub async fn ensure_connected(
        &self,
        side: StoreSide,
    ) -> Result<Arc<dyn StoreTransport>, ConnError> {
        if let Some(transport) = self.transport(side).await {
            return Ok(transport);
        }
        self.connect(side).await?;
        self.transport(side).await.ok_or(ConnError::Unavailable {
            side,
            reason: "connection dropped right after connecting".to_string(),
        })
    }

    /// Reports a transport failure seen by a caller. Returns whether the side is
    /// still connected after the re-check.
    pub async fn report_failure(&self, side: StoreSide) -> bool {
        ractor::call!(self.actor(side), ConnectionMessage::ReportFailure).unwrap_or(false)
    }

    pub fn shutdown(&self) {
        self.local.stop(None);
        self.remote.stop(None);
    }
}
