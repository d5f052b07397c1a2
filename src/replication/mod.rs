//! Push/pull replication between a local folder database and its remote copy.

mod engine;
mod peer;

pub use engine::ReplicationEngine;
pub use peer::{DnsPeerResolver, PeerResolver};

use foldersync_schema::ReplicationStatus;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationDirection {
    /// Local changes to the remote cluster.
    Push,
    /// Remote changes into the local store.
    Pull,
}

impl fmt::Display for ReplicationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicationDirection::Push => f.write_str("push"),
            ReplicationDirection::Pull => f.write_str("pull"),
        }
    }
}

/// Why a replication was skipped without touching the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbstainReason {
    OfflineMode,
    SignedOut,
}

impl fmt::Display for AbstainReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstainReason::OfflineMode => f.write_str("offline mode is enabled"),
            AbstainReason::SignedOut => f.write_str("not signed in"),
        }
    }
}

/// One submitted replication. The remote URL carries credentials, so the
/// `Debug` output redacts them.
#[derive(Clone)]
pub struct ReplicationJob {
    pub folder_id: String,
    pub direction: ReplicationDirection,
    pub source: Url,
    pub target: Url,
}

impl ReplicationJob {
    fn redacted(url: &Url) -> String {
        let mut shown = url.clone();
        if shown.password().is_some() {
            let _ = shown.set_password(Some("***"));
        }
        shown.to_string()
    }
}

impl fmt::Debug for ReplicationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicationJob")
            .field("folder_id", &self.folder_id)
            .field("direction", &self.direction)
            .field("source", &Self::redacted(&self.source))
            .field("target", &Self::redacted(&self.target))
            .finish()
    }
}

/// Result of a replication request that did not error.
#[derive(Debug, Clone)]
pub enum ReplicationOutcome {
    /// Nothing was attempted (steady state, not a failure).
    Abstained(AbstainReason),
    /// The store ran the job; `status.ok` says whether it succeeded.
    Completed {
        job: ReplicationJob,
        status: ReplicationStatus,
    },
}

impl ReplicationOutcome {
    pub fn is_ok(&self) -> bool {
        match self {
            ReplicationOutcome::Abstained(_) => false,
            ReplicationOutcome::Completed { status, .. } => status.is_ok(),
        }
    }

    pub fn status(&self) -> Option<&ReplicationStatus> {
        match self {
            ReplicationOutcome::Abstained(_) => None,
            ReplicationOutcome::Completed { status, .. } => Some(status),
        }
    }
}
