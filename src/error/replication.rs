use thiserror::Error as ThisError;

use super::{ConnError, StoreError};

#[derive(Debug, ThisError)]
pub enum ReplError {
    /// The local store (which drives replication) is not reachable.
    #[error(transparent)]
    Connection(#[from] ConnError),

    #[error("Signed in without device credentials")]
    MissingCredentials,

    /// Failure while preparing the job, before it was submitted.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The replicate command itself failed.
    #[error("Replication of folder {folder_id} failed: {source}")]
    Submission {
        folder_id: String,
        #[source]
        source: StoreError,
    },
}
