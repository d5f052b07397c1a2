use thiserror::Error as ThisError;

use super::{IsRetryable, StoreError};
use crate::store::StoreSide;

/// A side could not be connected. Always recoverable by retrying later.
#[derive(Debug, ThisError)]
pub enum ConnError {
    /// Building the transport or the liveness check failed.
    #[error("{side} store unavailable: {reason}")]
    Unavailable { side: StoreSide, reason: String },

    /// Remote side requested without device credentials.
    #[error("{side} store requires device credentials")]
    MissingCredentials { side: StoreSide },

    /// Waited for a connection and gave up after the configured retry budget.
    #[error("{side} store still unavailable after {attempts} attempts")]
    RetriesExhausted { side: StoreSide, attempts: usize },

    #[error("Ractor error: {0}")]
    RactorError(String),
}

impl ConnError {
    pub(crate) fn unavailable(side: StoreSide, err: &StoreError) -> Self {
        ConnError::Unavailable {
            side,
            reason: err.to_string(),
        }
    }
}

impl IsRetryable for ConnError {
    fn is_retryable(&self) -> bool {
        matches!(self, ConnError::Unavailable { .. })
    }
}
