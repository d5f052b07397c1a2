use foldersync_schema::StoreErrorBody;
use reqwest::StatusCode;
use thiserror::Error as ThisError;

use super::IsRetryable;

/// Transport-level failures talking to a document store.
#[derive(Debug, ThisError)]
pub enum StoreError {
    /// Non-success status; `body` is the decoded store error envelope when present.
    #[error("Store returned {status}: {}", body.as_ref().map_or("<no body>", |b| b.reason.as_str()))]
    UpstreamStatus {
        status: StatusCode,
        body: Option<StoreErrorBody>,
    },

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl StoreError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            StoreError::UpstreamStatus { status, .. } => Some(*status),
            StoreError::Reqwest(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

impl IsRetryable for StoreError {
    fn is_retryable(&self) -> bool {
        match self {
            StoreError::Reqwest(e) => {
                e.is_connect() || e.is_timeout() || e.status().is_some_and(|s| s.is_server_error())
            }
            StoreError::UpstreamStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}
