use thiserror::Error as ThisError;

/// Why a folder database could not be opened.
#[derive(Debug, ThisError)]
pub enum OpenError {
    /// The folder id is unknown to the catalog.
    #[error("No metadata for folder {0}")]
    MetadataUnavailable(String),

    /// Remote-only folder requested while signed out.
    #[error("Folder {0} is remote-only and cannot be reached while offline")]
    UnavailableWhileOffline(String),

    /// Storage missing, or the transport failed after connecting.
    #[error("Database for folder {id} unavailable: {reason}")]
    DbUnavailable { id: String, reason: String },
}

impl OpenError {
    pub(crate) fn db_unavailable(id: &str, reason: impl ToString) -> Self {
        OpenError::DbUnavailable {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}
