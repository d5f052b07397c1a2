pub mod database;
pub mod error;
pub mod replication;

pub use database::{DatabaseInfo, DocumentWriteResponse};
pub use error::StoreErrorBody;
pub use replication::{ReplicateRequest, ReplicationHistory, ReplicationStatus};
