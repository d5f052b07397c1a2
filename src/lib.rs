pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod replication;
pub mod service;
pub mod store;
pub(crate) mod utils;

pub use catalog::{DeviceCredentials, FolderCatalog, FolderEntry, MemoryCatalog};
pub use error::{ConnError, OpenError, ReplError, StoreError};
pub use replication::{ReplicationDirection, ReplicationOutcome};
pub use service::{DatabaseService, OpenDatabaseHandle, SchedulerHandle};
pub use store::StoreSide;
