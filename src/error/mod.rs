mod connection;
mod open;
mod replication;
mod store;

pub use connection::ConnError;
pub use open::OpenError;
pub use replication::ReplError;
pub use store::StoreError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
