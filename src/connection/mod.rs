//! Process-wide local and remote store connections.
//!
//! Each side is owned by its own actor; the actor mailbox serializes connect
//! attempts so at most one is in flight per side. The `connected` flags live in
//! actor state and change only in response to connect or failure reports.

mod actor;
mod manager;

pub use manager::ConnectionManager;
