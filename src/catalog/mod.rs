//! Folder metadata as seen by the database service.
//!
//! The catalog is owned by an external identity/sync process. The service only
//! reads it; `MemoryCatalog` is the in-process implementation that process (or a
//! test) keeps up to date.

mod memory;

pub use memory::MemoryCatalog;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One logical tenant database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FolderEntry {
    /// Stable identifier, also the storage-name suffix.
    pub id: String,

    #[serde(default)]
    pub owner_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub visibility: String,

    /// Mirrored locally when true; otherwise only reachable on the remote cluster.
    #[serde(default)]
    pub is_replicated: bool,
}

impl FolderEntry {
    pub fn new(id: impl Into<String>, is_replicated: bool) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            owner_id: String::new(),
            description: String::new(),
            visibility: String::new(),
            is_replicated,
        }
    }

    pub fn route(&self) -> FolderRoute {
        FolderRoute::from(self)
    }
}

/// Where reads and writes for a folder go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderRoute {
    Local,
    Remote,
}

impl From<&FolderEntry> for FolderRoute {
    fn from(entry: &FolderEntry) -> Self {
        if entry.is_replicated {
            FolderRoute::Local
        } else {
            FolderRoute::Remote
        }
    }
}

/// Opaque device credentials used to authenticate against the remote cluster.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceCredentials {
    pub device_id: String,
    pub device_key: String,
}

impl DeviceCredentials {
    pub fn new(device_id: impl Into<String>, device_key: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            device_key: device_key.into(),
        }
    }
}

impl std::fmt::Debug for DeviceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCredentials")
            .field("device_id", &self.device_id)
            .field("device_key", &"<redacted>")
            .finish()
    }
}

/// Read-only view of folder metadata and sign-in state.
pub trait FolderCatalog: Send + Sync {
    fn folder(&self, id: &str) -> Option<FolderEntry>;

    fn folder_ids(&self) -> BTreeSet<String>;

    fn is_signed_in(&self) -> bool;

    fn is_offline_mode_enabled(&self) -> bool;

    fn device_credentials(&self) -> Option<DeviceCredentials>;

    /// Folder currently selected by the user, if any.
    fn selected_folder(&self) -> Option<String> {
        None
    }

    /// Entries flagged for local mirroring, in id order.
    fn replicated_folders(&self) -> Vec<FolderEntry> {
        self.folder_ids()
            .iter()
            .filter_map(|id| self.folder(id))
            .filter(|f| f.is_replicated)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_follows_replicated_flag() {
        assert_eq!(FolderEntry::new("a", true).route(), FolderRoute::Local);
        assert_eq!(FolderEntry::new("b", false).route(), FolderRoute::Remote);
    }

    #[test]
    fn debug_output_redacts_device_key() {
        let creds = DeviceCredentials::new("device-1", "secret-key");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("device-1"));
        assert!(!rendered.contains("secret-key"));
    }
}
