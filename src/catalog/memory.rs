use super::{DeviceCredentials, FolderCatalog, FolderEntry};
use crate::config::CatalogConfig;
use ahash::AHashMap;
use std::collections::BTreeSet;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct CatalogState {
    folders: AHashMap<String, FolderEntry>,
    signed_in: bool,
    offline_mode: bool,
    credentials: Option<DeviceCredentials>,
    selected: Option<String>,
}

/// In-memory catalog, updated by whoever owns folder metadata.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &CatalogConfig) -> Self {
        let catalog = Self::new();
        catalog.replace_folders(cfg.folders.iter().cloned());
        catalog.set_signed_in(cfg.signed_in);
        catalog.set_offline_mode(cfg.offline_mode);
        if let (Some(id), Some(key)) = (cfg.device_id.as_ref(), cfg.device_key.as_ref()) {
            catalog.set_device_credentials(Some(DeviceCredentials::new(id, key)));
        }
        catalog.select_folder(cfg.selected_folder.clone());
        catalog
    }

    pub fn upsert_folder(&self, entry: FolderEntry) {
        self.write().folders.insert(entry.id.clone(), entry);
    }

    pub fn remove_folder(&self, id: &str) -> Option<FolderEntry> {
        self.write().folders.remove(id)
    }

    /// Swaps the whole folder list, as after a catalog refresh.
    pub fn replace_folders(&self, entries: impl IntoIterator<Item = FolderEntry>) {
        let folders = entries.into_iter().map(|e| (e.id.clone(), e)).collect();
        self.write().folders = folders;
    }

    /// Flips the replicated flag of a known folder. Returns false for unknown ids.
    pub fn set_replicated(&self, id: &str, replicated: bool) -> bool {
        match self.write().folders.get_mut(id) {
            Some(entry) => {
                entry.is_replicated = replicated;
                true
            }
            None => false,
        }
    }

    pub fn set_signed_in(&self, signed_in: bool) {
        self.write().signed_in = signed_in;
    }

    pub fn set_offline_mode(&self, enabled: bool) {
        self.write().offline_mode = enabled;
    }

    pub fn set_device_credentials(&self, credentials: Option<DeviceCredentials>) {
        self.write().credentials = credentials;
    }

    pub fn select_folder(&self, id: Option<String>) {
        self.write().selected = id;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CatalogState> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CatalogState> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl FolderCatalog for MemoryCatalog {
    fn folder(&self, id: &str) -> Option<FolderEntry> {
        self.read().folders.get(id).cloned()
    }

    fn folder_ids(&self) -> BTreeSet<String> {
        self.read().folders.keys().cloned().collect()
    }

    fn is_signed_in(&self) -> bool {
        self.read().signed_in
    }

    fn is_offline_mode_enabled(&self) -> bool {
        self.read().offline_mode
    }

    fn device_credentials(&self) -> Option<DeviceCredentials> {
        self.read().credentials.clone()
    }

    fn selected_folder(&self) -> Option<String> {
        self.read().selected.clone()
    }
}
