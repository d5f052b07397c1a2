/// Prefix mapping folder ids onto storage names.
pub const STORAGE_PREFIX: &str = "db_";

pub fn storage_name(folder_id: &str) -> String {
    format!("{STORAGE_PREFIX}{folder_id}")
}

/// Reverse of [`storage_name`]; `None` for names without the folder prefix.
pub fn folder_id_from_storage(name: &str) -> Option<&str> {
    name.strip_prefix(STORAGE_PREFIX)
        .filter(|id| !id.is_empty())
}

/// Reserved names (`_users`, `_replicator`, ...).
pub fn is_system_storage(name: &str) -> bool {
    name.starts_with('_')
}
