use crate::catalog::FolderEntry;
use serde::{Deserialize, Serialize};

/// Static identity and folder list for the daemon binary.
///
/// In an embedding application the catalog is owned by the identity/sync
/// process; this table only exists so the binary can run standalone.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// TOML: `catalog.signed_in`. Default: `false`.
    #[serde(default)]
    pub signed_in: bool,

    /// TOML: `catalog.offline_mode`. Default: `false`.
    #[serde(default)]
    pub offline_mode: bool,

    /// TOML: `catalog.device_id`.
    #[serde(default)]
    pub device_id: Option<String>,

    /// TOML: `catalog.device_key`.
    #[serde(default)]
    pub device_key: Option<String>,

    /// Folder opened by `open_current`. TOML: `catalog.selected_folder`.
    #[serde(default)]
    pub selected_folder: Option<String>,

    /// TOML: `[[catalog.folders]]`.
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
}
