mod basic;
mod catalog;
mod stores;
mod sync;

pub use basic::BasicConfig;
pub use catalog::CatalogConfig;
pub use stores::{
    LocalStoreConfig, RemoteStoreConfig, StoreDefaults, StoreResolvedConfig, StoresConfig,
};
pub use sync::{SyncConfig, SyncResolvedConfig};

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Process-level settings (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Local and remote document store endpoints (see `stores` table in config.toml).
    #[serde(default)]
    pub stores: StoresConfig,

    /// Background sync cadence and connection retry policy.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Static folder catalog used by the daemon binary.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `config.toml` if present.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }

    /// Parses configuration from an in-memory TOML document layered over defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml))
            .extract()
    }

    pub fn local_store(&self) -> StoreResolvedConfig {
        self.stores.local.resolve(&self.stores.defaults)
    }

    pub fn remote_store(&self) -> StoreResolvedConfig {
        self.stores.remote.resolve(&self.stores.defaults)
    }

    pub fn sync(&self) -> SyncResolvedConfig {
        self.sync.resolve()
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);
