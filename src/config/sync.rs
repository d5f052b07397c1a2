use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Background sync and connection retry settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Seconds between scheduled sync cycles.
    /// TOML: `sync.interval_secs`. Default: `300`.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// First backoff delay while waiting for a store connection.
    /// TOML: `sync.connect_retry_min_delay_ms`. Default: `250`.
    #[serde(default = "default_connect_retry_min_delay_ms")]
    pub connect_retry_min_delay_ms: u64,

    /// Backoff ceiling while waiting for a store connection.
    /// TOML: `sync.connect_retry_max_delay_secs`. Default: `30`.
    #[serde(default = "default_connect_retry_max_delay_secs")]
    pub connect_retry_max_delay_secs: u64,

    /// Give up waiting for a connection after this many retries.
    /// TOML: `sync.connect_retry_max_times`. Unset: retry indefinitely.
    #[serde(default)]
    pub connect_retry_max_times: Option<usize>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            connect_retry_min_delay_ms: default_connect_retry_min_delay_ms(),
            connect_retry_max_delay_secs: default_connect_retry_max_delay_secs(),
            connect_retry_max_times: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResolvedConfig {
    pub interval: Duration,
    pub connect_retry_min_delay: Duration,
    pub connect_retry_max_delay: Duration,
    pub connect_retry_max_times: Option<usize>,
}

impl SyncConfig {
    pub fn resolve(&self) -> SyncResolvedConfig {
        let min_delay = Duration::from_millis(self.connect_retry_min_delay_ms.max(1));
        let max_delay = Duration::from_secs(self.connect_retry_max_delay_secs).max(min_delay);
        SyncResolvedConfig {
            interval: Duration::from_secs(self.interval_secs.max(1)),
            connect_retry_min_delay: min_delay,
            connect_retry_max_delay: max_delay,
            connect_retry_max_times: self.connect_retry_max_times,
        }
    }
}

impl Default for SyncResolvedConfig {
    fn default() -> Self {
        SyncConfig::default().resolve()
    }
}

fn default_interval_secs() -> u64 {
    300
}

fn default_connect_retry_min_delay_ms() -> u64 {
    250
}

fn default_connect_retry_max_delay_secs() -> u64 {
    30
}
