use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

/// Defaults shared by both store endpoints (used when a side leaves a field unset).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreDefaults {
    /// TCP connect timeout in seconds.
    /// TOML: `stores.defaults.connect_timeout_secs`. Default: `5`.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds. Replication calls block until the
    /// one-shot job finishes, so keep this generous.
    /// TOML: `stores.defaults.request_timeout_secs`. Default: `30`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional HTTP proxy, applied to the remote side only.
    /// TOML: `stores.defaults.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,
}

impl Default for StoreDefaults {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            proxy: None,
        }
    }
}

/// Embedded store on the loopback interface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocalStoreConfig {
    /// TOML: `stores.local.host`. Default: `127.0.0.1`.
    #[serde(default = "default_local_host")]
    pub host: String,

    /// TOML: `stores.local.port`. Default: `5985`.
    #[serde(default = "default_local_port")]
    pub port: u16,

    /// Connection pool size. TOML: `stores.local.max_connections`. Default: `1`.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            host: default_local_host(),
            port: default_local_port(),
            max_connections: default_max_connections(),
            connect_timeout_secs: None,
            request_timeout_secs: None,
        }
    }
}

/// Remote cluster, reached over TLS with device credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteStoreConfig {
    /// Cluster hostname. Also resolved directly to pick a replication peer.
    /// TOML: `stores.remote.host`. Default: `cluster.foldersync.invalid`.
    #[serde(default = "default_remote_host")]
    pub host: String,

    /// TOML: `stores.remote.port`. Default: `6984`.
    #[serde(default = "default_remote_port")]
    pub port: u16,

    /// TOML: `stores.remote.tls`. Default: `true`.
    #[serde(default = "default_remote_tls")]
    pub tls: bool,

    /// Connection pool size. TOML: `stores.remote.max_connections`. Default: `1`.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            host: default_remote_host(),
            port: default_remote_port(),
            tls: default_remote_tls(),
            max_connections: default_max_connections(),
            connect_timeout_secs: None,
            request_timeout_secs: None,
        }
    }
}

/// Both store endpoints.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StoresConfig {
    #[serde(default)]
    pub defaults: StoreDefaults,

    #[serde(default)]
    pub local: LocalStoreConfig,

    #[serde(default)]
    pub remote: RemoteStoreConfig,
}

/// One store endpoint with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResolvedConfig {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub max_connections: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub proxy: Option<Url>,
}

impl StoreResolvedConfig {
    /// `scheme://host:port/` for this endpoint.
    /// IPv6 literals are bracketed.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        let scheme = if self.tls { "https" } else { "http" };
        let host = match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{ip}]"),
            _ => self.host.clone(),
        };
        Url::parse(&format!("{scheme}://{host}:{}/", self.port))
    }
}

impl LocalStoreConfig {
    pub fn resolve(&self, defaults: &StoreDefaults) -> StoreResolvedConfig {
        StoreResolvedConfig {
            host: self.host.clone(),
            port: self.port,
            tls: false,
            max_connections: self.max_connections.max(1),
            connect_timeout: Duration::from_secs(
                self.connect_timeout_secs
                    .unwrap_or(defaults.connect_timeout_secs),
            ),
            request_timeout: Duration::from_secs(
                self.request_timeout_secs
                    .unwrap_or(defaults.request_timeout_secs),
            ),
            proxy: None,
        }
    }
}

impl RemoteStoreConfig {
    pub fn resolve(&self, defaults: &StoreDefaults) -> StoreResolvedConfig {
        StoreResolvedConfig {
            host: self.host.clone(),
            port: self.port,
            tls: self.tls,
            max_connections: self.max_connections.max(1),
            connect_timeout: Duration::from_secs(
                self.connect_timeout_secs
                    .unwrap_or(defaults.connect_timeout_secs),
            ),
            request_timeout: Duration::from_secs(
                self.request_timeout_secs
                    .unwrap_or(defaults.request_timeout_secs),
            ),
            proxy: defaults.proxy.clone(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_local_host() -> String {
    "127.0.0.1".to_string()
}

fn default_local_port() -> u16 {
    5985
}

fn default_remote_host() -> String {
    "cluster.foldersync.invalid".to_string()
}

fn default_remote_port() -> u16 {
    6984
}

fn default_remote_tls() -> bool {
    true
}

fn default_max_connections() -> usize {
    1
}
