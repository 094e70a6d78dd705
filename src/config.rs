use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "swift-registry";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_DATABASE_PATH: &str = "SWIFT_REGISTRY_DB";
pub const ENV_SEED_FILE: &str = "SWIFT_REGISTRY_SEED_FILE";
pub const ENV_BIND_ADDR: &str = "SWIFT_REGISTRY_ADDR";

pub const DEFAULT_SEED_FILE: &str = "data/swift_codes.csv";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "swift_registry=info"
}

/// Platform data directory for the registry, falling back to the working
/// directory when the platform has none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_database_path() -> PathBuf {
    app_data_dir().join("swift_codes.db")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid bind address {value:?} in {var}: {source}")]
    InvalidAddress {
        var: &'static str,
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Runtime settings resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub seed_file: PathBuf,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`; unset or blank values take the
    /// default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_path = get(ENV_DATABASE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);
        let seed_file = PathBuf::from(get(ENV_SEED_FILE).unwrap_or_else(|| DEFAULT_SEED_FILE.into()));

        let addr = get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = addr
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidAddress {
                var: ENV_BIND_ADDR,
                value: addr.clone(),
                source,
            })?;

        Ok(Self {
            database_path,
            seed_file,
            bind_addr,
        })
    }
}
