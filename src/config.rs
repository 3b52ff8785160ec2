//! Configuration loading.
//!
//! Values are layered with figment: built-in defaults, then an optional
//! TOML file, then `NOTEKEEPER_*` environment variables. Nested keys use a
//! double underscore, e.g. `NOTEKEEPER_SEARCH__CASE_SENSITIVE=true`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{NotekeeperError, Result};
use crate::search::SearchConfig;
use crate::storage::StorageConfig;
use crate::web::SessionConfig;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "notekeeper.toml";

const ENV_PREFIX: &str = "NOTEKEEPER_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
    pub session: SessionConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, `host:port`.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Config {
    /// Load from `config_path`, or `notekeeper.toml` in the working
    /// directory, plus the environment. A missing file is not an error.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let config_file = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

        Self::figment(&config_file).extract::<Config>()?.validated()
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn validated(self) -> Result<Self> {
        self.bind_addr()?;
        if self.storage.database_path.as_os_str().is_empty() {
            return Err(NotekeeperError::Config(
                "storage.database_path must not be empty".to_string(),
            ));
        }
        if self.session.lifetime_secs == 0 {
            return Err(NotekeeperError::Config(
                "session.lifetime_secs must be positive".to_string(),
            ));
        }
        Ok(self)
    }

    /// Parsed listener address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|_| {
            NotekeeperError::Config(format!("invalid bind address: {}", self.server.bind))
        })
    }
}
