//! Configuration loading and management.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server identity and listener.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: Option<DatabaseConfig>,
    /// Role assignment configuration.
    #[serde(default)]
    pub roles: RolesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Path to the SQLite database file.
    pub fn db_path(&self) -> &str {
        self.database
            .as_ref()
            .map(|d| d.path.as_str())
            .unwrap_or("mentord.db")
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (used in log output).
    pub name: String,
    /// Address the TCP gateway listens on.
    pub listen: SocketAddr,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    pub path: String,
}

/// Role assignment configuration.
///
/// Role resolution is a data lookup against the durable participant record;
/// this allowlist only decides the role written at registration time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolesConfig {
    /// Handles that register with the supervisor role. Matching is
    /// case-insensitive.
    #[serde(default)]
    pub supervisors: Vec<String>,
}
