//! Configuration loading and management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether the /auth routes and bearer-token handling are active.
    #[serde(default = "default_auth_enabled")]
    pub auth_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            auth_enabled: default_auth_enabled(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("todo.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_auth_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the default location or return defaults.
    pub fn load_or_default() -> Self {
        // Try todo-api.yaml in the working directory
        if let Ok(config) = Self::load("todo-api.yaml") {
            return config;
        }

        // Try environment variables
        let mut config = Self::default();

        if let Ok(db_path) = std::env::var("TODO_API_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Ok(host) = std::env::var("TODO_API_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = std::env::var("TODO_API_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }

        if let Ok(auth) = std::env::var("TODO_API_AUTH") {
            config.server.auth_enabled = !matches!(auth.as_str(), "0" | "false" | "off");
        }

        config
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
