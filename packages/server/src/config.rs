//! Server configuration from environment variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PAGETREE_PORT` | `3001` |
//! | `PAGETREE_DB_PATH` | `~/.pagetree/database/pagetree.db` |
//! | `PAGETREE_EDITORS` | unset (everyone may edit) |
//! | `PAGETREE_DEFAULT_SPACE` | unset |
//! | `CORS_ALLOW_ORIGIN` | local dev origins |

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;

pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:1420",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("Failed to get home directory; set PAGETREE_DB_PATH")]
    NoHomeDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: PathBuf,
    /// User keys allowed to edit; `None` lets everyone edit
    pub editors: Option<Vec<String>>,
    /// Space created with a home page at startup
    pub default_space: Option<String>,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PAGETREE_PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "PAGETREE_PORT",
                    value,
                })?,
            None => DEFAULT_PORT,
        };

        let database_path = match lookup("PAGETREE_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => dirs::home_dir()
                .ok_or(ConfigError::NoHomeDirectory)?
                .join(".pagetree")
                .join("database")
                .join("pagetree.db"),
        };

        let editors = lookup("PAGETREE_EDITORS").map(|value| split_list(&value));
        let default_space = lookup("PAGETREE_DEFAULT_SPACE")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let cors_origins = match lookup("CORS_ALLOW_ORIGIN") {
            Some(value) => split_list(&value),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            port,
            database_path,
            editors,
            default_space,
            cors_origins,
        })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
