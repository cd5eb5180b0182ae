//! Configuration file
//!
//! JSON, every field optional:
//!
//! ```json
//! {
//!   "mongodb": { "host": "localhost", "port": 27017 },
//!   "server": { "host": "127.0.0.1", "port": 5000, "cors_origins": [] },
//!   "database": "stocklab",
//!   "code_collection": "code_info",
//!   "log_format": "pretty"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;
use crate::observability::LogFormat;
use crate::rest_api::{DEFAULT_CODE_COLLECTION, DEFAULT_DATABASE};
use crate::store::StoreConfig;

use super::errors::{CliError, CliResult};

/// Process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Document store endpoint
    #[serde(default)]
    pub mongodb: StoreConfig,

    /// HTTP listener
    #[serde(default)]
    pub server: HttpServerConfig,

    /// Database holding reference data (default: "stocklab")
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection holding security codes (default: "code_info")
    #[serde(default = "default_code_collection")]
    pub code_collection: String,

    /// Log line format (default: "pretty")
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_code_collection() -> String {
    DEFAULT_CODE_COLLECTION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongodb: StoreConfig::default(),
            server: HttpServerConfig::default(),
            database: default_database(),
            code_collection: default_code_collection(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.mongodb.host.trim().is_empty() {
            return Err(CliError::config_error("mongodb.host must not be empty"));
        }
        if self.mongodb.port == 0 {
            return Err(CliError::config_error("mongodb.port must be > 0"));
        }
        if self.database.trim().is_empty() {
            return Err(CliError::config_error("database must not be empty"));
        }
        if self.code_collection.trim().is_empty() {
            return Err(CliError::config_error("code_collection must not be empty"));
        }
        Ok(())
    }
}
