//! Store Connection Configuration
//!
//! Endpoint of the document database.

use serde::{Deserialize, Serialize};

/// Document database endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Host name (default: "localhost")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port (default: 27017)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    27017
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl StoreConfig {
    /// Connection string for the driver
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.uri(), "mongodb://localhost:27017");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"host": "db.internal"}"#).unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 27017);
    }
}
