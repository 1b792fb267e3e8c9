use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ObjectDesignError, Result};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub database_path: Option<String>,
    pub server: Option<ServerConfig>,
    pub openai: Option<OpenAiConfig>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ObjectDesignError::Config(e.to_string()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ObjectDesignError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn database_path(&self) -> &str {
        self.database_path
            .as_deref()
            .unwrap_or("./data/object-design.db")
    }

    pub fn host(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|server| server.host.as_deref())
            .unwrap_or("0.0.0.0")
    }

    pub fn port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|server| server.port)
            .unwrap_or(8000)
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.server
            .as_ref()
            .and_then(|server| server.cors_origins.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let config = Config::default();
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.port(), 8000);
        assert_eq!(config.database_path(), "./data/object-design.db");
        assert!(config.cors_origins().is_empty());
    }

    #[test]
    fn parses_json_config() {
        let config: Config = serde_json::from_str(
            r#"{
                "database_path": "/tmp/design.db",
                "server": {"host": "127.0.0.1", "port": 9000, "cors_origins": ["http://localhost:5173"]},
                "openai": {"api_key": "key", "model": null, "base_url": null}
            }"#,
        )
        .unwrap();
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.port(), 9000);
        assert_eq!(config.cors_origins().len(), 1);
        assert_eq!(config.openai.unwrap().api_key.as_deref(), Some("key"));
    }
}
