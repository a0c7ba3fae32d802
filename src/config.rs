//! Node configuration
//!
//! Loaded from a JSON file and validated before anything touches disk.
//!
//! ```json
//! {
//!   "node_id": "node1",
//!   "data_dir": "./data/node1",
//!   "host": "127.0.0.1",
//!   "port": 8080,
//!   "raft_port": 9080,
//!   "peers": ["127.0.0.1:9081"],
//!   "log_level": "info",
//!   "submit_timeout_ms": 5000
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wal;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Unique node identifier (required)
    pub node_id: String,

    /// Data directory (required)
    pub data_dir: PathBuf,

    /// Client-facing host
    #[serde(default = "default_host")]
    pub host: String,

    /// Client-facing port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Consensus transport port
    #[serde(default = "default_raft_port")]
    pub raft_port: u16,

    /// Consensus addresses of the other members
    #[serde(default)]
    pub peers: Vec<String>,

    /// Default log filter; `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long a write waits to be committed
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_raft_port() -> u16 {
    9080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_submit_timeout_ms() -> u64 {
    5000
}

impl Config {
    /// Config with defaults for everything but the required fields.
    pub fn new(node_id: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            node_id: node_id.into(),
            data_dir: data_dir.into(),
            host: default_host(),
            port: default_port(),
            raft_port: default_raft_port(),
            peers: Vec::new(),
            log_level: default_log_level(),
            submit_timeout_ms: default_submit_timeout_ms(),
        }
    }

    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.node_id.trim().is_empty() {
            return Err(ConfigError::Invalid("node_id must not be empty".into()));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        if self.host.is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }

        if self.port == self.raft_port {
            return Err(ConfigError::Invalid(format!(
                "port and raft_port must differ (both {})",
                self.port
            )));
        }

        if self.submit_timeout_ms == 0 {
            return Err(ConfigError::Invalid("submit_timeout_ms must be > 0".into()));
        }

        if let Some(peer) = self.peers.iter().find(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("invalid peer address '{}'", peer)));
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        &self.data_dir
    }

    /// `<data_dir>/wal/wal.log`
    pub fn wal_path(&self) -> PathBuf {
        wal::wal_path(&self.data_dir)
    }

    /// Client-facing `host:port`
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Consensus `host:raft_port`, advertised as the leader hint
    pub fn raft_address(&self) -> String {
        format!("{}:{}", self.host, self.raft_port)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("heliosdb.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_applied() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), r#"{"node_id":"node1","data_dir":"/tmp/h"}"#);

        let config = Config::load(&path).unwrap();

        assert_eq!(config, Config::new("node1", "/tmp/h"));
        assert_eq!(config.http_address(), "127.0.0.1:8080");
        assert_eq!(config.raft_address(), "127.0.0.1:9080");
        assert_eq!(config.submit_timeout(), Duration::from_secs(5));
        assert_eq!(config.wal_path(), PathBuf::from("/tmp/h/wal/wal.log"));
    }

    #[test]
    fn test_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            temp_dir.path(),
            r#"{
                "node_id": "node2",
                "data_dir": "./data",
                "host": "0.0.0.0",
                "port": 8081,
                "raft_port": 9081,
                "peers": ["10.0.0.1:9080"],
                "log_level": "debug",
                "submit_timeout_ms": 250
            }"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.peers, vec!["10.0.0.1:9080".to_string()]);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.submit_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_missing_required_field() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), r#"{"data_dir":"/tmp/h"}"#);

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_node_id_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), r#"{"node_id":"  ","data_dir":"/tmp/h"}"#);

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("node_id"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::new("n", "/tmp/h");
        config.submit_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_same_ports_rejected() {
        let mut config = Config::new("n", "/tmp/h");
        config.raft_port = config.port;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = Config::load(&temp_dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
