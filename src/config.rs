//! Configuration for the query service
//!
//! This module provides configuration options for the query path and the
//! HTTP server that fronts it.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default address the HTTP server listens on
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
/// Default keyspace holding metric tables
pub const DEFAULT_KEYSPACE: &str = "data";
/// Default suffix appended to `{customer}_{project}` to name a table
pub const DEFAULT_TABLE_SUFFIX: &str = "_metrics";
/// Default cap on the shards one time-series query may read
pub const DEFAULT_MAX_SHARDS_PER_QUERY: usize = 1000;

/// Configuration options for the query service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct ServiceConfig {
    // Server settings
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,

    // Storage layout
    /// Keyspace holding metric tables
    pub keyspace: String,
    /// Suffix of every metric table name
    pub table_suffix: String,
    /// JSON file used to seed the in-memory store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture_path: Option<PathBuf>,

    // Query settings
    /// Maximum number of shard reads in flight for one request
    pub max_concurrent_fetches: usize,
    /// Maximum number of shards a single query may read
    pub max_shards_per_query: usize,

    // Additional settings
    /// Enable metrics collection
    pub collect_metrics: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            keyspace: DEFAULT_KEYSPACE.to_string(),
            table_suffix: DEFAULT_TABLE_SUFFIX.to_string(),
            fixture_path: None,
            max_concurrent_fetches: 16,
            max_shards_per_query: DEFAULT_MAX_SHARDS_PER_QUERY,
            collect_metrics: true,
        }
    }
}

impl ServiceConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listen address
    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// Set the keyspace
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = keyspace.into();
        self
    }

    /// Set the table suffix
    pub fn with_table_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.table_suffix = suffix.into();
        self
    }

    /// Set the fixture file for the in-memory store
    pub fn with_fixture_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.fixture_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the maximum number of concurrent shard reads per request
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max;
        self
    }

    /// Set the maximum number of shards a single query may read
    pub fn with_max_shards_per_query(mut self, max: usize) -> Self {
        self.max_shards_per_query = max;
        self
    }

    /// Set whether to collect metrics
    pub fn with_collect_metrics(mut self, collect: bool) -> Self {
        self.collect_metrics = collect;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.keyspace.is_empty() || !self.keyspace.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(Error::config(format!(
                "Keyspace must be a non-empty identifier: {:?}",
                self.keyspace
            )));
        }

        if !self.table_suffix.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(Error::config(format!(
                "Table suffix may only contain letters, digits and '_': {:?}",
                self.table_suffix
            )));
        }

        if self.max_concurrent_fetches < 1 {
            return Err(Error::config(
                "Maximum concurrent fetches must be at least 1"
            ));
        }

        if self.max_shards_per_query < 1 {
            return Err(Error::config(
                "Maximum shards per query must be at least 1"
            ));
        }

        Ok(())
    }

    /// Create a human-readable string representation of the configuration
    pub fn to_string_pretty(&self) -> String {
        let mut result = String::new();

        result.push_str("=== Gator Query Configuration ===\n\n");

        result.push_str("Server:\n");
        result.push_str(&format!("  Listen Address: {}\n", self.listen_addr));

        result.push_str("\nStorage Layout:\n");
        result.push_str(&format!("  Keyspace: {}\n", self.keyspace));
        result.push_str(&format!("  Table Suffix: {}\n", self.table_suffix));
        if let Some(ref path) = self.fixture_path {
            result.push_str(&format!("  Fixture: {:?}\n", path));
        }

        result.push_str("\nQuery Settings:\n");
        result.push_str(&format!("  Max Concurrent Fetches: {}\n", self.max_concurrent_fetches));
        result.push_str(&format!("  Max Shards Per Query: {}\n", self.max_shards_per_query));

        result.push_str("\nAdditional Settings:\n");
        result.push_str(&format!("  Collect Metrics: {}\n", self.collect_metrics));

        result
    }

    /// Load configuration from a TOML file
    #[cfg(feature = "toml")]
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    #[cfg(feature = "toml")]
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize to TOML: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();

        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
        assert_eq!(config.keyspace, "data");
        assert_eq!(config.table_suffix, "_metrics");
        assert_eq!(config.max_concurrent_fetches, 16);
        assert_eq!(config.max_shards_per_query, DEFAULT_MAX_SHARDS_PER_QUERY);
        assert!(config.fixture_path.is_none());
        assert!(config.collect_metrics);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ServiceConfig::new()
            .with_listen_addr("127.0.0.1:8080".parse().unwrap())
            .with_keyspace("metrics")
            .with_table_suffix("_agg")
            .with_fixture_path("/tmp/fixture.json")
            .with_max_concurrent_fetches(4)
            .with_max_shards_per_query(64)
            .with_collect_metrics(false);

        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.keyspace, "metrics");
        assert_eq!(config.table_suffix, "_agg");
        assert_eq!(config.fixture_path, Some(PathBuf::from("/tmp/fixture.json")));
        assert_eq!(config.max_concurrent_fetches, 4);
        assert_eq!(config.max_shards_per_query, 64);
        assert!(!config.collect_metrics);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let invalid_configs = vec![
            ServiceConfig::new().with_keyspace(""),
            ServiceConfig::new().with_keyspace("data; drop"),
            ServiceConfig::new().with_table_suffix("_metrics.x"),
            ServiceConfig::new().with_max_concurrent_fetches(0),
            ServiceConfig::new().with_max_shards_per_query(0),
        ];

        for config in invalid_configs {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_config_pretty_string() {
        let pretty = ServiceConfig::new().to_string_pretty();

        assert!(pretty.contains("Server:"));
        assert!(pretty.contains("Storage Layout:"));
        assert!(pretty.contains("Query Settings:"));
        assert!(pretty.contains("Listen Address: 0.0.0.0:5000"));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gator.toml");

        let config = ServiceConfig::new()
            .with_keyspace("metrics")
            .with_max_concurrent_fetches(8);
        config.to_toml_file(&path).unwrap();

        let loaded = ServiceConfig::from_toml_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gator.toml");
        std::fs::write(&path, "listen_addr = \"127.0.0.1:9000\"\n").unwrap();

        let loaded = ServiceConfig::from_toml_file(&path).unwrap();
        assert_eq!(loaded.listen_addr.port(), 9000);
        assert_eq!(loaded.keyspace, DEFAULT_KEYSPACE);
    }
}
