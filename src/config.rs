//! Configuration module for huddle.

use serde::Deserialize;
use std::path::Path;

use crate::{HuddleError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (connection URL when built with the
    /// postgres feature).
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/huddle.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/huddle.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Interval between scheduled ingestion batches in seconds.
    #[serde(default = "default_batch_interval")]
    pub batch_interval_secs: u64,
    /// Interval between gap-healing checks in seconds.
    #[serde(default = "default_gap_check_interval")]
    pub gap_check_interval_secs: u64,
    /// Age after which a source's last successful ingest counts as stale.
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: i64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Maximum items processed per source per cycle.
    #[serde(default = "default_max_items")]
    pub max_items_per_feed: usize,
    /// Optional TOML seed file with sources and tags to upsert at startup.
    #[serde(default)]
    pub seed_path: Option<String>,
}

fn default_batch_interval() -> u64 {
    3600 // 1 hour
}

fn default_gap_check_interval() -> u64 {
    86400 // once a day
}

fn default_stale_after() -> i64 {
    7200 // 2 hours
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_read_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_items() -> usize {
    100
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_interval_secs: default_batch_interval(),
            gap_check_interval_secs: default_gap_check_interval(),
            stale_after_secs: default_stale_after(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
            max_items_per_feed: default_max_items(),
            seed_path: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Ingestion configuration.
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(HuddleError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| HuddleError::Config(format!("config parse error: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.total_timeout_secs == 0 {
            return Err(HuddleError::Config(
                "ingest.total_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.ingest.stale_after_secs <= 0 {
            return Err(HuddleError::Config(
                "ingest.stale_after_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
