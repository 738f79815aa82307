//! Configuration for the juke orchestrator
//!
//! Bootstrap-only: everything here is fixed for the lifetime of the
//! process. Runtime playback state lives in the coordination store, not
//! in configuration.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (JUKE_PORT, JUKE_DATABASE, JUKE_ENGINE_URL)
//! 3. TOML configuration file
//! 4. Built-in defaults

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{Error, Result};

/// Bootstrap configuration loaded from a TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the shared coordination database
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Base URL of the playback engine process
    #[serde(default = "default_engine_url")]
    pub engine_url: String,

    /// Per-request timeout for engine commands, in seconds
    #[serde(default = "default_engine_timeout_secs")]
    pub engine_timeout_secs: u64,

    /// Advance monitor poll interval, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            database_path: default_database_path(),
            engine_url: default_engine_url(),
            engine_timeout_secs: default_engine_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_port() -> u16 {
    5750
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("juke").join("juke.db"))
        .unwrap_or_else(|| PathBuf::from("juke.db"))
}

fn default_engine_url() -> String {
    "http://127.0.0.1:5751".to_string()
}

fn default_engine_timeout_secs() -> u64 {
    5
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub engine_url: Option<String>,
    pub poll_interval_secs: Option<u64>,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub engine_url: String,
    pub engine_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub log_level: String,
}

impl Config {
    /// Load configuration, merging a TOML file (when given) with
    /// command-line overrides on top of built-in defaults.
    pub fn load(toml_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let toml_config = match toml_path {
            Some(path) => {
                let toml_str = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read config file {:?}: {}", path, e))
                })?;
                let parsed: TomlConfig = toml::from_str(&toml_str)
                    .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
                info!("Loaded configuration from {:?}", path);
                parsed
            }
            None => TomlConfig::default(),
        };

        Ok(Self {
            port: overrides.port.unwrap_or(toml_config.port),
            database_path: overrides
                .database_path
                .unwrap_or(toml_config.database_path),
            engine_url: overrides.engine_url.unwrap_or(toml_config.engine_url),
            engine_timeout_secs: toml_config.engine_timeout_secs,
            poll_interval_secs: overrides
                .poll_interval_secs
                .unwrap_or(toml_config.poll_interval_secs),
            log_level: toml_config.logging.level,
        })
    }

    /// Engine command timeout as a Duration
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }

    /// Advance monitor poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
