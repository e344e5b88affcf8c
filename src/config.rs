//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "recordings".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Retention policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Maximum age of an unkept segment before eviction
    #[serde(default = "default_horizon")]
    pub horizon_secs: u64,

    /// Time between eviction passes
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Default keep-window reach before a trigger instant
    #[serde(default = "default_buffer_before")]
    pub buffer_before_ms: u64,

    /// Default keep-window reach after a trigger instant
    #[serde(default = "default_buffer_after")]
    pub buffer_after_ms: u64,
}

fn default_horizon() -> u64 {
    600 // 10 minutes
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_buffer_before() -> u64 {
    60_000
}

fn default_buffer_after() -> u64 {
    30_000
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            horizon_secs: default_horizon(),
            sweep_interval_secs: default_sweep_interval(),
            buffer_before_ms: default_buffer_before(),
            buffer_after_ms: default_buffer_after(),
        }
    }
}

/// Ingestion watcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// How often watched directories are scanned
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How long a file's size and mtime must hold still
    #[serde(default = "default_quiet_period")]
    pub quiet_period_ms: u64,
}

fn default_poll_interval() -> u64 {
    250
}

fn default_quiet_period() -> u64 {
    1000
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            quiet_period_ms: default_quiet_period(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8350
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            std::env::var("LOOKBACK_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("./lookback.toml")),
            dirs::config_dir().map(|p| p.join("lookback").join("config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Storage overrides
        if let Ok(data_dir) = std::env::var("LOOKBACK_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        // Retention overrides
        if let Ok(horizon) = std::env::var("LOOKBACK_HORIZON_SECS") {
            if let Ok(v) = horizon.parse() {
                self.retention.horizon_secs = v;
            }
        }
        if let Ok(interval) = std::env::var("LOOKBACK_SWEEP_INTERVAL_SECS") {
            if let Ok(v) = interval.parse() {
                self.retention.sweep_interval_secs = v;
            }
        }
        if let Ok(before) = std::env::var("LOOKBACK_BUFFER_BEFORE_MS") {
            if let Ok(v) = before.parse() {
                self.retention.buffer_before_ms = v;
            }
        }
        if let Ok(after) = std::env::var("LOOKBACK_BUFFER_AFTER_MS") {
            if let Ok(v) = after.parse() {
                self.retention.buffer_after_ms = v;
            }
        }

        // Ingest overrides
        if let Ok(poll) = std::env::var("LOOKBACK_POLL_INTERVAL_MS") {
            if let Ok(v) = poll.parse() {
                self.ingest.poll_interval_ms = v;
            }
        }
        if let Ok(quiet) = std::env::var("LOOKBACK_QUIET_PERIOD_MS") {
            if let Ok(v) = quiet.parse() {
                self.ingest.quiet_period_ms = v;
            }
        }

        // API overrides
        if let Ok(host) = std::env::var("LOOKBACK_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("LOOKBACK_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("LOOKBACK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOOKBACK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            retention: RetentionConfig::default(),
            ingest: IngestConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Lookback Configuration
#
# Environment variables override these settings:
# - LOOKBACK_DATA_DIR
# - LOOKBACK_HORIZON_SECS
# - LOOKBACK_SWEEP_INTERVAL_SECS
# - LOOKBACK_BUFFER_BEFORE_MS
# - LOOKBACK_BUFFER_AFTER_MS
# - LOOKBACK_POLL_INTERVAL_MS
# - LOOKBACK_QUIET_PERIOD_MS
# - LOOKBACK_API_HOST
# - LOOKBACK_API_PORT
# - LOOKBACK_LOG_LEVEL
# - LOOKBACK_LOG_FORMAT

[storage]
# Root directory holding the media directories and the segment index.
# Producers write video into <data_dir>/segments and audio into
# <data_dir>/audio.
data_dir = "recordings"

[retention]
# Maximum age of an unkept segment before eviction (seconds)
horizon_secs = 600

# Time between eviction passes (seconds)
sweep_interval_secs = 60

# Default keep-window reach around a trigger instant (milliseconds)
buffer_before_ms = 60000
buffer_after_ms = 30000

[ingest]
# How often watched directories are scanned (milliseconds)
poll_interval_ms = 250

# How long a file must hold still before it counts as fully written
# (milliseconds)
quiet_period_ms = 1000

[api]
# API server host
host = "127.0.0.1"

# API server port
port = 8350

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/lookback/lookback.log"
"#
    .to_string()
}
