//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides. The
//! configured chain set and cache timings are loaded once at startup and
//! never re-validated per request.

use crate::cache::SwrCacheConfig;
use crate::status::ChainId;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chains: ChainsConfig,

    #[serde(default)]
    pub upstream: UpstreamSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub gate: GateSettings,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The fixed set of chains this deployment indexes
#[derive(Debug, Clone, Deserialize)]
pub struct ChainsConfig {
    #[serde(default = "default_chain_ids")]
    pub ids: Vec<ChainId>,
}

fn default_chain_ids() -> Vec<ChainId> {
    vec![1]
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            ids: default_chain_ids(),
        }
    }
}

/// Chain status source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default = "default_upstream_url")]
    pub url: String,

    #[serde(default = "default_upstream_timeout")]
    pub request_timeout_ms: u64,
}

fn default_upstream_url() -> String {
    "http://localhost:42069".to_string()
}

fn default_upstream_timeout() -> u64 {
    5000
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            request_timeout_ms: default_upstream_timeout(),
        }
    }
}

/// Indexing status cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Seconds a snapshot stays fresh; omit for unbounded
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: Option<u64>,

    /// Seconds to back off after a failed refresh
    #[serde(default = "default_error_ttl_secs")]
    pub error_ttl_secs: u64,

    /// Background refresh cadence in seconds; omit to disable
    #[serde(default = "default_revalidation_secs")]
    pub proactive_revalidation_interval_secs: Option<u64>,

    /// Fetch at startup instead of on first read
    #[serde(default = "default_proactively_initialize")]
    pub proactively_initialize: bool,
}

fn default_ttl_secs() -> Option<u64> {
    Some(30)
}

fn default_error_ttl_secs() -> u64 {
    15
}

fn default_revalidation_secs() -> Option<u64> {
    Some(10)
}

fn default_proactively_initialize() -> bool {
    true
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            error_ttl_secs: default_error_ttl_secs(),
            proactive_revalidation_interval_secs: default_revalidation_secs(),
            proactively_initialize: default_proactively_initialize(),
        }
    }
}

impl CacheSettings {
    /// Convert to the cache component's own configuration type
    pub fn to_swr_config(&self) -> SwrCacheConfig {
        SwrCacheConfig {
            ttl: self.ttl_secs.map(Duration::from_secs),
            error_ttl: Duration::from_secs(self.error_ttl_secs),
            proactive_revalidation_interval: self
                .proactive_revalidation_interval_secs
                .map(Duration::from_secs),
            proactively_initialize: self.proactively_initialize,
        }
    }
}

/// Gating thresholds for consumers
#[derive(Debug, Clone, Deserialize)]
pub struct GateSettings {
    /// Maximum worst-case staleness, in seconds, a request may see and
    /// still count as realtime
    #[serde(default = "default_max_realtime_distance")]
    pub max_realtime_distance_secs: u64,
}

fn default_max_realtime_distance() -> u64 {
    60
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            max_realtime_distance_secs: default_max_realtime_distance(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
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

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("omnistat").join("config.toml")),
            Some(PathBuf::from("/etc/omnistat/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return Ok(config);
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
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(ids) = std::env::var("OMNISTAT_CHAIN_IDS") {
            self.chains.ids = parse_chain_ids(&ids)?;
        }

        if let Ok(url) = std::env::var("OMNISTAT_UPSTREAM_URL") {
            self.upstream.url = url;
        }

        if let Ok(host) = std::env::var("OMNISTAT_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("OMNISTAT_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Ok(distance) = std::env::var("OMNISTAT_MAX_REALTIME_DISTANCE") {
            if let Ok(d) = distance.parse() {
                self.gate.max_realtime_distance_secs = d;
            }
        }

        if let Ok(level) = std::env::var("OMNISTAT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("OMNISTAT_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Reject configurations that cannot produce a meaningful status
    fn validate(&self) -> Result<(), ConfigError> {
        if self.chains.ids.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one chain id must be configured".to_string(),
            ));
        }
        if self.chains.ids.contains(&0) {
            return Err(ConfigError::Invalid(
                "chain ids must be positive".to_string(),
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for &id in &self.chains.ids {
            if !seen.insert(id) {
                return Err(ConfigError::Invalid(format!("duplicate chain id {}", id)));
            }
        }
        Ok(())
    }
}

fn parse_chain_ids(raw: &str) -> Result<Vec<ChainId>, ConfigError> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<ChainId>()
                .map_err(|_| ConfigError::Invalid(format!("invalid chain id `{}`", part.trim())))
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chains: ChainsConfig::default(),
            upstream: UpstreamSettings::default(),
            cache: CacheSettings::default(),
            gate: GateSettings::default(),
            api: ApiSettings::default(),
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

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Omnistat Configuration
#
# Environment variables override these settings:
# - OMNISTAT_CHAIN_IDS (comma-separated)
# - OMNISTAT_UPSTREAM_URL
# - OMNISTAT_API_HOST
# - OMNISTAT_API_PORT
# - OMNISTAT_MAX_REALTIME_DISTANCE
# - OMNISTAT_LOG_LEVEL
# - OMNISTAT_LOG_FORMAT

[chains]
# Chain ids this deployment indexes; the status source must report
# exactly this set
ids = [1, 10, 8453]

[upstream]
# Base URL of the indexing engine's status API
url = "http://localhost:42069"

# Request timeout in milliseconds
request_timeout_ms = 5000

[cache]
# Seconds a snapshot stays fresh (remove for unbounded)
ttl_secs = 30

# Seconds to back off after a failed refresh
error_ttl_secs = 15

# Background refresh cadence in seconds (remove to disable)
proactive_revalidation_interval_secs = 10

# Fetch at startup instead of on first read
proactively_initialize = true

[gate]
# Maximum worst-case staleness (seconds) still counted as realtime
max_realtime_distance_secs = 60

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8080

# Allowed CORS origins (empty = permissive)
cors_origins = []

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
