//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::views::ConflictPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub resources: ResourcesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Snapshots buffered per document before slow subscribers skip ahead
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("mediqueue").to_string_lossy().to_string())
        .unwrap_or_else(|| "./mediqueue_data".to_string())
}

fn default_database_file() -> String {
    "mediqueue.db".to_string()
}

fn default_feed_capacity() -> usize {
    64
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            feed_capacity: default_feed_capacity(),
        }
    }
}

impl StorageConfig {
    /// Full path to the SQLite database
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.database_file)
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_max_connections")]
    pub max_ws_connections: usize,

    /// Raw document subscriptions one WebSocket connection may hold
    #[serde(default = "default_max_subscriptions")]
    pub max_ws_subscriptions: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8085
}

fn default_max_connections() -> usize {
    1000
}

fn default_max_subscriptions() -> usize {
    16
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:8086".to_string(),
                "http://127.0.0.1:8086".to_string(),
            ],
            max_ws_connections: default_max_connections(),
            max_ws_subscriptions: default_max_subscriptions(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    #[serde(default)]
    pub staff: Vec<StaffAccount>,
}

/// A staff login
#[derive(Debug, Clone, Deserialize)]
pub struct StaffAccount {
    pub email: String,
    /// Hex SHA-256 of the password (see `mediqueue hash-password`)
    pub password_sha256: String,
}

fn default_session_ttl() -> u64 {
    12 * 60 * 60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl(),
            staff: Vec::new(),
        }
    }
}

/// Resources form behavior
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcesConfig {
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
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

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
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
            dirs::config_dir().map(|p| p.join("mediqueue").join("config.toml")),
            Some(PathBuf::from("/etc/mediqueue/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = std::env::var("MEDIQUEUE_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Ok(host) = std::env::var("MEDIQUEUE_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("MEDIQUEUE_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Ok(policy) = std::env::var("MEDIQUEUE_CONFLICT_POLICY") {
            match policy.parse() {
                Ok(p) => self.resources.conflict_policy = p,
                Err(e) => tracing::warn!("Ignoring MEDIQUEUE_CONFLICT_POLICY: {}", e),
            }
        }

        if let Ok(level) = std::env::var("MEDIQUEUE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("MEDIQUEUE_LOG_FORMAT") {
            self.logging.format = format;
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
    r#"# MediQueue Configuration
#
# Environment variables override these settings:
# - MEDIQUEUE_DATA_DIR
# - MEDIQUEUE_API_HOST
# - MEDIQUEUE_API_PORT
# - MEDIQUEUE_CONFLICT_POLICY
# - MEDIQUEUE_LOG_LEVEL
# - MEDIQUEUE_LOG_FORMAT

[storage]
# Directory for the document database
data_dir = "~/.local/share/mediqueue"

# Database file name inside data_dir
database_file = "mediqueue.db"

# Snapshots buffered per document for slow subscribers
feed_capacity = 64

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8085

# Allowed CORS origins (empty list allows any origin)
cors_origins = ["http://localhost:8086", "http://127.0.0.1:8086"]

# Maximum concurrent WebSocket connections
max_ws_connections = 1000

# Maximum raw document subscriptions per WebSocket connection
max_ws_subscriptions = 16

[auth]
# Session lifetime in seconds
session_ttl_secs = 43200

# Staff logins. Generate hashes with: mediqueue hash-password
# [[auth.staff]]
# email = "admin@hospital.org"
# password_sha256 = "..."

[resources]
# last_write_wins: a submit always overwrites the status document
# reject_stale: a submit fails if the document changed since the form loaded
conflict_policy = "last_write_wins"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8085);
        assert_eq!(config.api.addr(), "0.0.0.0:8085");
        assert_eq!(config.auth.session_ttl_secs, 43200);
        assert_eq!(config.resources.conflict_policy, ConflictPolicy::LastWriteWins);
        assert!(config
            .storage
            .database_path()
            .ends_with("mediqueue.db"));
    }

    #[test]
    fn test_default_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8085);
        assert_eq!(config.storage.feed_capacity, 64);
        assert!(config.auth.staff.is_empty());
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_parse_staff_and_policy() {
        let config = Config::parse(
            r#"
            [auth]
            session_ttl_secs = 60

            [[auth.staff]]
            email = "nurse@hospital.org"
            password_sha256 = "abc123"

            [resources]
            conflict_policy = "reject_stale"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.session_ttl_secs, 60);
        assert_eq!(config.auth.staff.len(), 1);
        assert_eq!(config.auth.staff[0].email, "nurse@hospital.org");
        assert_eq!(config.resources.conflict_policy, ConflictPolicy::RejectStale);
        assert_eq!(config.api.port, 8085);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/mediqueue.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
