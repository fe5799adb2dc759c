//! Configuration module for Files Manager.

use serde::Deserialize;
use std::path::Path;

use crate::{FilesError, Result};

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Which implementation backs a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// SQLite file opened through sqlx.
    #[default]
    Sqlite,
    /// Process-local, lost on restart.
    Memory,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Store implementation.
    #[serde(default)]
    pub backend: Backend,
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/files_manager.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: default_db_path(),
        }
    }
}

/// Session cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Cache implementation. The SQLite cache shares the database file.
    #[serde(default)]
    pub backend: Backend,
    /// Lifetime of a session token in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// How often expired entries are purged, in seconds.
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

fn default_session_ttl() -> u64 {
    24 * 60 * 60
}

fn default_purge_interval() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            session_ttl_secs: default_session_ttl(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Path to the file storage directory.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Number of files returned per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_storage_path() -> String {
    "/tmp/files_manager".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

fn default_page_size() -> usize {
    20
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
            page_size: default_page_size(),
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
    "logs/files_manager.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Document store configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// File storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FilesError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FilesError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `PORT`: HTTP port
    /// - `DB_PATH`: SQLite database file
    /// - `FOLDER_PATH`: directory where uploaded content is written
    /// - `SESSION_TTL_SECS`: session lifetime
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = env_parse::<u16>("PORT") {
            self.server.port = port;
        }
        if let Some(path) = env_string("DB_PATH") {
            self.database.path = path;
        }
        if let Some(path) = env_string("FOLDER_PATH") {
            self.files.storage_path = path;
        }
        if let Some(ttl) = env_parse::<u64>("SESSION_TTL_SECS") {
            self.cache.session_ttl_secs = ttl;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.cache.session_ttl_secs == 0 {
            return Err(FilesError::Config(
                "cache.session_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.cache.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(FilesError::Config(format!(
                "cache.session_ttl_secs must be at most {MAX_SESSION_TTL_SECS}"
            )));
        }
        if self.files.page_size == 0 {
            return Err(FilesError::Config(
                "files.page_size must be greater than zero".to_string(),
            ));
        }
        if self.files.storage_path.trim().is_empty() {
            return Err(FilesError::Config(
                "files.storage_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert!(config.server.cors_origins.is_empty());

        assert_eq!(config.database.backend, Backend::Sqlite);
        assert_eq!(config.database.path, "data/files_manager.db");

        assert_eq!(config.cache.backend, Backend::Sqlite);
        assert_eq!(config.cache.session_ttl_secs, 86400);
        assert_eq!(config.cache.purge_interval_secs, 300);

        assert_eq!(config.files.storage_path, "/tmp/files_manager");
        assert_eq!(config.files.max_upload_size_mb, 10);
        assert_eq!(config.files.page_size, 20);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/files_manager.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080
cors_origins = ["http://localhost:3000"]

[database]
backend = "memory"
path = "custom/db.sqlite"

[cache]
backend = "memory"
session_ttl_secs = 3600
purge_interval_secs = 60

[files]
storage_path = "custom/files"
max_upload_size_mb = 20
page_size = 50

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.database.backend, Backend::Memory);
        assert_eq!(config.database.path, "custom/db.sqlite");
        assert_eq!(config.cache.backend, Backend::Memory);
        assert_eq!(config.cache.session_ttl_secs, 3600);
        assert_eq!(config.cache.purge_interval_secs, 60);
        assert_eq!(config.files.storage_path, "custom/files");
        assert_eq!(config.files.max_upload_size_mb, 20);
        assert_eq!(config.files.page_size, 50);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 9000
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.session_ttl_secs, 86400);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("invalid toml [[[");
        assert!(matches!(result, Err(FilesError::Config(_))));
    }

    #[test]
    fn test_parse_unknown_backend() {
        let result = Config::parse("[database]\nbackend = \"mongodb\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = Config::default();
        config.cache.session_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ttl_upper_bound() {
        let mut config = Config::default();
        config.cache.session_ttl_secs = MAX_SESSION_TTL_SECS;
        assert!(config.validate().is_ok());

        config.cache.session_ttl_secs = MAX_SESSION_TTL_SECS + 1;
        assert!(matches!(config.validate(), Err(FilesError::Config(_))));

        config.cache.session_ttl_secs = 10_000_000_000_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_page_size() {
        let mut config = Config::default();
        config.files.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(FilesError::Io(_))));
    }
}
