//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the engine runs.

use std::env;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::constants::{
    DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_JOIN_CODE_ATTEMPTS, DEFAULT_JOIN_CODE_LENGTH,
    DEFAULT_MAX_TEAM_SIZE, DEFAULT_NOTIFICATION_QUEUE, DEFAULT_REDIS_URL,
    DEFAULT_STORAGE_RETRY_ATTEMPTS,
};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub engine: EngineConfig,
}

/// Log output configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub rust_log: String,
    pub format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Redis configuration for the notification queue
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub notification_queue: String,
}

/// Tunables of the lifecycle engine itself
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Roster cap enforced by `join_team`
    pub max_team_size: usize,
    pub join_code_length: usize,
    /// Codes tried before join-code allocation reports a transient failure
    pub join_code_attempts: u32,
    /// Bound on whole-operation retries after a stale compare-and-set
    pub storage_retry_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_team_size: DEFAULT_MAX_TEAM_SIZE,
            join_code_length: DEFAULT_JOIN_CODE_LENGTH,
            join_code_attempts: DEFAULT_JOIN_CODE_ATTEMPTS,
            storage_retry_attempts: DEFAULT_STORAGE_RETRY_ATTEMPTS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            logging: LoggingConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env(),
            engine: EngineConfig::from_env()?,
        })
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let format = match env::var("LOG_FORMAT").as_deref() {
            Err(_) | Ok("pretty") => LogFormat::Pretty,
            Ok("json") => LogFormat::Json,
            Ok(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
        };

        Ok(Self {
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            format,
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("DATABASE_URL").ok(),
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
        })
    }

    /// The database URL, required by commands that touch PostgreSQL
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("DATABASE_URL".to_string()))
    }
}

impl RedisConfig {
    fn from_env() -> Self {
        Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            notification_queue: env::var("NOTIFICATION_QUEUE")
                .unwrap_or_else(|_| DEFAULT_NOTIFICATION_QUEUE.to_string()),
        }
    }
}

impl EngineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            max_team_size: parse_or("MAX_TEAM_SIZE", DEFAULT_MAX_TEAM_SIZE)?,
            join_code_length: parse_or("JOIN_CODE_LENGTH", DEFAULT_JOIN_CODE_LENGTH)?,
            join_code_attempts: parse_or("JOIN_CODE_ATTEMPTS", DEFAULT_JOIN_CODE_ATTEMPTS)?,
            storage_retry_attempts: parse_or(
                "STORAGE_RETRY_ATTEMPTS",
                DEFAULT_STORAGE_RETRY_ATTEMPTS,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot operate with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_team_size == 0 {
            return Err(ConfigError::InvalidValue("MAX_TEAM_SIZE".to_string()));
        }
        if !(4..=32).contains(&self.join_code_length) {
            return Err(ConfigError::InvalidValue("JOIN_CODE_LENGTH".to_string()));
        }
        if self.join_code_attempts == 0 {
            return Err(ConfigError::InvalidValue("JOIN_CODE_ATTEMPTS".to_string()));
        }
        if self.storage_retry_attempts == 0 {
            return Err(ConfigError::InvalidValue("STORAGE_RETRY_ATTEMPTS".to_string()));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
