//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Model endpoint must be an http(s) URL")]
    InvalidModelEndpoint,

    #[error("Model request timeout must be non-zero")]
    InvalidModelTimeout,

    #[error("Temperature must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("History window must allow at least one message")]
    InvalidHistoryWindow,

    #[error("Characters-per-token must be positive")]
    InvalidCharsPerToken,

    #[error("Idle threshold must be non-zero")]
    InvalidIdleThreshold,
}
