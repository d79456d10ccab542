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
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid classifier URL: {0}")]
    InvalidUrl(String),

    #[error("Typing minimum ({min_ms}ms) exceeds maximum ({max_ms}ms)")]
    InvalidTypingBounds { min_ms: u64, max_ms: u64 },

    #[error("Typing speed must be positive")]
    InvalidTypingSpeed,

    #[error("Typing jitter must be within [0, 1), got {0}")]
    InvalidJitter(f64),

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
