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
    #[error("Invalid call timeout")]
    InvalidTimeout,

    #[error("Circuit failure threshold must be at least 1")]
    InvalidFailureThreshold,

    #[error("Sidecar base URL must be an http(s) URL")]
    InvalidSidecarUrl,
}
