//! Emitter error handling
//!
//! This module provides the crate error type, a result alias and helper
//! functions so configuration and lifecycle failures are reported at the call
//! site instead of surfacing later as a panic.

use std::path::Path;

/// Errors raised by emitter configuration and lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    #[error("Invalid emitter configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("`{setting}` cannot be changed after the emitter has been activated")]
    ConfigurationLocked { setting: &'static str },

    #[error("Emitter has not been activated")]
    NotActivated,

    #[error("Failed to load emitter config from {path}: {reason}")]
    ConfigLoad { path: String, reason: String },

    #[error("Failed to parse {format} emitter config: {reason}")]
    ConfigParse { format: &'static str, reason: String },

    #[error("Thread pool error: {message}")]
    ThreadPool { message: String },
}

/// Type alias for emitter operation results
pub type EmitterResult<T> = Result<T, EmitterError>;

/// Create an invalid configuration error
pub fn invalid_config(field: &'static str, reason: impl std::fmt::Display) -> EmitterError {
    EmitterError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}

/// Create a configuration locked error
pub fn configuration_locked(setting: &'static str) -> EmitterError {
    EmitterError::ConfigurationLocked { setting }
}

/// Create a config load error for a file
pub fn config_load_error(path: &Path, reason: impl std::fmt::Display) -> EmitterError {
    EmitterError::ConfigLoad {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Create a config parse error
pub fn config_parse_error(format: &'static str, reason: impl std::fmt::Display) -> EmitterError {
    EmitterError::ConfigParse {
        format,
        reason: reason.to_string(),
    }
}

/// Create a thread pool creation error
pub fn thread_pool_error(error: impl std::fmt::Display) -> EmitterError {
    EmitterError::ThreadPool {
        message: format!("Failed to create thread pool: {}", error),
    }
}
