//! Core error types for breatho-core.
//!
//! Sequencing itself cannot fail; errors come from configuration,
//! pattern validation, and the feedback capability. Feedback errors are
//! logged and swallowed by the session and never reach the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breatho-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown pattern identity
    #[error("Unknown breathing pattern: {0}")]
    UnknownPattern(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Home directory could not be resolved or created
    #[error("Failed to prepare config directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Empty required field
    #[error("Empty value for '{0}'")]
    Empty(String),

    /// Two patterns share an identity
    #[error("Duplicate pattern id '{0}'")]
    DuplicatePattern(String),

    /// Value outside its allowed range
    #[error("Value {value} for '{field}' is outside {min}..={max}")]
    OutOfRange {
        field: String,
        value: u64,
        min: u64,
        max: u64,
    },
}

/// Failures reported by a [`crate::feedback::FeedbackSink`].
///
/// These are best-effort platform failures: the session logs them and
/// keeps sequencing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedbackError {
    /// Tone playback failed
    #[error("Tone playback failed: {0}")]
    Playback(String),

    /// Haptic pulse failed
    #[error("Haptic pulse failed: {0}")]
    Haptics(String),
}
