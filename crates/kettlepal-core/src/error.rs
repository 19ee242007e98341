//! Core error types for kettlepal-core.
//!
//! This module defines the error hierarchy using thiserror. Validation
//! problems in a draft are not errors: they are reported as
//! [`Violation`](crate::validation::Violation) lists and never leave the
//! process.

use std::path::PathBuf;
use thiserror::Error;

use crate::compose::ComposerState;

/// Core error type for kettlepal-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Composer lifecycle errors
    #[error("Composer error: {0}")]
    Compose(#[from] ComposeError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors returned by the persistence API boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS, ...)
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success HTTP status
    #[error("Server responded with status {status}")]
    Status { status: u16 },

    /// The GraphQL response carried an `errors` array
    #[error("{message}")]
    GraphQl { message: String },

    /// The GraphQL response had no data for the requested field
    #[error("Response is missing data for '{field}'")]
    MissingData { field: String },

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured endpoint is not a valid URL
    #[error("Invalid API endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

impl ApiError {
    /// Message suitable for a user-facing banner.
    ///
    /// Server-provided GraphQL messages are shown verbatim; everything else
    /// collapses to `None` so the caller can fall back to a generic text.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::GraphQl { message } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Home/config directory could not be prepared
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the composition controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    /// A commit is in flight; the draft is locked until it resolves.
    #[error("A save is in progress; the workout cannot be changed until it finishes")]
    Busy,

    /// The requested action is not allowed from the current state.
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: ComposerState,
        action: &'static str,
    },

    /// A field name that no draft field answers to.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A raw input value that cannot be parsed for its field.
    #[error("Invalid value '{value}' for '{field}': {message}")]
    InvalidFieldValue {
        field: String,
        value: String,
        message: String,
    },

    /// The timer could not spawn its tick task.
    #[error("Session timer requires a running Tokio runtime")]
    NoRuntime,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
