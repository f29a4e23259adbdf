//! Domain error types
//!
//! This module defines the error hierarchy for Podex. All errors are
//! domain-specific and don't expose third-party types, so they can be cloned
//! and handed from one branch of the export tree to its ancestors.

use thiserror::Error;

/// Main Podex error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PodexError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Transport-level failure talking to the platform; never retried
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status returned by the platform
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Server-reported total changed while a collection was being paged
    #[error(
        "{collection} changed during export (total was {expected}, a later page reported {actual}). Aborting!"
    )]
    ConcurrentMutation {
        collection: String,
        expected: u64,
        actual: u64,
    },

    /// Filesystem write failure
    #[error("Writing to {path} failed: {message}")]
    Persistence { path: String, message: String },

    /// Fatal failure downloading a single file
    #[error("Downloading file {file_id} failed: {message}")]
    Download { file_id: u64, message: String },

    /// Two siblings derived the same directory name
    #[error("Name collision: {0}")]
    NameCollision(String),

    /// Summary counters disagree after the export
    #[error("Validation failed at '{path}': {field_a}={left} but {field_b}={right}")]
    Validation {
        path: String,
        field_a: String,
        field_b: String,
        left: String,
        right: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl PodexError {
    /// Builds a persistence error for `path`
    pub fn persistence(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        PodexError::Persistence {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Whether this is a post-export count mismatch rather than a hard failure
    pub fn is_validation(&self) -> bool {
        matches!(self, PodexError::Validation { .. })
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for PodexError {
    fn from(err: std::io::Error) -> Self {
        PodexError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PodexError {
    fn from(err: serde_json::Error) -> Self {
        PodexError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PodexError {
    fn from(err: toml::de::Error) -> Self {
        PodexError::Configuration(format!("TOML parse error: {err}"))
    }
}
