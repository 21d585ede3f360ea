//! Error types for Surveyr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Surveyr
#[derive(Debug, Error)]
pub enum SurveyrError {
    /// Configuration record is malformed or out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operator form input failed validation
    #[error("Invalid form: {0}")]
    InvalidForm(String),

    /// Configuration store read/write/subscription error
    #[error("Store error: {0}")]
    Store(String),

    /// Response sink append error
    #[error("Submission error: {0}")]
    Submission(String),

    /// Client-side key-value storage error
    #[error("Client storage error: {0}")]
    ClientStorage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Surveyr operations
pub type Result<T> = std::result::Result<T, SurveyrError>;
