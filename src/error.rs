//! Error types for loading and decoding documents

use thiserror::Error;

/// Result type for checker operations
pub type Result<T> = std::result::Result<T, CompatError>;

/// Errors raised around a compatibility check.
///
/// A detected incompatibility is not an error: it is reported as
/// [`Incompatibility`](crate::Incompatibility).
#[derive(Error, Debug)]
pub enum CompatError {
    #[error("Failed to read {location}: {message}")]
    Fetch { location: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid JSON in {source_name}: {source}")]
    Decode {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid document source: {0}")]
    InvalidSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
