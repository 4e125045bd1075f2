//! Source error types.

use thiserror::Error;

/// Errors that can occur when fetching a definitions document.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No file exists at the location, or the server answered 404.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The server returned an error response.
    #[error("HTTP {status} fetching {location}: {message}")]
    HttpStatus {
        status: u16,
        location: String,
        message: String,
    },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The file exists but could not be read.
    #[error("failed to read {location}: {message}")]
    Io { location: String, message: String },
}
