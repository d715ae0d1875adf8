//! Error types for sqlkit

use thiserror::Error;

/// Core error type for sqlkit operations
#[derive(Error, Debug)]
pub enum SqlKitError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No authentication secret was supplied for a driver that needs one
    #[error("Missing credential: {0}")]
    CredentialMissing(String),
}

impl SqlKitError {
    /// Whether the error was raised by the database itself or while talking to it.
    ///
    /// Store errors are surfaced unchanged to callers and never retried.
    pub fn is_store_error(&self) -> bool {
        matches!(self, SqlKitError::Connection(_) | SqlKitError::Query(_))
    }
}

/// Result type alias for sqlkit operations
pub type Result<T> = std::result::Result<T, SqlKitError>;
