//! Error types for warden-state

use thiserror::Error;

/// Errors that can occur in the persistence layer.
///
/// `Unavailable` is the retryable "history store unreachable" case: callers
/// building an evaluation context must abort on it rather than fall back to
/// default counts.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store unreachable; the triggering event should be redelivered
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Backend query error
    #[error("store query failed: {0}")]
    Backend(String),

    /// Serialization error
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Connection establishment error
    #[error("store connection failed: {0}")]
    Connection(String),
}

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
