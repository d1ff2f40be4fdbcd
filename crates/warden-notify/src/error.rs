//! Error types for warden-notify

use thiserror::Error;

/// Errors raised by notification gateways.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Transport-level failure reaching the gateway endpoint
    #[error("notification transport failed: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status
    #[error("notification rejected (status {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Payload could not be serialized
    #[error("notification serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for gateway operations
pub type NotifyResult<T> = std::result::Result<T, NotifyError>;

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}
