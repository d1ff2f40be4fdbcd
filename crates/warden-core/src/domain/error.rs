//! Error taxonomy for the evaluation and remediation workflow.

use warden_notify::NotifyError;
use warden_state::StoreError;

use crate::scm::ScmError;

/// Buildwarden core errors.
///
/// Propagation policy: context-builder and rule-engine failures abort the
/// current evaluation entirely; remediation failures are scoped to the
/// single action being executed and reported against it.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// History store unreachable while building a context. Retryable; the
    /// inbound transport is expected to redeliver the event.
    #[error("history unavailable: {0}")]
    HistoryUnavailable(String),

    /// Stale or duplicate confirmation callback. Logged and answered
    /// ("already handled"); not an operator-facing error.
    #[error("unknown action set: {0}")]
    UnknownActionSet(String),

    /// Remediation failure, scoped to one action.
    #[error(transparent)]
    Scm(#[from] ScmError),

    /// Notification gateway failure.
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Pending-action store failure outside context assembly.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Rule table could not be loaded or parsed.
    #[error("invalid rule configuration: {0}")]
    RuleConfig(String),

    /// Process configuration is incomplete or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An action was produced without a parameter its executor requires.
    #[error("action missing required parameter: {0}")]
    InvalidAction(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, WardenError>;
