//! Remediation backend seam.
//!
//! The core dispatches revert/lock/rebuild through this trait; the
//! `warden-scm` crate provides the git-backed implementation. A dry-run
//! backend ships here for the CLI and for exercising the workflow without
//! touching source control.

use async_trait::async_trait;
use tracing::info;

/// Errors raised while executing a remediation action.
///
/// Host or network failures are fatal for the action being executed (never
/// retried internally) and surface against that action.
#[derive(Debug, thiserror::Error)]
pub enum ScmError {
    /// Git transport or repository failure
    #[error("SCM transport error: {0}")]
    Transport(String),

    /// Branch restriction API answered with a non-success status
    #[error("branch restriction request failed (status {status}): {body}")]
    Restriction { status: u16, body: String },

    /// The configured backend has no support for this operation
    #[error("{0} is not supported by this backend")]
    NotImplemented(&'static str),

    /// Wait for the working-copy lock timed out; retry later
    #[error("SCM working copy busy: lock wait timed out")]
    Busy,

    /// A repository invariant no longer holds; fatal defect, never masked
    #[error("SCM invariant violation: {0}")]
    InvariantViolation(String),

    /// In-process revert produced merge conflicts
    #[error("revert produced conflicts: {0}")]
    RevertConflict(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a completed revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertOutcome {
    /// The newly created revert commit on the branch tip.
    pub new_commit: String,
    /// Whether the change was pushed to the remote (false when push is
    /// disabled by configuration; the revert then exists only locally).
    pub pushed: bool,
}

/// Applies concrete remediation against the source-control backend.
#[async_trait]
pub trait RemediationBackend: Send + Sync {
    /// Revert `commit` on `branch`, pushing if configured to.
    async fn revert_commit(&self, commit: &str, branch: &str) -> Result<RevertOutcome, ScmError>;

    /// Ensure push and merge restrictions exist for `branch`.
    async fn lock_branch(&self, branch: &str) -> Result<(), ScmError>;

    /// Ask the CI backend to rebuild `branch`, returning the build id.
    async fn rebuild_branch(&self, branch: &str) -> Result<String, ScmError>;
}

/// Backend that logs what it would do and reports success.
///
/// Used by the CLI's one-shot evaluation mode.
#[derive(Debug, Default)]
pub struct DryRunBackend;

impl DryRunBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemediationBackend for DryRunBackend {
    async fn revert_commit(&self, commit: &str, branch: &str) -> Result<RevertOutcome, ScmError> {
        info!("[dry-run] would revert commit {commit} on branch {branch}");
        Ok(RevertOutcome {
            new_commit: format!("dry-run-revert-of-{commit}"),
            pushed: false,
        })
    }

    async fn lock_branch(&self, branch: &str) -> Result<(), ScmError> {
        info!("[dry-run] would lock branch {branch}");
        Ok(())
    }

    async fn rebuild_branch(&self, branch: &str) -> Result<String, ScmError> {
        info!("[dry-run] would trigger rebuild of branch {branch}");
        Ok("dry-run-build".to_string())
    }
}
