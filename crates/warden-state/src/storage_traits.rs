//! Storage trait definitions for Buildwarden
//!
//! Two contracts:
//! - `HistoryStore`: append-only record of build reports and merged pull
//!   requests, queried by branch/commit when assembling evaluation contexts
//! - `PendingActionStore`: keyed persistence of action sets awaiting
//!   operator confirmation
//!
//! All traits are async and backend-agnostic. In-memory implementations are
//! provided via the `fakes` module; `SurrealStore` implements both against
//! a document database. The confirmation workflow must behave identically
//! against either backend.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::records::{ActionSet, BuildReport, BuildStatus, PullRequestMergedEvent};

/// Durable record of build and merge history.
///
/// Ordering guarantee: `builds_for_branch` returns reports most-recent-first
/// by `received_at`; `last_build` is equivalent to the head of that list.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Record a build report.
    async fn record_build(&self, report: &BuildReport) -> StoreResult<()>;

    /// Record a merged pull request.
    async fn record_merge(&self, event: &PullRequestMergedEvent) -> StoreResult<()>;

    /// Most recent report on a branch, if any.
    async fn last_build(&self, branch: &str) -> StoreResult<Option<BuildReport>>;

    /// All reports on a branch, most-recent-first.
    async fn builds_for_branch(&self, branch: &str) -> StoreResult<Vec<BuildReport>>;

    /// Whether the commit has ever produced a passing build on any branch.
    async fn has_ever_succeeded(&self, commit: &str) -> StoreResult<bool>;

    /// Most recent passing report on a branch, if any.
    async fn last_passing_build(&self, branch: &str) -> StoreResult<Option<BuildReport>>;

    /// Number of reports with the given status for a commit on a branch.
    async fn count_status_for_commit_on_branch(
        &self,
        commit: &str,
        branch: &str,
        status: BuildStatus,
    ) -> StoreResult<usize>;

    /// Most recent merged PR, optionally filtered by target branch.
    async fn last_merge(&self, branch: Option<&str>)
        -> StoreResult<Option<PullRequestMergedEvent>>;

    /// Find the merged PR that produced the given merge commit.
    async fn find_merge_by_commit(
        &self,
        commit: &str,
    ) -> StoreResult<Option<PullRequestMergedEvent>>;
}

/// Keyed persistence for action sets awaiting confirmation.
///
/// `take` is the linearization point for the at-most-once execution
/// invariant: it atomically loads and deletes the set, so of two
/// near-simultaneous callbacks for the same id exactly one observes the
/// set and the other observes `None`.
#[async_trait]
pub trait PendingActionStore: Send + Sync {
    /// Persist a newly suggested action set.
    async fn save(&self, action_set: &ActionSet) -> StoreResult<()>;

    /// Load an action set without removing it.
    async fn load(&self, set_id: &str) -> StoreResult<Option<ActionSet>>;

    /// Remove an action set. No-op if absent.
    async fn delete(&self, set_id: &str) -> StoreResult<()>;

    /// Atomically load and delete an action set.
    async fn take(&self, set_id: &str) -> StoreResult<Option<ActionSet>>;
}
