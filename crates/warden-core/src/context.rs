//! Evaluation context assembly.
//!
//! Turns one inbound event plus history-store queries into the immutable
//! snapshot the rule engine evaluates. A failed history read aborts the
//! whole evaluation with `HistoryUnavailable` — rules are never evaluated
//! against a partial or defaulted context, which would invite spurious
//! remediation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use warden_state::{BuildStatus, HistoryStore, StoreError};

use crate::domain::{BranchStatus, Event, Result, TriggerType, WardenError};

/// Immutable snapshot of one event plus the historical facts the rules
/// condition on. Built fresh per evaluation; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// Primary trigger category derived from the event shape.
    pub trigger: TriggerType,
    /// The triggering event; `None` only for periodic evaluations.
    pub event: Option<Event>,
    pub branch: String,
    pub commit: Option<String>,
    pub commit_has_ever_succeeded: bool,
    pub consecutive_failures_on_branch: usize,
    pub failures_for_commit_on_branch: usize,
    pub current_branch_status: BranchStatus,
    pub last_passing_commit_for_branch: Option<String>,
    /// Status of the report before the triggering one (drives the
    /// starts-failing / starts-passing derivation). Compares the last two
    /// reports by branch regardless of commit lineage.
    pub previous_report_status: Option<BuildStatus>,
}

impl EvaluationContext {
    /// Description of what is being evaluated, independent of rule matches.
    pub fn describe(&self) -> String {
        match &self.event {
            Some(event) => event.describe(),
            None => format!("Periodic check of branch `{}`", self.branch),
        }
    }
}

/// Builds evaluation contexts from the history store.
pub struct ContextBuilder {
    history: Arc<dyn HistoryStore>,
}

impl ContextBuilder {
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self { history }
    }

    /// Assemble a context for an inbound event.
    ///
    /// For build reports the triggering report must already be recorded, so
    /// the head of the branch history is the report itself and the entry
    /// after it is the "previous" report.
    ///
    /// # Errors
    ///
    /// `WardenError::HistoryUnavailable` on any failed history read.
    pub async fn build(&self, event: &Event) -> Result<EvaluationContext> {
        let branch = event.branch().to_string();
        let commit = event.commit().map(str::to_string);

        let builds = self
            .history
            .builds_for_branch(&branch)
            .await
            .map_err(unavailable)?;

        let current_branch_status = builds
            .first()
            .map(|report| BranchStatus::from(report.status))
            .unwrap_or(BranchStatus::Unknown);

        // Only build reports have a meaningful "previous report": the entry
        // behind the one that triggered this evaluation.
        let previous_report_status = match event {
            Event::BuildReport(_) => builds.get(1).map(|report| report.status),
            _ => None,
        };

        let (commit_has_ever_succeeded, failures_for_commit_on_branch) = match &commit {
            Some(commit) => (
                self.history
                    .has_ever_succeeded(commit)
                    .await
                    .map_err(unavailable)?,
                self.history
                    .count_status_for_commit_on_branch(commit, &branch, BuildStatus::Failed)
                    .await
                    .map_err(unavailable)?,
            ),
            None => (false, 0),
        };

        let last_passing_commit_for_branch = self
            .history
            .last_passing_build(&branch)
            .await
            .map_err(unavailable)?
            .map(|report| report.commit);

        let trigger = match event {
            Event::BuildReport(report) => match report.status {
                BuildStatus::Failed => TriggerType::BuildFailed,
                BuildStatus::Passed => TriggerType::BuildPassed,
            },
            Event::PullRequestMerged(_) => TriggerType::PullRequestMerged,
            Event::PullRequestCreatedOrUpdated(_) => TriggerType::PullRequestModified,
        };

        let context = EvaluationContext {
            trigger,
            event: Some(event.clone()),
            commit,
            commit_has_ever_succeeded,
            consecutive_failures_on_branch: consecutive_failures(&builds),
            failures_for_commit_on_branch,
            current_branch_status,
            last_passing_commit_for_branch,
            previous_report_status,
            branch,
        };
        debug!(
            branch = %context.branch,
            trigger = ?context.trigger,
            consecutive_failures = context.consecutive_failures_on_branch,
            "Assembled evaluation context"
        );
        Ok(context)
    }

    /// Assemble a context for a scheduled (eventless) evaluation.
    pub async fn build_periodic(&self, branch: &str) -> Result<EvaluationContext> {
        let builds = self
            .history
            .builds_for_branch(branch)
            .await
            .map_err(unavailable)?;

        let current_branch_status = builds
            .first()
            .map(|report| BranchStatus::from(report.status))
            .unwrap_or(BranchStatus::Unknown);

        let last_passing_commit_for_branch = self
            .history
            .last_passing_build(branch)
            .await
            .map_err(unavailable)?
            .map(|report| report.commit);

        Ok(EvaluationContext {
            trigger: TriggerType::RepositoryPeriodic,
            event: None,
            branch: branch.to_string(),
            commit: None,
            commit_has_ever_succeeded: false,
            consecutive_failures_on_branch: consecutive_failures(&builds),
            failures_for_commit_on_branch: 0,
            current_branch_status,
            last_passing_commit_for_branch,
            previous_report_status: None,
        })
    }
}

fn unavailable(err: StoreError) -> WardenError {
    WardenError::HistoryUnavailable(err.to_string())
}

/// Count trailing failures: scan most-recent-backward, counting `Failed`
/// entries until a `Passed` entry or history end.
fn consecutive_failures(builds: &[warden_state::BuildReport]) -> usize {
    builds
        .iter()
        .take_while(|report| report.status == BuildStatus::Failed)
        .count()
}
