//! Inbound event model and trigger categories.

use serde::{Deserialize, Serialize};
use warden_state::{short_commit, BuildReport, BuildStatus, PullRequestMergedEvent};

/// A pull request that was created or updated (not persisted; evaluated
/// only while the triggering request is in flight).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestCreatedOrUpdatedEvent {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub source_branch: String,
    pub target_branch: String,
    pub changed_files: Vec<String>,
}

/// An inbound event from the CI or SCM webhook boundary.
///
/// Immutable once constructed; consumed exactly once by the context
/// builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    BuildReport(BuildReport),
    PullRequestMerged(PullRequestMergedEvent),
    PullRequestCreatedOrUpdated(PullRequestCreatedOrUpdatedEvent),
}

impl Event {
    /// The branch this event concerns (target branch for PR events).
    pub fn branch(&self) -> &str {
        match self {
            Event::BuildReport(report) => &report.branch,
            Event::PullRequestMerged(event) => &event.target_branch,
            Event::PullRequestCreatedOrUpdated(event) => &event.target_branch,
        }
    }

    /// The commit this event concerns, when it has one.
    pub fn commit(&self) -> Option<&str> {
        match self {
            Event::BuildReport(report) => Some(&report.commit),
            Event::PullRequestMerged(event) => Some(&event.merge_commit),
            Event::PullRequestCreatedOrUpdated(_) => None,
        }
    }

    /// Deterministic, human-readable rendering of the event, independent of
    /// which rules end up matching.
    pub fn describe(&self) -> String {
        match self {
            Event::BuildReport(report) => {
                let status = match report.status {
                    BuildStatus::Passed => "passed",
                    BuildStatus::Failed => "failed",
                };
                format!(
                    "Build #{} of {} {} on branch `{}` at commit {}: {}",
                    report.build_number,
                    report.job_name,
                    status,
                    report.branch,
                    report.short_commit(),
                    report.build_url,
                )
            }
            Event::PullRequestMerged(event) => format!(
                "PR #{} \"{}\" by {} merged into `{}` from `{}` at commit {}",
                event.id,
                event.title,
                event.author,
                event.target_branch,
                event.source_branch,
                short_commit(&event.merge_commit),
            ),
            Event::PullRequestCreatedOrUpdated(event) => format!(
                "PR #{} \"{}\" by {} targeting `{}` from `{}` updated ({} changed files)",
                event.id,
                event.title,
                event.author,
                event.target_branch,
                event.source_branch,
                event.changed_files.len(),
            ),
        }
    }
}

/// The category of rule a given event shape activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    BuildFailed,
    BuildPassed,
    BranchStartsFailing,
    BranchStartsPassing,
    PullRequestMerged,
    PullRequestModified,
    RepositoryPeriodic,
}

/// Aggregate branch health derived from the most recent report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    Passed,
    Failed,
    Unknown,
}

impl From<BuildStatus> for BranchStatus {
    fn from(status: BuildStatus) -> Self {
        match status {
            BuildStatus::Passed => BranchStatus::Passed,
            BuildStatus::Failed => BranchStatus::Failed,
        }
    }
}
