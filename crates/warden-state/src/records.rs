//! Persisted record types: build reports, merged pull requests, and the
//! pending action sets awaiting operator confirmation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome reported by the CI backend for a single build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Passed,
    Failed,
}

/// One build outcome on a branch, as reported by the CI webhook.
///
/// `received_at` is assigned at record time and orders the per-branch
/// history (most-recent-first everywhere in the query contract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub job_name: String,
    pub branch: String,
    pub commit: String,
    pub build_number: u32,
    pub status: BuildStatus,
    pub build_url: String,
    pub received_at: DateTime<Utc>,
}

impl BuildReport {
    /// Shortened commit hash for display.
    pub fn short_commit(&self) -> &str {
        short_commit(&self.commit)
    }
}

/// A pull request that was merged into a target branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestMergedEvent {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub source_branch: String,
    pub target_branch: String,
    pub merge_commit: String,
    pub received_at: DateTime<Utc>,
}

/// Shorten a commit hash for display.
pub fn short_commit(commit: &str) -> &str {
    if commit.len() > 8 {
        &commit[..8]
    } else {
        commit
    }
}

/// The category of remediation an action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    RevertCommit,
    LockBranch,
    RebuildBranch,
    PostMessage,
    ShowText,
}

impl ActionKind {
    /// Stable token used to correlate chat callbacks with actions.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::RevertCommit => "revert_commit",
            ActionKind::LockBranch => "lock_branch",
            ActionKind::RebuildBranch => "rebuild_branch",
            ActionKind::PostMessage => "post_message",
            ActionKind::ShowText => "show_text",
        }
    }
}

/// Whether an action executes unconditionally or waits for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Perform,
    Suggest,
}

/// A concrete remediation proposal produced by the rule engine.
///
/// Parameters are filled from the evaluation context when the producing
/// rule fires (`commit`, `branch`, `channel`, `message`, `title`, `body`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedAction {
    pub kind: ActionKind,
    pub disposition: Disposition,
    pub params: BTreeMap<String, String>,
}

impl ProposedAction {
    pub fn new(kind: ActionKind, disposition: Disposition) -> Self {
        Self {
            kind,
            disposition,
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter insertion.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Human phrasing used in confirmation prompts ("Do you want to ...?").
    pub fn describe(&self) -> String {
        let branch = self.param("branch").unwrap_or("unknown");
        match self.kind {
            ActionKind::RevertCommit => {
                let commit = self.param("commit").map(short_commit).unwrap_or("unknown");
                format!("revert commit {commit} on branch {branch}")
            }
            ActionKind::LockBranch => format!("lock branch {branch}"),
            ActionKind::RebuildBranch => format!("rebuild branch {branch}"),
            ActionKind::PostMessage => {
                let channel = self.param("channel").unwrap_or("unknown");
                format!("post a message to {channel}")
            }
            ActionKind::ShowText => self
                .param("description")
                .unwrap_or("show instructions")
                .to_string(),
        }
    }

    /// Short label for the confirmation control.
    pub fn title(&self) -> String {
        match self.kind {
            ActionKind::RevertCommit => "Revert".to_string(),
            ActionKind::LockBranch => "Lock".to_string(),
            ActionKind::RebuildBranch => "Rebuild".to_string(),
            ActionKind::PostMessage => "Post".to_string(),
            ActionKind::ShowText => self.param("title").unwrap_or("Show").to_string(),
        }
    }
}

/// A group of suggested actions awaiting a single operator decision.
///
/// Lifecycle: created by the rule engine → persisted → exactly one action
/// resolved (performed or declined) → the whole set deleted. The `set_id`
/// is a v4 UUID and is treated as unique without a uniqueness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSet {
    pub set_id: String,
    /// Deterministic summary of the triggering event.
    pub description: String,
    /// Channel the suggestion was rendered to.
    pub channel: String,
    pub actions: Vec<ProposedAction>,
    pub created_at: DateTime<Utc>,
}

impl ActionSet {
    pub fn new(description: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            set_id: Uuid::new_v4().to_string(),
            description: description.into(),
            channel: channel.into(),
            actions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Find an action by its callback token.
    pub fn action_by_token(&self, token: &str) -> Option<&ProposedAction> {
        self.actions.iter().find(|a| a.kind.name() == token)
    }
}
