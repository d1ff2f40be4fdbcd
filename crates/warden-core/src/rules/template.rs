//! Action templates: what a matching rule produces.

use serde::{Deserialize, Serialize};
use tracing::warn;
use warden_state::{ActionKind, Disposition, ProposedAction};

use crate::context::EvaluationContext;

fn suggest() -> Disposition {
    Disposition::Suggest
}

/// A parameterized action a rule proposes when it fires.
///
/// Templates expand against the evaluation context; message and body
/// strings support `{branch}`, `{commit}`, `{short_commit}`, `{build_url}`,
/// `{job_name}`, `{last_passing_commit}` and `{consecutive_failures}`
/// placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionTemplate {
    RevertCommit {
        disposition: Disposition,
    },
    LockBranch {
        disposition: Disposition,
    },
    RebuildBranch {
        disposition: Disposition,
    },
    /// Post a templated message; always executes immediately.
    PostMessage {
        #[serde(default)]
        channel: Option<String>,
        message: String,
        /// "green" or "red"; anything else renders neutral.
        #[serde(default)]
        color: Option<String>,
    },
    ShowText {
        title: String,
        description: String,
        body: String,
        #[serde(default = "suggest")]
        disposition: Disposition,
    },
}

impl ActionTemplate {
    /// Expand into a concrete action, filling parameters from the context.
    ///
    /// Returns `None` (with a warning) when a required context field is
    /// absent — e.g. a revert template firing on a periodic evaluation,
    /// which carries no commit. A skipped template never fails the
    /// evaluation.
    pub fn expand(
        &self,
        context: &EvaluationContext,
        default_channel: &str,
    ) -> Option<ProposedAction> {
        match self {
            ActionTemplate::RevertCommit { disposition } => {
                let Some(commit) = &context.commit else {
                    warn!(branch = %context.branch, "revert template skipped: context has no commit");
                    return None;
                };
                Some(
                    ProposedAction::new(ActionKind::RevertCommit, *disposition)
                        .with_param("commit", commit)
                        .with_param("branch", &context.branch),
                )
            }
            ActionTemplate::LockBranch { disposition } => Some(
                ProposedAction::new(ActionKind::LockBranch, *disposition)
                    .with_param("branch", &context.branch),
            ),
            ActionTemplate::RebuildBranch { disposition } => Some(
                ProposedAction::new(ActionKind::RebuildBranch, *disposition)
                    .with_param("branch", &context.branch),
            ),
            ActionTemplate::PostMessage {
                channel,
                message,
                color,
            } => {
                let mut action =
                    ProposedAction::new(ActionKind::PostMessage, Disposition::Perform)
                        .with_param("channel", channel.as_deref().unwrap_or(default_channel))
                        .with_param("message", render_placeholders(message, context))
                        .with_param("branch", &context.branch);
                if let Some(color) = color {
                    action = action.with_param("color", color);
                }
                Some(action)
            }
            ActionTemplate::ShowText {
                title,
                description,
                body,
                disposition,
            } => Some(
                ProposedAction::new(ActionKind::ShowText, *disposition)
                    .with_param("title", title)
                    .with_param("description", render_placeholders(description, context))
                    .with_param("body", render_placeholders(body, context))
                    .with_param("branch", &context.branch),
            ),
        }
    }
}

/// Substitute `{placeholder}` occurrences with context fields.
pub fn render_placeholders(template: &str, context: &EvaluationContext) -> String {
    let commit = context.commit.as_deref().unwrap_or("");
    let (build_url, job_name) = match &context.event {
        Some(crate::domain::Event::BuildReport(report)) => {
            (report.build_url.as_str(), report.job_name.as_str())
        }
        _ => ("", ""),
    };
    template
        .replace("{branch}", &context.branch)
        .replace("{commit}", commit)
        .replace("{short_commit}", warden_state::short_commit(commit))
        .replace("{build_url}", build_url)
        .replace("{job_name}", job_name)
        .replace(
            "{last_passing_commit}",
            context.last_passing_commit_for_branch.as_deref().unwrap_or("<none>"),
        )
        .replace(
            "{consecutive_failures}",
            &context.consecutive_failures_on_branch.to_string(),
        )
}
