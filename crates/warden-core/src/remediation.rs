//! Action execution: dispatch to the SCM backend or notification gateway,
//! with best-effort semantics across a perform partition.

use tracing::{error, info};
use warden_notify::{MessageAttachment, MessageColor, NotificationGateway, OutboundMessage};
use warden_state::{ActionKind, ProposedAction};

use crate::domain::{Result, WardenError};
use crate::scm::RemediationBackend;

/// Result of executing one action: the action plus a success note or the
/// failure that stopped it.
#[derive(Debug)]
pub struct ActionOutcome {
    pub action: ProposedAction,
    pub result: Result<String>,
}

impl ActionOutcome {
    /// Operator-facing summary line.
    pub fn summary(&self) -> String {
        match &self.result {
            Ok(note) => note.clone(),
            Err(err) => format!("Failed to {}: {err}", self.action.describe()),
        }
    }

    pub fn color(&self) -> MessageColor {
        match self.result {
            Ok(_) => MessageColor::Green,
            Err(_) => MessageColor::Red,
        }
    }
}

fn required<'a>(action: &'a ProposedAction, key: &str) -> Result<&'a str> {
    action
        .param(key)
        .ok_or_else(|| WardenError::InvalidAction(format!("{} requires `{key}`", action.kind.name())))
}

/// Execute a single action.
///
/// Revert/lock/rebuild go to the SCM backend; message-producing actions go
/// to the notification gateway. Returns a success note for the operator.
pub async fn execute_action(
    backend: &dyn RemediationBackend,
    gateway: &dyn NotificationGateway,
    action: &ProposedAction,
) -> Result<String> {
    match action.kind {
        ActionKind::RevertCommit => {
            let commit = required(action, "commit")?;
            let branch = required(action, "branch")?;
            let outcome = backend.revert_commit(commit, branch).await?;
            let note = if outcome.pushed {
                format!(
                    "Reverted commit {} on branch {branch} (new commit {})",
                    warden_state::short_commit(commit),
                    warden_state::short_commit(&outcome.new_commit),
                )
            } else {
                format!(
                    "Reverted commit {} on branch {branch} locally (push disabled)",
                    warden_state::short_commit(commit),
                )
            };
            info!("{note}");
            Ok(note)
        }
        ActionKind::LockBranch => {
            let branch = required(action, "branch")?;
            backend.lock_branch(branch).await?;
            let note = format!("Locked branch {branch}");
            info!("{note}");
            Ok(note)
        }
        ActionKind::RebuildBranch => {
            let branch = required(action, "branch")?;
            let build_id = backend.rebuild_branch(branch).await?;
            let note = format!("Triggered rebuild of branch {branch} (build {build_id})");
            info!("{note}");
            Ok(note)
        }
        ActionKind::PostMessage => {
            let channel = required(action, "channel")?;
            let message = required(action, "message")?;
            let color = match action.param("color") {
                Some("red") => MessageColor::Red,
                Some("green") => MessageColor::Green,
                _ => MessageColor::Neutral,
            };
            gateway
                .post(OutboundMessage {
                    channel: channel.to_string(),
                    text: None,
                    attachments: vec![MessageAttachment::plain(message, color)],
                })
                .await?;
            Ok(format!("Posted message to {channel}"))
        }
        ActionKind::ShowText => {
            let channel = action.param("channel").unwrap_or("general").to_string();
            let body = required(action, "body")?;
            let mut attachment = MessageAttachment::plain(body, MessageColor::Neutral);
            attachment.title = action.param("title").map(str::to_string);
            gateway
                .post(OutboundMessage {
                    channel,
                    text: None,
                    attachments: vec![attachment],
                })
                .await?;
            Ok("Posted instructions".to_string())
        }
    }
}

/// Execute a perform partition in order, best-effort.
///
/// One action's failure is recorded and does not block the actions after
/// it; each outcome is reported individually.
pub async fn execute_perform(
    backend: &dyn RemediationBackend,
    gateway: &dyn NotificationGateway,
    actions: &[ProposedAction],
) -> Vec<ActionOutcome> {
    let mut outcomes = Vec::with_capacity(actions.len());
    for action in actions {
        let result = execute_action(backend, gateway, action).await;
        if let Err(err) = &result {
            error!(
                action = action.kind.name(),
                branch = action.param("branch").unwrap_or("unknown"),
                "Perform action failed: {err}"
            );
        }
        outcomes.push(ActionOutcome {
            action: action.clone(),
            result,
        });
    }
    outcomes
}
