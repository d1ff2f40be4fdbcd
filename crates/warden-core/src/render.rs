//! Rendering analyses and resolutions into the abstract message model.
//!
//! Each suggested action becomes one attachment carrying a confirmation
//! button (value = the action's callback token) and an implicit "No"
//! button. The attachment's `callback_id` is the action-set id, which the
//! chat transport echoes back in callbacks.

use warden_notify::{
    MessageAction, MessageAttachment, MessageColor, MessageRef, OutboundMessage, UpdatedMessage,
};
use warden_state::{ActionSet, ProposedAction};

use crate::domain::Analysis;
use crate::remediation::ActionOutcome;

/// Token posted back when the operator declines.
pub const DECLINE_TOKEN: &str = "no";

fn confirmation_attachment(set: &ActionSet, action: &ProposedAction) -> MessageAttachment {
    let prompt = format!("Do you want to {}?", action.describe());
    MessageAttachment {
        title: Some(prompt.clone()),
        text: action.param("body").map(str::to_string),
        fallback: Some(prompt),
        color: MessageColor::Red,
        callback_id: Some(set.set_id.clone()),
        actions: vec![
            MessageAction {
                token: action.kind.name().to_string(),
                label: action.title(),
                value: action.kind.name().to_string(),
                style: Some("danger".to_string()),
            },
            MessageAction {
                token: DECLINE_TOKEN.to_string(),
                label: "No".to_string(),
                value: DECLINE_TOKEN.to_string(),
                style: None,
            },
        ],
    }
}

/// Attachment summarizing one executed perform action.
pub fn outcome_attachment(outcome: &ActionOutcome) -> MessageAttachment {
    MessageAttachment::plain(outcome.summary(), outcome.color())
}

/// Render an analysis (plus any perform outcomes) into the message posted
/// to the operator channel.
pub fn analysis_message(
    analysis: &Analysis,
    outcomes: &[ActionOutcome],
    channel: &str,
) -> OutboundMessage {
    let mut attachments: Vec<MessageAttachment> =
        outcomes.iter().map(outcome_attachment).collect();

    if let Some(set) = &analysis.action_set {
        attachments.extend(
            set.actions
                .iter()
                .map(|action| confirmation_attachment(set, action)),
        );
    }

    OutboundMessage {
        channel: channel.to_string(),
        text: Some(analysis.description.clone()),
        attachments,
    }
}

/// Render the replacement message for a resolved (or stale) action set.
pub fn resolution_message(
    message_ref: MessageRef,
    channel: &str,
    description: &str,
    resolution: &str,
    color: MessageColor,
) -> UpdatedMessage {
    UpdatedMessage {
        message_ref,
        channel: channel.to_string(),
        text: Some(description.to_string()),
        attachments: vec![MessageAttachment::plain(resolution, color)],
    }
}
