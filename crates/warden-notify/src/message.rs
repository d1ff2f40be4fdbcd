//! Abstract notification message model.
//!
//! Gateways translate these into vendor payloads; interactive buttons carry
//! the action-set correlation id (`callback_id`) and per-action tokens so
//! the chat transport can route operator clicks back to the confirmation
//! workflow.

use serde::{Deserialize, Serialize};

/// Severity colouring for a posted message or attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageColor {
    Green,
    Red,
    Neutral,
}

/// One interactive control rendered with an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAction {
    /// Action token posted back in the callback (`action.kind.name()` or `"no"`).
    pub token: String,
    /// Button label shown to the operator.
    pub label: String,
    /// Value carried in the callback payload.
    pub value: String,
    /// Optional vendor styling hint ("danger" for destructive confirms).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

/// A block of rendered content, optionally interactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAttachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Plain-text fallback for clients that cannot render attachments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    pub color: MessageColor,
    /// Correlation id for interactive callbacks (the ActionSet id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<MessageAction>,
}

impl MessageAttachment {
    /// Plain non-interactive attachment.
    pub fn plain(text: impl Into<String>, color: MessageColor) -> Self {
        Self {
            title: None,
            text: Some(text.into()),
            fallback: None,
            color,
            callback_id: None,
            actions: Vec::new(),
        }
    }
}

/// A message to post to an operator channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<MessageAttachment>,
}

/// Opaque reference to a posted message, used for later updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef(pub String);

impl std::fmt::Display for MessageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Replacement content for an already-posted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedMessage {
    pub message_ref: MessageRef,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<MessageAttachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_are_omitted_from_json() {
        let message = OutboundMessage {
            channel: "general".to_string(),
            text: Some("branch main is failing".to_string()),
            attachments: Vec::new(),
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(!json.contains("attachments"));
    }

    #[test]
    fn attachment_round_trip() {
        let attachment = MessageAttachment {
            title: Some("Do you want to lock branch main?".to_string()),
            text: None,
            fallback: Some("Do you want to lock branch main?".to_string()),
            color: MessageColor::Red,
            callback_id: Some("set-1".to_string()),
            actions: vec![MessageAction {
                token: "lock_branch".to_string(),
                label: "Lock".to_string(),
                value: "lock_branch".to_string(),
                style: Some("danger".to_string()),
            }],
        };
        let json = serde_json::to_string(&attachment).unwrap();
        let back: MessageAttachment = serde_json::from_str(&json).unwrap();
        assert_eq!(attachment, back);
    }
}
