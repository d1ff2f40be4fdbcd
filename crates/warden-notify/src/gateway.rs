//! The notification gateway contract and the logging implementation.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::error::NotifyResult;
use crate::message::{MessageRef, OutboundMessage, UpdatedMessage};

/// Posts and updates operator-facing messages.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Post a message, returning a reference usable for later updates.
    async fn post(&self, message: OutboundMessage) -> NotifyResult<MessageRef>;

    /// Replace the content of a previously posted message.
    async fn update(&self, message: UpdatedMessage) -> NotifyResult<()>;
}

/// Gateway that renders messages to the log.
///
/// Returns synthetic message references so callers exercising the update
/// path work unchanged.
#[derive(Debug, Default)]
pub struct TracingGateway;

impl TracingGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationGateway for TracingGateway {
    async fn post(&self, message: OutboundMessage) -> NotifyResult<MessageRef> {
        let text = message.text.as_deref().unwrap_or_default();
        info!(channel = %message.channel, "{text}");
        for attachment in &message.attachments {
            if let Some(title) = &attachment.title {
                info!(channel = %message.channel, "  {title}");
            }
            if let Some(body) = &attachment.text {
                info!(channel = %message.channel, "  {body}");
            }
            for action in &attachment.actions {
                info!(channel = %message.channel, "    [{}]", action.label);
            }
        }
        Ok(MessageRef(Uuid::new_v4().to_string()))
    }

    async fn update(&self, message: UpdatedMessage) -> NotifyResult<()> {
        let text = message.text.as_deref().unwrap_or_default();
        info!(
            channel = %message.channel,
            message_ref = %message.message_ref,
            "(updated) {text}"
        );
        Ok(())
    }
}
