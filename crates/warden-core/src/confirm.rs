//! Confirmation workflow: resolves suggested action sets from operator
//! callbacks.
//!
//! The store's atomic `take` is the commit point: the set is removed before
//! any execution is attempted, so of two near-simultaneous callbacks for
//! the same set exactly one proceeds and the other observes an absent set.
//! At most one action per set is ever executed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use warden_notify::{MessageColor, MessageRef, NotificationGateway};
use warden_state::PendingActionStore;

use crate::domain::{Result, WardenError};
use crate::remediation::execute_action;
use crate::render;
use crate::scm::RemediationBackend;

/// An interactive callback relayed by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCallback {
    /// Correlation id: the ActionSet this click belongs to.
    pub action_set_id: String,
    /// Token of the clicked control (an action kind name, or "no").
    pub action_token: String,
    /// False when the operator clicked the decline control.
    pub confirmed: bool,
    /// Channel the original message was posted to.
    pub channel: String,
    /// Reference to the rendered message, for the outcome update.
    pub message_ref: Option<MessageRef>,
}

/// Terminal state of a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The confirmed action executed successfully.
    Performed { note: String },
    /// The confirmed action executed and failed; the set is still resolved.
    Failed { error: String },
    /// The operator declined, or the token matched no action in the set.
    Declined,
    /// The set was already resolved (double-click or late click).
    AlreadyHandled,
}

/// Drives action sets from suggested to resolved.
pub struct ConfirmationWorkflow {
    pending: Arc<dyn PendingActionStore>,
    backend: Arc<dyn RemediationBackend>,
    gateway: Arc<dyn NotificationGateway>,
}

impl ConfirmationWorkflow {
    pub fn new(
        pending: Arc<dyn PendingActionStore>,
        backend: Arc<dyn RemediationBackend>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            pending,
            backend,
            gateway,
        }
    }

    /// Resolve one callback.
    ///
    /// Whatever the resolution, the set is deleted from the store before
    /// this method returns; execution is attempted only after the set has
    /// been taken.
    pub async fn handle(&self, callback: ActionCallback) -> Result<CallbackOutcome> {
        let Some(set) = self.pending.take(&callback.action_set_id).await? else {
            // Expected after a double-click, or when another action in the
            // same set was already resolved.
            let stale = WardenError::UnknownActionSet(callback.action_set_id.clone());
            info!("{stale} - answering as already handled");
            self.update_message(&callback, "(unknown)", "Already handled", MessageColor::Neutral)
                .await;
            return Ok(CallbackOutcome::AlreadyHandled);
        };

        if !callback.confirmed {
            info!(set_id = %set.set_id, "Operator declined suggested actions");
            self.update_message(&callback, &set.description, "Declined", MessageColor::Neutral)
                .await;
            return Ok(CallbackOutcome::Declined);
        }

        let Some(action) = set.action_by_token(&callback.action_token) else {
            warn!(
                set_id = %set.set_id,
                token = %callback.action_token,
                "Confirmed token matches no action in set - treating as declined"
            );
            self.update_message(&callback, &set.description, "Declined", MessageColor::Neutral)
                .await;
            return Ok(CallbackOutcome::Declined);
        };

        info!(set_id = %set.set_id, action = action.kind.name(), "Executing confirmed action");
        match execute_action(self.backend.as_ref(), self.gateway.as_ref(), action).await {
            Ok(note) => {
                self.update_message(&callback, &set.description, &note, MessageColor::Green)
                    .await;
                Ok(CallbackOutcome::Performed { note })
            }
            Err(err) => {
                let error = format!("Failed to {}: {err}", action.describe());
                warn!(set_id = %set.set_id, "{error}");
                self.update_message(&callback, &set.description, &error, MessageColor::Red)
                    .await;
                Ok(CallbackOutcome::Failed { error })
            }
        }
    }

    /// Update the rendered message; a gateway failure here must not mask
    /// the resolution itself.
    async fn update_message(
        &self,
        callback: &ActionCallback,
        description: &str,
        resolution: &str,
        color: MessageColor,
    ) {
        let Some(message_ref) = &callback.message_ref else {
            return;
        };
        let update = render::resolution_message(
            message_ref.clone(),
            &callback.channel,
            description,
            resolution,
            color,
        );
        if let Err(err) = self.gateway.update(update).await {
            warn!("Failed to update rendered message: {err}");
        }
    }
}
