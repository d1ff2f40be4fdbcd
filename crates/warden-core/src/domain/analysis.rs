//! The unit handed to the notification gateway.

use serde::{Deserialize, Serialize};
use warden_state::ActionSet;

/// Result of evaluating one event: a deterministic description of what
/// happened plus any actions held for confirmation.
///
/// The description is rendered even when no rule fired, so operators always
/// see "what happened".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub description: String,
    pub action_set: Option<ActionSet>,
}

impl Analysis {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            action_set: None,
        }
    }

    /// Whether any action awaits confirmation.
    pub fn has_suggestions(&self) -> bool {
        self.action_set
            .as_ref()
            .map(|set| !set.actions.is_empty())
            .unwrap_or(false)
    }
}
