//! The planner's input value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Immutable input to a single `plan()` call, produced by an upstream
/// classifier the core does not implement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentEnvelope {
    pub user_id: String,
    pub intent_name: String,
    pub entities: HashMap<String, Value>,
    pub raw_query: String,
}

/// Full request value accepted by the planner's external interface,
/// wrapping an [`IntentEnvelope`] with the confirmation/cancellation concerns
/// that live outside the pure planning loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(flatten)]
    pub envelope: IntentEnvelope,
    /// Opaque token acknowledging a previously surfaced `RequiresConfirmation`
    /// step, matched against the step's recorded token on resubmission.
    pub confirmation_token: Option<String>,
}

impl PlanRequest {
    pub fn new(envelope: IntentEnvelope) -> Self {
        Self {
            envelope,
            confirmation_token: None,
        }
    }

    /// Validate the shape the upstream classifier is expected to hand us:
    /// non-empty `user_id`, `raw_query` within `1..=4096` chars.
    pub fn validate(&self) -> Result<(), crate::error::CoreError> {
        if self.envelope.user_id.trim().is_empty() {
            return Err(crate::error::CoreError::InvalidRequest(
                "user_id must not be empty".to_owned(),
            ));
        }
        let len = self.envelope.raw_query.chars().count();
        if len == 0 || len > 4096 {
            return Err(crate::error::CoreError::InvalidRequest(format!(
                "raw_query must be 1..=4096 chars, got {len}"
            )));
        }
        Ok(())
    }
}
