//! A single accepted step of an execution plan.

use super::risk::RiskScore;
use super::tool::ToolType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Confirmation status of a step recorded for a `RequiresConfirmation`
/// outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    /// No confirmation was required for this step.
    NotRequired,
    /// Confirmation is required and has not yet been supplied.
    Pending,
    /// The caller resubmitted with a matching confirmation token.
    Confirmed,
}

/// Why a step did not make it into the accepted plan, or how it was
/// accepted, mirroring the safety validator's `ValidationResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Approved,
    Sanitized,
    RequiresConfirmation,
    Blocked,
}

/// A tool invocation accepted into the scratchpad/plan. Steps only ever
/// enter `ExecutionPlan.steps` after reaching a terminal accepted state
/// (Approved, Sanitized, or RequiresConfirmation) — Blocked steps are still
/// recorded so the invariant "if any step was BLOCKED, success = false"
/// holds, but they carry no executable parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: ToolType,
    pub parameters: HashMap<String, Value>,
    pub thought: String,
    pub observation: Option<String>,
    pub sanitized: bool,
    pub outcome: StepOutcome,
    pub confirmation: ConfirmationStatus,
    pub risk: RiskScore,
}

impl ToolCall {
    /// The canonical observation string synthesized for a resolved tool call.
    pub fn synthesize_observation(tool: ToolType, parameters: &HashMap<String, Value>) -> String {
        let json = serde_json::to_string(parameters).unwrap_or_else(|_| "{}".to_owned());
        format!("{}: executed with parameters {json}", tool.canonical_name())
    }
}
