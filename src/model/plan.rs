//! The planner's output value.

use super::call::ToolCall;
use crate::error::PlanErrorKind;
use serde::{Deserialize, Serialize};

/// The final state of a single `plan()` call, terminal in both the
/// `FinalAnswer` and `Failed` cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub user_id: String,
    pub intent_name: String,
    pub raw_query: String,
    pub steps: Vec<ToolCall>,
    pub final_answer: String,
    pub iterations: u32,
    pub success: bool,
    pub error: Option<PlanErrorKind>,
}

impl ExecutionPlan {
    /// `success` requires: terminated with a Final Answer, no step Blocked,
    /// and every RequiresConfirmation step carries a valid confirmation
    /// token (surfaced here as `ConfirmationStatus::Confirmed`).
    pub fn recompute_success(&mut self) {
        use super::call::{ConfirmationStatus, StepOutcome};

        if self.error.is_some() {
            self.success = false;
            return;
        }
        if self.final_answer.is_empty() {
            self.success = false;
            return;
        }
        let any_blocked = self.steps.iter().any(|s| s.outcome == StepOutcome::Blocked);
        let any_unconfirmed = self
            .steps
            .iter()
            .any(|s| s.confirmation == ConfirmationStatus::Pending);
        self.success = !any_blocked && !any_unconfirmed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::call::{ConfirmationStatus, StepOutcome};
    use crate::model::risk::{RiskContributions, RiskScore, RiskThresholds};
    use crate::model::tool::ToolType;
    use std::collections::HashMap;

    fn dummy_step(outcome: StepOutcome, confirmation: ConfirmationStatus) -> ToolCall {
        ToolCall {
            tool: ToolType::GetWeather,
            parameters: HashMap::new(),
            thought: "thinking".to_owned(),
            observation: None,
            sanitized: false,
            outcome,
            confirmation,
            risk: RiskScore::compute(
                RiskContributions { tool: 0.1, parameters: 0.0, context: 0.0 },
                RiskThresholds::default(),
            ),
        }
    }

    #[test]
    fn success_requires_nonempty_final_answer() {
        let mut plan = ExecutionPlan {
            user_id: "u".into(),
            intent_name: "i".into(),
            raw_query: "q".into(),
            steps: vec![],
            final_answer: String::new(),
            iterations: 1,
            success: true,
            error: None,
        };
        plan.recompute_success();
        assert!(!plan.success);
    }

    #[test]
    fn success_false_when_any_step_blocked() {
        let mut plan = ExecutionPlan {
            user_id: "u".into(),
            intent_name: "i".into(),
            raw_query: "q".into(),
            steps: vec![dummy_step(StepOutcome::Blocked, ConfirmationStatus::NotRequired)],
            final_answer: "done".into(),
            iterations: 1,
            success: true,
            error: None,
        };
        plan.recompute_success();
        assert!(!plan.success);
    }

    #[test]
    fn success_false_when_confirmation_pending() {
        let mut plan = ExecutionPlan {
            user_id: "u".into(),
            intent_name: "i".into(),
            raw_query: "q".into(),
            steps: vec![dummy_step(StepOutcome::RequiresConfirmation, ConfirmationStatus::Pending)],
            final_answer: "done".into(),
            iterations: 1,
            success: true,
            error: None,
        };
        plan.recompute_success();
        assert!(!plan.success);
    }

    #[test]
    fn success_true_when_confirmed_and_no_blocks() {
        let mut plan = ExecutionPlan {
            user_id: "u".into(),
            intent_name: "i".into(),
            raw_query: "q".into(),
            steps: vec![dummy_step(StepOutcome::Approved, ConfirmationStatus::NotRequired)],
            final_answer: "done".into(),
            iterations: 1,
            success: false,
            error: None,
        };
        plan.recompute_success();
        assert!(plan.success);
    }
}
