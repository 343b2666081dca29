//! The ReAct Planner: drives Thought→Action→Observation to a
//! terminal `ExecutionPlan`, wiring the context builder, tool catalog,
//! LLM adapter, and safety validator together.
//!
//! ```text
//! build_context()
//!       │
//!       ▼
//! loop while iteration < MAX_ITERATIONS:
//!   compose_prompt(scratchpad so far)
//!   llm.generate()  ──timeout──► Failed(LlmError)
//!       │
//!       ▼
//!   parse_llm_output()
//!     Final Answer        → FinalAnswer(text), done
//!     Action(tool, input)  → resolve + extract_parameters + safety.validate()
//!                              Approved/Sanitized/RequiresConfirmation → append step, continue
//!                              Blocked                                 → append Blocked step, continue
//!                              resolver failure                        → record Observation, continue
//!     parse failure        → record Observation, continue
//!   iteration += 1
//! iteration == MAX_ITERATIONS → Failed(IterationLimit)
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};

use super::prompt::{compose_prompt, ScratchpadEntry};
use crate::config::AppConfig;
use crate::context::{ContextBuilder, ContextBuilderConfig, MemoryBackend};
use crate::error::PlanErrorKind;
use crate::llm::provider::{GenerateRequest, LlmProvider};
use crate::model::call::{ConfirmationStatus, StepOutcome};
use crate::model::{ExecutionPlan, PlanRequest, RiskThresholds, ToolCall, ValidationResult};
use crate::safety::{RateLimitConfig, SafetyConfig, SafetyValidator};
use crate::tools::catalog::{SelectorError, ToolCatalog};
use crate::tools::manifest::generate_tool_manifest;

use super::parser::{parse_llm_output, ParsedOutput};

/// Approximate characters-per-token used to translate the adapter's token
/// context window into the prompt composer's character budget.
const CHARS_PER_TOKEN: usize = 4;

pub struct Planner {
    catalog: ToolCatalog,
    llm: Arc<dyn LlmProvider>,
    context_builder: ContextBuilder,
    safety: SafetyValidator,
    config: AppConfig,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmProvider>, memory_backend: Arc<dyn MemoryBackend>, config: AppConfig) -> Self {
        let context_builder = ContextBuilder::new(
            memory_backend,
            ContextBuilderConfig {
                per_fetch_timeout: Duration::from_millis(config.memory.per_fetch_timeout_ms),
                context_deadline: Duration::from_millis(config.memory.context_deadline_ms),
                recent_turns_limit: config.memory.recent_turns_limit,
                knowledge_k: config.memory.knowledge_k,
                episodes_n: config.memory.episodes_n,
            },
        );

        let rate_limits = RateLimitConfig {
            low_per_minute: *config.safety.rate_limits.get("low").unwrap_or(&60),
            medium_per_minute: *config.safety.rate_limits.get("medium").unwrap_or(&30),
            high_per_minute: *config.safety.rate_limits.get("high").unwrap_or(&10),
            critical_per_minute: *config.safety.rate_limits.get("critical").unwrap_or(&1),
            abuse_window: Duration::from_secs(config.safety.abuse_window_secs),
            abuse_max_blocks: config.safety.abuse_max_blocks,
        };

        let safety = SafetyValidator::new(SafetyConfig {
            thresholds: RiskThresholds {
                medium: config.safety.thresholds.0,
                high: config.safety.thresholds.1,
                critical: config.safety.thresholds.2,
            },
            rate_limits,
            allow_http_localhost: config.safety.allow_http_localhost,
            blocked_domains: config.safety.blocked_domains.clone(),
        });

        Self {
            catalog: ToolCatalog::new(),
            llm,
            context_builder,
            safety,
            config,
        }
    }

    /// Drive one request to a terminal `ExecutionPlan`. Infallible at this
    /// boundary: every internal failure is folded into
    /// `ExecutionPlan.error` rather than propagated.
    #[tracing::instrument(
        name = "planner.plan",
        skip_all,
        fields(user_id = %request.envelope.user_id, intent_name = %request.envelope.intent_name)
    )]
    pub async fn plan(&self, request: PlanRequest, cancellation: Option<Arc<AtomicBool>>) -> ExecutionPlan {
        let confirmation_token = request.confirmation_token;
        let envelope = request.envelope;
        let context = self
            .context_builder
            .build_context(&envelope.user_id, &envelope.intent_name, &envelope.entities, &envelope.raw_query)
            .await;
        let tool_manifest = generate_tool_manifest();

        let mut scratchpad: Vec<ScratchpadEntry> = Vec::new();
        let mut steps: Vec<ToolCall> = Vec::new();
        let mut iteration: u32 = 0;

        loop {
            if cancellation.as_ref().is_some_and(|f| f.load(Ordering::SeqCst)) {
                info!(user_id = %envelope.user_id, "plan cancelled");
                return finish(envelope, steps, String::new(), iteration, Some(PlanErrorKind::Cancelled));
            }

            if iteration >= self.config.max_iterations {
                warn!(user_id = %envelope.user_id, iterations = iteration, "iteration limit reached");
                return finish(envelope, steps, String::new(), iteration, Some(PlanErrorKind::IterationLimit));
            }

            let terminal_iteration = iteration + 1 >= self.config.max_iterations;
            let temperature = if terminal_iteration {
                self.config.llm.terminal_temperature
            } else {
                self.config.llm.temperature
            };

            let prompt = compose_prompt(
                &tool_manifest,
                &context,
                &envelope.raw_query,
                &scratchpad,
                self.config.memory.context_char_budget,
                self.llm.context_window() * CHARS_PER_TOKEN,
            );

            let generate_request = GenerateRequest {
                prompt,
                max_tokens: self.config.llm.max_tokens,
                stop: vec!["\nObservation:".to_owned()],
                temperature,
            };

            let call = tokio::time::timeout(
                Duration::from_secs(self.config.llm.per_call_timeout_secs),
                self.llm.generate(generate_request),
            )
            .await;

            let response = match call {
                Ok(Ok(r)) => r,
                Ok(Err(e)) => {
                    error!(user_id = %envelope.user_id, provider = self.llm.provider_name(), error = %e, "LLM adapter error");
                    return finish(envelope, steps, String::new(), iteration, Some(PlanErrorKind::LlmError(e.to_string())));
                }
                Err(_) => {
                    error!(user_id = %envelope.user_id, provider = self.llm.provider_name(), "LLM adapter timed out");
                    return finish(
                        envelope,
                        steps,
                        String::new(),
                        iteration,
                        Some(PlanErrorKind::LlmError("request timed out".to_owned())),
                    );
                }
            };

            match parse_llm_output(&response.text) {
                Ok(ParsedOutput::FinalAnswer { text, .. }) => {
                    iteration += 1;
                    info!(user_id = %envelope.user_id, iterations = iteration, "final answer produced");
                    return finish(envelope, steps, text, iteration, None);
                }
                Ok(ParsedOutput::Action { thought, tool_name, action_input }) => {
                    let entry = self.resolve_action(
                        &envelope.user_id,
                        &envelope.entities,
                        confirmation_token.as_deref(),
                        thought,
                        tool_name,
                        action_input,
                        &mut steps,
                    );
                    scratchpad.push(entry);
                }
                Err(reason) => {
                    warn!(user_id = %envelope.user_id, reason = %reason, "parse error, recovered");
                    scratchpad.push(ScratchpadEntry {
                        thought: None,
                        action: None,
                        action_input: None,
                        observation: format!("Error: {reason}"),
                    });
                }
            }

            iteration += 1;
        }
    }

    /// Resolve one parsed Action against the catalog and safety validator,
    /// appending to `steps` when a ToolCall is accepted (including Blocked,
    /// which is still recorded as a step) and returning the scratchpad entry
    /// that carries the loop's next Observation.
    fn resolve_action(
        &self,
        user_id: &str,
        entities: &HashMap<String, Value>,
        confirmation_token: Option<&str>,
        thought: Option<String>,
        tool_name: String,
        action_input: Value,
        steps: &mut Vec<ToolCall>,
    ) -> ScratchpadEntry {
        let action_input_str = action_input.to_string();

        let Some(tool) = self.catalog.lookup(&tool_name) else {
            return ScratchpadEntry {
                thought,
                action: Some(tool_name.clone()),
                action_input: Some(action_input_str),
                observation: format!("Error: unknown tool '{tool_name}'"),
            };
        };

        let action_input_map = action_input.as_object().map(|m| m.clone().into_iter().collect()).unwrap_or_default();

        let parameters = match self.catalog.extract_parameters(tool, entities, &action_input_map) {
            Ok(p) => p,
            Err(SelectorError::MissingParameters(missing)) => {
                return ScratchpadEntry {
                    thought,
                    action: Some(tool_name),
                    action_input: Some(action_input_str),
                    observation: format!("Error: missing parameters: {}", missing.join(", ")),
                };
            }
        };

        let validation = self.safety.validate(user_id, tool, parameters);

        match validation {
            ValidationResult::Approved { parameters, risk } => {
                let observation = ToolCall::synthesize_observation(tool, &parameters);
                steps.push(ToolCall {
                    tool,
                    parameters,
                    thought: thought.clone().unwrap_or_default(),
                    observation: Some(observation.clone()),
                    sanitized: false,
                    outcome: StepOutcome::Approved,
                    confirmation: ConfirmationStatus::NotRequired,
                    risk,
                });
                ScratchpadEntry { thought, action: Some(tool_name), action_input: Some(action_input_str), observation }
            }
            ValidationResult::Sanitized { parameters, warnings, risk } => {
                let observation = format!("{} ({})", ToolCall::synthesize_observation(tool, &parameters), warnings.join("; "));
                steps.push(ToolCall {
                    tool,
                    parameters,
                    thought: thought.clone().unwrap_or_default(),
                    observation: Some(observation.clone()),
                    sanitized: true,
                    outcome: StepOutcome::Sanitized,
                    confirmation: ConfirmationStatus::NotRequired,
                    risk,
                });
                ScratchpadEntry { thought, action: Some(tool_name), action_input: Some(action_input_str), observation }
            }
            ValidationResult::RequiresConfirmation { parameters, message, risk } => {
                // A caller resubmitting with a confirmation token is taken to
                // confirm every pending step this turn (the core is
                // stateless across calls; matching the token against a
                // specific prior step happens upstream of this crate).
                let confirmed = confirmation_token.is_some();
                let observation = if confirmed {
                    ToolCall::synthesize_observation(tool, &parameters)
                } else {
                    message.clone()
                };
                steps.push(ToolCall {
                    tool,
                    parameters,
                    thought: thought.clone().unwrap_or_default(),
                    observation: Some(observation.clone()),
                    sanitized: false,
                    outcome: StepOutcome::RequiresConfirmation,
                    confirmation: if confirmed { ConfirmationStatus::Confirmed } else { ConfirmationStatus::Pending },
                    risk,
                });
                ScratchpadEntry { thought, action: Some(tool_name), action_input: Some(action_input_str), observation }
            }
            ValidationResult::Blocked { reason, risk } => {
                let observation = format!("Blocked: {reason}");
                steps.push(ToolCall {
                    tool,
                    parameters: HashMap::new(),
                    thought: thought.clone().unwrap_or_default(),
                    observation: Some(observation.clone()),
                    sanitized: false,
                    outcome: StepOutcome::Blocked,
                    confirmation: ConfirmationStatus::NotRequired,
                    risk,
                });
                ScratchpadEntry { thought, action: Some(tool_name), action_input: Some(action_input_str), observation }
            }
        }
    }
}

fn finish(
    envelope: crate::model::IntentEnvelope,
    steps: Vec<ToolCall>,
    final_answer: String,
    iterations: u32,
    error: Option<PlanErrorKind>,
) -> ExecutionPlan {
    let mut plan = ExecutionPlan {
        user_id: envelope.user_id,
        intent_name: envelope.intent_name,
        raw_query: envelope.raw_query,
        steps,
        final_answer,
        iterations,
        success: false,
        error,
    };
    plan.recompute_success();
    plan
}
