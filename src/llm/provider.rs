//! The LLM Adapter: the single-request interface between planner and
//! language model.

use async_trait::async_trait;
use thiserror::Error;

/// A single completion request. The planner controls retries and timeouts;
/// the adapter itself never retries internally.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub stop: Vec<String>,
    /// Sampling temperature: 0.7 by default, lowered to 0.2 on the terminal
    /// "produce Final Answer" iteration.
    pub temperature: f32,
}

/// The adapter's response: generated text plus token accounting.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub text: String,
    pub tokens_used: u32,
}

/// Adapter-level failure, as a `thiserror` enum rather than a bare `String`
/// so the planner can distinguish a timeout (recoverable by the caller's
/// deadline accounting) from a hard backend error — the same distinction
/// `CoreError`/`PlanErrorKind::LlmError` need at the call site.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request timed out")]
    Timeout,
    #[error("LLM backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

/// Trait for LLM backends. The core is agnostic to local vs remote
/// inference — any backend satisfying this call shape is acceptable.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt. Guarantees: stop-sequence trimming, UTF-8 safety.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Context window size in tokens, used by the planner's prompt
    /// truncation logic to derive its character budget.
    fn context_window(&self) -> usize;

    /// Backend identifier, for logging.
    fn provider_name(&self) -> &str;
}

/// Trim a generated response at the first occurrence of any stop sequence,
/// applied by adapter implementations to satisfy the "stop-sequence
/// trimming" guarantee without duplicating the logic per backend.
pub fn trim_at_stop_sequences(text: &str, stop: &[String]) -> String {
    let mut end = text.len();
    for s in stop {
        if s.is_empty() {
            continue;
        }
        if let Some(idx) = text.find(s.as_str()) {
            end = end.min(idx);
        }
    }
    // `find` operates on byte offsets; `end` is always a boundary returned by
    // `find` or the original length, both valid UTF-8 boundaries.
    text[..end].to_owned()
}
