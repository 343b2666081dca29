//! A deterministic, script-driven [`LlmProvider`] for tests.
//!
//! A test-only backend that makes the surrounding component (here, the
//! whole planner loop) deterministically testable without a network call.

use super::provider::{trim_at_stop_sequences, GenerateRequest, GenerateResponse, LlmError, LlmProvider, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Replays a fixed sequence of responses, one per call. Used to drive the
/// seed scenarios deterministically: call N of the planner loop gets
/// script entry N.
pub struct ScriptedLlm {
    script: Vec<String>,
    cursor: AtomicUsize,
    context_window: usize,
}

impl ScriptedLlm {
    pub fn new(script: Vec<&str>) -> Self {
        Self {
            script: script.into_iter().map(str::to_owned).collect(),
            cursor: AtomicUsize::new(0),
            context_window: 4096,
        }
    }

    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    pub fn calls_made(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst);
        let text = self
            .script
            .get(idx)
            .cloned()
            .ok_or_else(|| LlmError::Backend(format!("script exhausted at call {idx}")))?;
        let trimmed = trim_at_stop_sequences(&text, &request.stop);
        Ok(GenerateResponse {
            tokens_used: trimmed.split_whitespace().count() as u32,
            text: trimmed,
        })
    }

    fn context_window(&self) -> usize {
        self.context_window
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            prompt: prompt.to_owned(),
            max_tokens: 512,
            stop: vec![],
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn replays_script_in_order() {
        let llm = ScriptedLlm::new(vec!["first", "second"]);
        let r1 = llm.generate(req("p")).await.unwrap();
        assert_eq!(r1.text, "first");
        let r2 = llm.generate(req("p")).await.unwrap();
        assert_eq!(r2.text, "second");
    }

    #[tokio::test]
    async fn exhausted_script_is_backend_error() {
        let llm = ScriptedLlm::new(vec!["only"]);
        llm.generate(req("p")).await.unwrap();
        let err = llm.generate(req("p")).await.unwrap_err();
        assert!(matches!(err, LlmError::Backend(_)));
    }

    #[test]
    fn with_context_window_overrides_the_default() {
        let llm = ScriptedLlm::new(vec!["x"]);
        assert_eq!(llm.context_window(), 4096);
        let llm = llm.with_context_window(256);
        assert_eq!(llm.context_window(), 256);
    }
}
