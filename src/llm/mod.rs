//! LLM Adapter.

pub mod mock;
pub mod provider;

pub use mock::ScriptedLlm;
pub use provider::{GenerateRequest, GenerateResponse, LlmError, LlmProvider};
