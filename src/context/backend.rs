//! Abstraction over the Memory Service's four endpoints.
//!
//! A thin, read-only HTTP-backed query surface with one async method per
//! endpoint. All responses are untrusted input — missing fields default,
//! extra fields are ignored.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::model::{Episode, KnowledgeFact, RecentTurn};

/// Error from a single sub-fetch. Never propagated past the context
/// builder — every variant degrades its field to empty.
#[derive(Debug, Clone)]
pub enum FetchError {
    Timeout,
    Http(String),
    Decode(String),
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[async_trait]
pub trait MemoryBackend: Send + Sync {
    async fn preferences(&self, user_id: &str) -> FetchResult<HashMap<String, Value>>;

    async fn recent_turns(&self, user_id: &str, limit: usize) -> FetchResult<Vec<RecentTurn>>;

    async fn knowledge(&self, user_id: &str, query: &str, k: usize) -> FetchResult<Vec<KnowledgeFact>>;

    async fn episodes(&self, user_id: &str, query_text: &str, n_results: usize) -> FetchResult<Vec<Episode>>;
}
