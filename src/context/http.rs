//! HTTP-backed [`MemoryBackend`], the core's only Memory Service client.
//!
//! The `reqwest::Client` is configured with an explicit timeout, a limited
//! redirect policy, and a fixed user agent.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::backend::{FetchError, FetchResult, MemoryBackend};
use crate::model::{Episode, KnowledgeFact, RecentTurn};

/// Memory Service HTTP client, scoped to the four endpoints the core
/// consumes.
pub struct HttpMemoryBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMemoryBackend {
    pub fn new(base_url: impl Into<String>, per_fetch_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(per_fetch_timeout)
            .redirect(Policy::limited(3))
            .user_agent("react-reasoning-core/0.1")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct KnowledgeQuery<'a> {
    user_id: &'a str,
    query: &'a str,
    k: usize,
}

#[derive(Serialize)]
struct EpisodicQuery<'a> {
    user_id: &'a str,
    query_text: &'a str,
    n_results: usize,
}

async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> FetchResult<T> {
    if !resp.status().is_success() {
        return Err(FetchError::Http(format!("status {}", resp.status())));
    }
    resp.json::<T>().await.map_err(|e| FetchError::Decode(e.to_string()))
}

#[async_trait]
impl MemoryBackend for HttpMemoryBackend {
    async fn preferences(&self, user_id: &str) -> FetchResult<HashMap<String, Value>> {
        let resp = self
            .client
            .get(self.url(&format!("/long-term/preferences/{user_id}")))
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        decode(resp).await
    }

    async fn recent_turns(&self, user_id: &str, limit: usize) -> FetchResult<Vec<RecentTurn>> {
        let resp = self
            .client
            .get(self.url(&format!("/short-term/conversation/{user_id}")))
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        decode(resp).await
    }

    async fn knowledge(&self, user_id: &str, query: &str, k: usize) -> FetchResult<Vec<KnowledgeFact>> {
        let resp = self
            .client
            .post(self.url("/long-term/knowledge/query"))
            .json(&KnowledgeQuery { user_id, query, k })
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        decode(resp).await
    }

    async fn episodes(&self, user_id: &str, query_text: &str, n_results: usize) -> FetchResult<Vec<Episode>> {
        let resp = self
            .client
            .post(self.url("/episodic/query"))
            .json(&EpisodicQuery { user_id, query_text, n_results })
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        decode(resp).await
    }
}
