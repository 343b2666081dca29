//! Deterministic [`MemoryBackend`] for tests: nominal payloads, error
//! statuses, delayed responses (to exercise timeouts), and
//! malformed-JSON-equivalent decode failures.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;

use super::backend::{FetchError, FetchResult, MemoryBackend};
use crate::model::{Episode, KnowledgeFact, RecentTurn};

/// Per-endpoint canned outcome.
#[derive(Clone)]
pub enum Scripted<T> {
    Ok(T),
    Err(FetchErrorKind),
    /// Succeeds with `T` but only after `delay` — used to exercise the
    /// per-fetch / total-context timeout.
    Delayed(T, Duration),
}

#[derive(Clone, Debug)]
pub enum FetchErrorKind {
    Timeout,
    Http(String),
    Decode(String),
}

impl From<FetchErrorKind> for FetchError {
    fn from(k: FetchErrorKind) -> Self {
        match k {
            FetchErrorKind::Timeout => FetchError::Timeout,
            FetchErrorKind::Http(m) => FetchError::Http(m),
            FetchErrorKind::Decode(m) => FetchError::Decode(m),
        }
    }
}

/// A `MemoryBackend` whose four endpoints are individually scripted.
pub struct ScriptedMemoryBackend {
    pub preferences: Scripted<HashMap<String, Value>>,
    pub recent_turns: Scripted<Vec<RecentTurn>>,
    pub knowledge: Scripted<Vec<KnowledgeFact>>,
    pub episodes: Scripted<Vec<Episode>>,
}

impl ScriptedMemoryBackend {
    /// All four endpoints return nominal, empty payloads.
    pub fn nominal_empty() -> Self {
        Self {
            preferences: Scripted::Ok(HashMap::new()),
            recent_turns: Scripted::Ok(Vec::new()),
            knowledge: Scripted::Ok(Vec::new()),
            episodes: Scripted::Ok(Vec::new()),
        }
    }

    /// All four endpoints return a 503-equivalent error.
    pub fn all_unavailable() -> Self {
        Self {
            preferences: Scripted::Err(FetchErrorKind::Http("503 Service Unavailable".to_owned())),
            recent_turns: Scripted::Err(FetchErrorKind::Http("503 Service Unavailable".to_owned())),
            knowledge: Scripted::Err(FetchErrorKind::Http("503 Service Unavailable".to_owned())),
            episodes: Scripted::Err(FetchErrorKind::Http("503 Service Unavailable".to_owned())),
        }
    }
}

async fn resolve<T: Clone>(s: &Scripted<T>) -> FetchResult<T> {
    match s {
        Scripted::Ok(v) => Ok(v.clone()),
        Scripted::Err(e) => Err(e.clone().into()),
        Scripted::Delayed(v, d) => {
            sleep(*d).await;
            Ok(v.clone())
        }
    }
}

#[async_trait]
impl MemoryBackend for ScriptedMemoryBackend {
    async fn preferences(&self, _user_id: &str) -> FetchResult<HashMap<String, Value>> {
        resolve(&self.preferences).await
    }

    async fn recent_turns(&self, _user_id: &str, _limit: usize) -> FetchResult<Vec<RecentTurn>> {
        resolve(&self.recent_turns).await
    }

    async fn knowledge(&self, _user_id: &str, _query: &str, _k: usize) -> FetchResult<Vec<KnowledgeFact>> {
        resolve(&self.knowledge).await
    }

    async fn episodes(&self, _user_id: &str, _query_text: &str, _n_results: usize) -> FetchResult<Vec<Episode>> {
        resolve(&self.episodes).await
    }
}
