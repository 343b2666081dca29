//! Context Builder: four concurrent Memory Service fetches joined
//! with a per-fetch and a total deadline. Never fails — every sub-fetch
//! degrades to an empty field plus a logged warning on error or timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::backend::MemoryBackend;
use crate::model::Context;

#[derive(Debug, Clone, Copy)]
pub struct ContextBuilderConfig {
    pub per_fetch_timeout: Duration,
    pub context_deadline: Duration,
    pub recent_turns_limit: usize,
    pub knowledge_k: usize,
    pub episodes_n: usize,
}

impl Default for ContextBuilderConfig {
    fn default() -> Self {
        Self {
            per_fetch_timeout: Duration::from_secs(2),
            context_deadline: Duration::from_secs(3),
            recent_turns_limit: 5,
            knowledge_k: 5,
            episodes_n: 3,
        }
    }
}

pub struct ContextBuilder {
    backend: Arc<dyn MemoryBackend>,
    config: ContextBuilderConfig,
}

impl ContextBuilder {
    pub fn new(backend: Arc<dyn MemoryBackend>, config: ContextBuilderConfig) -> Self {
        Self { backend, config }
    }

    /// Assemble a `Context` for `user_id`. Spawns four independent fetches,
    /// joins with the configured deadlines, and synthesizes empty for
    /// whichever did not complete in time or failed.
    pub async fn build_context(
        &self,
        user_id: &str,
        _intent_name: &str,
        _entities: &HashMap<String, serde_json::Value>,
        raw_query: &str,
    ) -> Context {
        let per_fetch = self.config.per_fetch_timeout;

        let preferences_fut = tokio::time::timeout(per_fetch, self.backend.preferences(user_id));
        let recent_turns_fut = tokio::time::timeout(
            per_fetch,
            self.backend.recent_turns(user_id, self.config.recent_turns_limit),
        );
        let knowledge_fut = tokio::time::timeout(
            per_fetch,
            self.backend.knowledge(user_id, raw_query, self.config.knowledge_k),
        );
        let episodes_fut = tokio::time::timeout(
            per_fetch,
            self.backend.episodes(user_id, raw_query, self.config.episodes_n),
        );

        let joined = tokio::time::timeout(
            self.config.context_deadline,
            async { tokio::join!(preferences_fut, recent_turns_fut, knowledge_fut, episodes_fut) },
        )
        .await;

        let (preferences_res, recent_turns_res, knowledge_res, episodes_res) = match joined {
            Ok(tuple) => tuple,
            Err(_) => {
                warn!(user_id, "context build exceeded total deadline; returning empty context");
                return Context::empty();
            }
        };

        let preferences = preferences_res
            .ok()
            .and_then(|r| r.ok())
            .unwrap_or_else(|| {
                warn!(user_id, "preferences fetch degraded to empty");
                HashMap::new()
            });

        let recent_turns = recent_turns_res.ok().and_then(|r| r.ok()).unwrap_or_else(|| {
            warn!(user_id, "recent_turns fetch degraded to empty");
            Vec::new()
        });

        let knowledge = knowledge_res.ok().and_then(|r| r.ok()).unwrap_or_else(|| {
            warn!(user_id, "knowledge fetch degraded to empty");
            Vec::new()
        });

        let episodes = episodes_res.ok().and_then(|r| r.ok()).unwrap_or_else(|| {
            warn!(user_id, "episodes fetch degraded to empty");
            Vec::new()
        });

        Context {
            preferences,
            recent_turns,
            knowledge,
            episodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::mock::ScriptedMemoryBackend;
    use crate::model::{Episode, KnowledgeFact, RecentTurn};
    use std::collections::HashMap;

    fn config() -> ContextBuilderConfig {
        ContextBuilderConfig {
            per_fetch_timeout: Duration::from_millis(200),
            context_deadline: Duration::from_millis(300),
            ..ContextBuilderConfig::default()
        }
    }

    #[tokio::test]
    async fn nominal_empty_backend_yields_empty_context() {
        let backend = Arc::new(ScriptedMemoryBackend::nominal_empty());
        let builder = ContextBuilder::new(backend, config());
        let ctx = builder.build_context("u1", "get_weather", &HashMap::new(), "hi").await;
        assert!(ctx.preferences.is_empty());
        assert!(ctx.recent_turns.is_empty());
    }

    #[tokio::test]
    async fn all_unavailable_degrades_to_empty_not_error() {
        let backend = Arc::new(ScriptedMemoryBackend::all_unavailable());
        let builder = ContextBuilder::new(backend, config());
        let ctx = builder.build_context("u1", "get_weather", &HashMap::new(), "hi").await;
        assert!(ctx.preferences.is_empty());
        assert!(ctx.knowledge.is_empty());
        assert!(ctx.episodes.is_empty());
    }

    #[tokio::test]
    async fn slow_fetch_times_out_and_others_still_populate() {
        use crate::context::mock::Scripted;

        let backend = Arc::new(ScriptedMemoryBackend {
            preferences: Scripted::Delayed(HashMap::new(), Duration::from_secs(10)),
            recent_turns: Scripted::Ok(vec![RecentTurn {
                role: "user".into(),
                content: "hi".into(),
                timestamp: "t".into(),
            }]),
            knowledge: Scripted::Ok(vec![KnowledgeFact { text: "fact".into(), relevance: 0.9 }]),
            episodes: Scripted::Ok(vec![Episode {
                text: "episode".into(),
                timestamp: "t".into(),
                similarity: 0.5,
            }]),
        });
        let builder = ContextBuilder::new(backend, config());
        let ctx = builder.build_context("u1", "get_weather", &HashMap::new(), "hi").await;
        assert!(ctx.preferences.is_empty(), "slow fetch should degrade to empty");
        assert_eq!(ctx.recent_turns.len(), 1);
        assert_eq!(ctx.knowledge.len(), 1);
        assert_eq!(ctx.episodes.len(), 1);
    }
}
