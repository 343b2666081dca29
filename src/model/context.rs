//! The `Context` value assembled by the context builder.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One turn of prior conversation, as returned by the short-term memory
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentTurn {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

/// A retrieved fact from the long-term knowledge store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFact {
    pub text: String,
    pub relevance: f64,
}

/// A semantically-retrieved past episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub text: String,
    pub timestamp: String,
    pub similarity: f64,
}

/// Per-request context assembled from the Memory Service. Every field may be
/// empty; a `Context` is always structurally valid even when every fetch
/// degraded to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    pub preferences: HashMap<String, Value>,
    pub recent_turns: Vec<RecentTurn>,
    pub knowledge: Vec<KnowledgeFact>,
    pub episodes: Vec<Episode>,
}

impl Context {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Render the context block for the prompt, truncating
    /// `knowledge`/`episodes` to `char_budget` combined using a
    /// longest-first drop policy.
    pub fn render(&self, char_budget: usize) -> String {
        let mut out = String::new();

        out.push_str("## Context\n\n");

        if !self.preferences.is_empty() {
            out.push_str("Preferences:\n");
            let mut keys: Vec<&String> = self.preferences.keys().collect();
            keys.sort();
            for k in keys {
                out.push_str(&format!("- {k}: {}\n", self.preferences[k]));
            }
            out.push('\n');
        }

        if !self.recent_turns.is_empty() {
            out.push_str("Recent turns:\n");
            for t in &self.recent_turns {
                out.push_str(&format!("- [{}] {}: {}\n", t.timestamp, t.role, t.content));
            }
            out.push('\n');
        }

        let (knowledge, episodes) = truncate_to_budget(&self.knowledge, &self.episodes, char_budget);

        if !knowledge.is_empty() {
            out.push_str("Knowledge:\n");
            for k in &knowledge {
                out.push_str(&format!("- ({:.2}) {}\n", k.relevance, k.text));
            }
            out.push('\n');
        }

        if !episodes.is_empty() {
            out.push_str("Episodes:\n");
            for e in &episodes {
                out.push_str(&format!("- [{}] ({:.2}) {}\n", e.timestamp, e.similarity, e.text));
            }
            out.push('\n');
        }

        out
    }
}

/// Drop the longest knowledge/episode entries first until the combined text
/// length of what remains fits `char_budget`. Knowledge and episodes are
/// trimmed together, longest-first, irrespective of which list an entry
/// belongs to.
fn truncate_to_budget(
    knowledge: &[KnowledgeFact],
    episodes: &[Episode],
    char_budget: usize,
) -> (Vec<KnowledgeFact>, Vec<Episode>) {
    enum Entry<'a> {
        K(&'a KnowledgeFact),
        E(&'a Episode),
    }

    let mut entries: Vec<Entry> = knowledge
        .iter()
        .map(Entry::K)
        .chain(episodes.iter().map(Entry::E))
        .collect();

    let len = |e: &Entry| -> usize {
        match e {
            Entry::K(k) => k.text.chars().count(),
            Entry::E(e) => e.text.chars().count(),
        }
    };

    let mut total: usize = entries.iter().map(len).sum();
    // Drop longest-first while over budget, keeping relative order of the
    // survivors stable for rendering.
    entries.sort_by(|a, b| len(b).cmp(&len(a)));
    let mut dropped = std::collections::HashSet::new();
    for (i, e) in entries.iter().enumerate() {
        if total <= char_budget {
            break;
        }
        total -= len(e);
        dropped.insert(i);
    }

    let mut kept_k = Vec::new();
    let mut kept_e = Vec::new();
    for (i, e) in entries.into_iter().enumerate() {
        if dropped.contains(&i) {
            continue;
        }
        match e {
            Entry::K(k) => kept_k.push(k.clone()),
            Entry::E(e) => kept_e.push(e.clone()),
        }
    }
    // Restore original relative order (knowledge before episodes, each in
    // its own original sequence) since the drop pass reordered by length.
    let kept_k: Vec<KnowledgeFact> = knowledge.iter().filter(|k| kept_k.iter().any(|x| x.text == k.text)).cloned().collect();
    let kept_e: Vec<Episode> = episodes.iter().filter(|e| kept_e.iter().any(|x| x.text == e.text)).cloned().collect();
    (kept_k, kept_e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_is_structurally_valid() {
        let ctx = Context::empty();
        assert!(ctx.preferences.is_empty());
        assert!(ctx.recent_turns.is_empty());
        let rendered = ctx.render(1500);
        assert!(rendered.contains("## Context"));
    }

    #[test]
    fn truncation_drops_longest_entries_first() {
        let knowledge = vec![
            KnowledgeFact { text: "a".repeat(1000), relevance: 0.9 },
            KnowledgeFact { text: "short".to_owned(), relevance: 0.5 },
        ];
        let episodes = vec![];
        let (k, _) = truncate_to_budget(&knowledge, &episodes, 100);
        assert_eq!(k.len(), 1);
        assert_eq!(k[0].text, "short");
    }

    #[test]
    fn truncation_keeps_everything_under_budget() {
        let knowledge = vec![KnowledgeFact { text: "short".to_owned(), relevance: 0.5 }];
        let episodes = vec![Episode { text: "also short".to_owned(), timestamp: "t".to_owned(), similarity: 0.1 }];
        let (k, e) = truncate_to_budget(&knowledge, &episodes, 1500);
        assert_eq!(k.len(), 1);
        assert_eq!(e.len(), 1);
    }
}
