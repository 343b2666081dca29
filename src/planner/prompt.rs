//! Prompt composition: assembles the six
//! ordered sections into a single string, escalating two truncation
//! strategies in turn when the result would exceed the adapter's context
//! budget — scratchpad entries oldest-first, then the context's
//! knowledge/episodes.

use crate::model::Context;

pub const STATIC_PREAMBLE: &str = "\
You are a ReAct-style reasoning agent. At every turn you must either take an \
action or give a final answer. Always end your response with either an \
Action block or a Final Answer line. Never end mid-thought.";

/// One completed (Thought, Action, ActionInput, Observation) cycle of the
/// scratchpad, or a Thought/Observation pair recording a recovered error
/// when no action was accepted.
#[derive(Debug, Clone)]
pub struct ScratchpadEntry {
    pub thought: Option<String>,
    pub action: Option<String>,
    pub action_input: Option<String>,
    pub observation: String,
}

impl ScratchpadEntry {
    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(t) = &self.thought {
            out.push_str(&format!("Thought: {t}\n"));
        }
        if let Some(a) = &self.action {
            out.push_str(&format!("Action: {a}\n"));
        }
        if let Some(ai) = &self.action_input {
            out.push_str(&format!("Action Input: {ai}\n"));
        }
        out.push_str(&format!("Observation: {}\n", self.observation));
        out
    }
}

/// Compose the full prompt for one iteration, truncating to fit
/// `max_chars` (an approximation of the adapter's token budget). The
/// static preamble, tool manifest, raw query, and the most recent
/// scratchpad entry are never dropped.
pub fn compose_prompt(
    tool_manifest: &str,
    context: &Context,
    raw_query: &str,
    scratchpad: &[ScratchpadEntry],
    context_char_budget: usize,
    max_chars: usize,
) -> String {
    let mut budget = context_char_budget;
    let mut kept = scratchpad.len();

    loop {
        let rendered = render(tool_manifest, context, raw_query, &scratchpad[scratchpad.len() - kept..], budget);
        if rendered.chars().count() <= max_chars || (kept <= 1 && budget == 0) {
            return rendered;
        }
        if kept > 1 {
            kept -= 1;
        } else {
            budget = budget / 2;
        }
    }
}

fn render(tool_manifest: &str, context: &Context, raw_query: &str, scratchpad: &[ScratchpadEntry], context_char_budget: usize) -> String {
    let mut out = String::new();
    out.push_str(STATIC_PREAMBLE);
    out.push_str("\n\n");
    out.push_str(tool_manifest);
    out.push('\n');
    out.push_str(&context.render(context_char_budget));
    out.push_str(&format!("## User query\n\n{raw_query}\n\n"));

    if !scratchpad.is_empty() {
        out.push_str("## Scratchpad\n\n");
        for entry in scratchpad {
            out.push_str(&entry.render());
            out.push('\n');
        }
    }

    out.push_str("Thought:");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> ScratchpadEntry {
        ScratchpadEntry {
            thought: Some(format!("thought {n}")),
            action: Some("GET_WEATHER".to_owned()),
            action_input: Some("{}".to_owned()),
            observation: format!("observation {n}"),
        }
    }

    #[test]
    fn includes_all_fixed_sections() {
        let prompt = compose_prompt("## Available Tools\n", &Context::empty(), "hello", &[], 1500, 100_000);
        assert!(prompt.contains(STATIC_PREAMBLE));
        assert!(prompt.contains("## Available Tools"));
        assert!(prompt.contains("hello"));
        assert!(prompt.ends_with("Thought:"));
    }

    #[test]
    fn drops_oldest_scratchpad_entries_first_when_over_budget() {
        let scratchpad: Vec<ScratchpadEntry> = (0..20).map(entry).collect();
        let prompt = compose_prompt("manifest", &Context::empty(), "q", &scratchpad, 1500, 600);
        assert!(!prompt.contains("thought 0"), "oldest entry should have been dropped");
        assert!(prompt.contains("thought 19"), "most recent entry must survive");
    }

    #[test]
    fn never_drops_the_single_most_recent_entry() {
        let scratchpad = vec![entry(0)];
        let prompt = compose_prompt("manifest", &Context::empty(), "q", &scratchpad, 1500, 1);
        assert!(prompt.contains("thought 0"));
    }
}
