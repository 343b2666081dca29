//! Tool manifest text for the prompt.
//!
//! The full catalog is always rendered — tools are never filtered by intent,
//! so the planner can recover from a mis-classified intent by picking a tool
//! outside the hinted candidate list.

use crate::model::tool::ToolType;

/// Render the tool manifest section: one block per `ToolType` with its
/// canonical name and one-line description.
pub fn generate_tool_manifest() -> String {
    let mut out = String::from("## Available Tools\n\n");
    out.push_str("To take an action, respond with:\n");
    out.push_str("Thought: <your reasoning>\nAction: <TOOL_NAME>\nAction Input: <JSON object>\n\n");
    out.push_str("To finish, respond with:\n");
    out.push_str("Thought: <your reasoning>\nFinal Answer: <your answer>\n\n");
    out.push_str("---\n\n");

    for tool in ToolType::ALL {
        out.push_str(&format!("- {}: {}\n", tool.canonical_name(), tool.description()));
    }

    out
}

/// Compact one-line listing, useful where token budget is critical.
pub fn generate_tool_summary() -> String {
    let names: Vec<&str> = ToolType::ALL.iter().map(|t| t.canonical_name()).collect();
    format!("Available tools: {}", names.join(", "))
}
