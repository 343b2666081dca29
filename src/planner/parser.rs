//! Output grammar parser: turns one LLM response into a
//! [`ParsedOutput`]. Two encodings are accepted — the line-oriented
//! `Thought:/Action:/Action Input:` grammar, and a structured
//! `{"tool": ..., "arguments": ...}` JSON block (optionally fenced or
//! wrapped in `<tool_call>` tags) for backends that prefer function-call
//! style output.

use serde_json::Value;

/// A successfully parsed LLM turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedOutput {
    FinalAnswer {
        thought: Option<String>,
        text: String,
    },
    Action {
        thought: Option<String>,
        tool_name: String,
        action_input: Value,
    },
}

/// Parse a single LLM response. Returns `Err` with a human-readable reason
/// on anything that matches neither accepted encoding; the planner turns
/// this into a recorded Observation, not a fatal error.
pub fn parse_llm_output(response: &str) -> Result<ParsedOutput, String> {
    match parse_line_grammar(response) {
        LineGrammarResult::Matched(result) => return result,
        LineGrammarResult::NoMarker => {}
    }

    parse_structured_json(response)
        .ok_or_else(|| "response matched neither the ReAct line grammar nor a structured tool call".to_owned())
}

enum LineGrammarResult {
    /// An `Action:`/`Final Answer:` marker was found; its own parse result
    /// (success or decode failure) is final — no fallback to JSON scanning.
    Matched(Result<ParsedOutput, String>),
    NoMarker,
}

fn is_marker_line(line: &str) -> bool {
    let t = line.trim();
    t.starts_with("Thought:") || t.starts_with("Action:") || t.starts_with("Action Input:") || t.starts_with("Final Answer:")
}

fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.strip_prefix(marker).map(str::trim_start)
}

fn collect_block(lines: &[&str], start: usize, first_line_rest: &str) -> (String, usize) {
    let mut buf = first_line_rest.to_owned();
    let mut i = start;
    while i < lines.len() && !is_marker_line(lines[i]) {
        buf.push('\n');
        buf.push_str(lines[i]);
        i += 1;
    }
    (buf.trim().to_owned(), i)
}

fn parse_line_grammar(response: &str) -> LineGrammarResult {
    let lines: Vec<&str> = response.lines().collect();
    let mut thought = None;
    let mut i = 0;

    if let Some(first) = lines.first() {
        if let Some(rest) = strip_marker(first.trim(), "Thought:") {
            let (text, next) = collect_block(&lines, 1, rest);
            thought = Some(text);
            i = next;
        }
    }

    while i < lines.len() {
        let trimmed = lines[i].trim();

        if let Some(rest) = strip_marker(trimmed, "Final Answer:") {
            let (text, _) = collect_block(&lines, i + 1, rest);
            return LineGrammarResult::Matched(Ok(ParsedOutput::FinalAnswer { thought, text }));
        }

        if let Some(rest) = strip_marker(trimmed, "Action:") {
            let tool_name = rest.trim().to_owned();
            let mut j = i + 1;
            while j < lines.len() {
                let t2 = lines[j].trim();
                if let Some(rest2) = strip_marker(t2, "Action Input:") {
                    let (body, _) = collect_block(&lines, j + 1, rest2);
                    return LineGrammarResult::Matched(
                        serde_json::from_str::<Value>(&body)
                            .map_err(|e| format!("Action Input is not valid JSON: {e}"))
                            .map(|action_input| ParsedOutput::Action {
                                thought: thought.clone(),
                                tool_name: tool_name.clone(),
                                action_input,
                            }),
                    );
                }
                j += 1;
            }
            return LineGrammarResult::Matched(Err("Action line with no following Action Input".to_owned()));
        }

        i += 1;
    }

    LineGrammarResult::NoMarker
}

fn parse_structured_json(response: &str) -> Option<ParsedOutput> {
    for candidate in candidate_json_blocks(response) {
        if let Some(parsed) = try_parse_tool_json(&candidate) {
            return Some(parsed);
        }
    }
    None
}

fn candidate_json_blocks(response: &str) -> Vec<String> {
    let mut candidates = vec![response.trim().to_owned()];
    candidates.extend(extract_between(response, "```json", "```"));
    candidates.extend(extract_between(response, "```", "```"));
    candidates.extend(extract_between(response, "<tool_call>", "</tool_call>"));
    candidates
}

fn extract_between(text: &str, open: &str, close: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut remaining = text;
    while let Some(start) = remaining.find(open) {
        remaining = &remaining[start + open.len()..];
        let Some(end) = remaining.find(close) else { break };
        out.push(remaining[..end].trim().to_owned());
        remaining = &remaining[end + close.len()..];
    }
    out
}

fn try_parse_tool_json(body: &str) -> Option<ParsedOutput> {
    let obj: Value = serde_json::from_str(body).ok()?;
    let tool_name = obj.get("tool")?.as_str()?.to_owned();
    let action_input = obj.get("arguments").cloned().unwrap_or_else(|| Value::Object(Default::default()));
    Some(ParsedOutput::Action { thought: None, tool_name, action_input })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_final_answer() {
        let response = "Thought: I have enough information.\nFinal Answer: It is sunny in Paris.";
        let parsed = parse_llm_output(response).unwrap();
        assert_eq!(
            parsed,
            ParsedOutput::FinalAnswer {
                thought: Some("I have enough information.".to_owned()),
                text: "It is sunny in Paris.".to_owned(),
            }
        );
    }

    #[test]
    fn parses_action_with_json_object() {
        let response = "Thought: need weather\nAction: GET_WEATHER\nAction Input: {\"location\": \"Paris\"}";
        let parsed = parse_llm_output(response).unwrap();
        assert_eq!(
            parsed,
            ParsedOutput::Action {
                thought: Some("need weather".to_owned()),
                tool_name: "GET_WEATHER".to_owned(),
                action_input: json!({"location": "Paris"}),
            }
        );
    }

    #[test]
    fn action_without_thought_still_parses() {
        let response = "Action: GET_WEATHER\nAction Input: {\"location\": \"Tokyo\"}";
        let parsed = parse_llm_output(response).unwrap();
        match parsed {
            ParsedOutput::Action { thought, tool_name, .. } => {
                assert!(thought.is_none());
                assert_eq!(tool_name, "GET_WEATHER");
            }
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn malformed_action_input_is_a_parse_error_not_a_panic() {
        let response = "Thought: x\nAction: GET_WEATHER\nAction Input: {not json}";
        let err = parse_llm_output(response).unwrap_err();
        assert!(err.contains("not valid JSON"));
    }

    #[test]
    fn multiline_final_answer_is_collected() {
        let response = "Thought: summarizing\nFinal Answer: line one\nline two";
        let parsed = parse_llm_output(response).unwrap();
        match parsed {
            ParsedOutput::FinalAnswer { text, .. } => assert_eq!(text, "line one\nline two"),
            other => panic!("expected FinalAnswer, got {other:?}"),
        }
    }

    #[test]
    fn structured_json_fallback_bare_object() {
        let response = r#"{"tool": "WEB_SEARCH", "arguments": {"query": "rust async"}}"#;
        let parsed = parse_llm_output(response).unwrap();
        assert_eq!(
            parsed,
            ParsedOutput::Action {
                thought: None,
                tool_name: "WEB_SEARCH".to_owned(),
                action_input: json!({"query": "rust async"}),
            }
        );
    }

    #[test]
    fn structured_json_fallback_fenced_block() {
        let response = "Sure, here:\n```json\n{\"tool\": \"GET_WEATHER\", \"arguments\": {\"location\": \"Rome\"}}\n```";
        let parsed = parse_llm_output(response).unwrap();
        match parsed {
            ParsedOutput::Action { tool_name, .. } => assert_eq!(tool_name, "GET_WEATHER"),
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn structured_json_fallback_tool_call_tag() {
        let response = "<tool_call>{\"tool\": \"GET_NEWS\", \"arguments\": {}}</tool_call>";
        let parsed = parse_llm_output(response).unwrap();
        match parsed {
            ParsedOutput::Action { tool_name, action_input, .. } => {
                assert_eq!(tool_name, "GET_NEWS");
                assert!(action_input.as_object().unwrap().is_empty());
            }
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_text_is_an_error() {
        let response = "I think the weather is nice today, no further action.";
        assert!(parse_llm_output(response).is_err());
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let response = "  Thought:   pad me   \n  Final Answer:   padded answer  ";
        let parsed = parse_llm_output(response).unwrap();
        match parsed {
            ParsedOutput::FinalAnswer { thought, text } => {
                assert_eq!(thought.as_deref(), Some("pad me"));
                assert_eq!(text, "padded answer");
            }
            other => panic!("expected FinalAnswer, got {other:?}"),
        }
    }
}
