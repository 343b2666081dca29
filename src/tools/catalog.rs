//! Tool Catalog & Selector.
//!
//! Unlike the dynamic `Tool` trait registry this module's idiom is adapted
//! from, the catalog here closes over `ToolType`: there is nothing to
//! register, `ToolType::ALL` is the whole catalog, and resolution either
//! hits a known variant or yields `UnknownTool`.

use crate::model::tool::{ParamType, ToolType};
use serde_json::Value;
use std::collections::HashMap;

/// Failure modes of parameter extraction, converted by the planner into a
/// scratchpad Observation rather than aborting the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    MissingParameters(Vec<String>),
}

/// Static, read-only catalog of tools. Cheap to construct; safe to share
/// across concurrent `plan()` calls without synchronization.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToolCatalog;

impl ToolCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Static mapping from intent name to ordered candidate tools, used only
    /// for prompt hinting. Empty for an unknown intent.
    pub fn candidates(&self, intent_name: &str) -> Vec<ToolType> {
        crate::model::tool::candidates_for_intent(intent_name)
    }

    /// Resolve an `Action:` name emitted by the LLM. Case-insensitive exact
    /// match only — no fuzzy resolution, so a hallucinated tool name is
    /// rejected rather than silently coerced to the nearest known one.
    pub fn lookup(&self, action_name: &str) -> Option<ToolType> {
        ToolType::parse(action_name)
    }

    /// Build the final parameter map for `tool` from the LLM's
    /// `action_input` object, falling back to same-named `entities` fields
    /// for missing required parameters, dropping unknown fields, and
    /// coercing values to the schema's declared type.
    ///
    /// Returns `SelectorError::MissingParameters` (not an abort) if any
    /// required parameter is absent from both sources.
    pub fn extract_parameters(
        &self,
        tool: ToolType,
        entities: &HashMap<String, Value>,
        action_input: &HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, SelectorError> {
        let schema = tool.param_schema();
        let mut out = HashMap::new();
        let mut missing = Vec::new();

        for field in schema {
            let raw = action_input
                .get(field.name)
                .or_else(|| entities.get(field.name));

            match raw {
                Some(v) => {
                    out.insert(field.name.to_owned(), coerce(v, field.ty));
                }
                None if field.required => missing.push(field.name.to_owned()),
                None => {}
            }
        }

        if !missing.is_empty() {
            return Err(SelectorError::MissingParameters(missing));
        }

        Ok(out)
    }
}

/// Coerce a JSON value to the parameter's declared type. Best-effort: a
/// value that cannot be coerced is passed through unchanged rather than
/// dropped, since the safety validator (not the selector) is responsible for
/// rejecting malformed content.
fn coerce(value: &Value, ty: ParamType) -> Value {
    match (ty, value) {
        (ParamType::String, Value::String(_)) => value.clone(),
        (ParamType::String, other) => Value::String(other.to_string()),
        (ParamType::Number, Value::Number(_)) => value.clone(),
        (ParamType::Number, Value::String(s)) => s
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| value.clone()),
        (ParamType::Bool, Value::Bool(_)) => value.clone(),
        (ParamType::Bool, Value::String(s)) => Value::Bool(s.eq_ignore_ascii_case("true")),
        (ParamType::Object, Value::Object(_)) => value.clone(),
        (ParamType::Array, Value::Array(_)) => value.clone(),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_resolves_known_tool_case_insensitively() {
        let catalog = ToolCatalog::new();
        assert_eq!(catalog.lookup("get_weather"), Some(ToolType::GetWeather));
        assert_eq!(catalog.lookup("GET_WEATHER"), Some(ToolType::GetWeather));
    }

    #[test]
    fn lookup_rejects_hallucinated_tool() {
        let catalog = ToolCatalog::new();
        assert_eq!(catalog.lookup("FLY_TO_THE_MOON"), None);
    }

    #[test]
    fn extract_parameters_prefers_action_input_over_entities() {
        let catalog = ToolCatalog::new();
        let entities = HashMap::from([("location".to_owned(), json!("Berlin"))]);
        let action_input = HashMap::from([("location".to_owned(), json!("Paris"))]);
        let params = catalog
            .extract_parameters(ToolType::GetWeather, &entities, &action_input)
            .unwrap();
        assert_eq!(params["location"], json!("Paris"));
    }

    #[test]
    fn extract_parameters_falls_back_to_entities() {
        let catalog = ToolCatalog::new();
        let entities = HashMap::from([("location".to_owned(), json!("Berlin"))]);
        let action_input = HashMap::new();
        let params = catalog
            .extract_parameters(ToolType::GetWeather, &entities, &action_input)
            .unwrap();
        assert_eq!(params["location"], json!("Berlin"));
    }

    #[test]
    fn extract_parameters_missing_required_is_recoverable_error() {
        let catalog = ToolCatalog::new();
        let entities = HashMap::new();
        let action_input = HashMap::new();
        let err = catalog
            .extract_parameters(ToolType::GetWeather, &entities, &action_input)
            .unwrap_err();
        assert_eq!(err, SelectorError::MissingParameters(vec!["location".to_owned()]));
    }

    #[test]
    fn extract_parameters_drops_unknown_fields() {
        let catalog = ToolCatalog::new();
        let entities = HashMap::new();
        let action_input = HashMap::from([
            ("location".to_owned(), json!("Paris")),
            ("bogus_field".to_owned(), json!("whatever")),
        ]);
        let params = catalog
            .extract_parameters(ToolType::GetWeather, &entities, &action_input)
            .unwrap();
        assert_eq!(params.len(), 1);
        assert!(!params.contains_key("bogus_field"));
    }

    #[test]
    fn coercion_parses_numeric_strings() {
        let catalog = ToolCatalog::new();
        let entities = HashMap::new();
        let action_input = HashMap::from([("duration_seconds".to_owned(), json!("30"))]);
        let params = catalog
            .extract_parameters(ToolType::SetTimer, &entities, &action_input)
            .unwrap();
        assert_eq!(params["duration_seconds"], json!(30.0));
    }
}
