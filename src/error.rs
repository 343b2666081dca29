//! Crate-local error taxonomy.
//!
//! Per the error handling design, `Planner::plan` itself never propagates a
//! [`CoreError`] to its caller — internal failures are folded into
//! `ExecutionPlan.error` instead. `CoreError` surfaces at the edges that
//! legitimately fail before a plan begins: configuration loading, client
//! construction, and request validation.

use thiserror::Error;

/// Errors that can occur outside the bounds of a single `plan()` call.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid planner request: {0}")]
    InvalidRequest(String),

    #[error("failed to parse config at {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read config at {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to construct memory service client: {0}")]
    MemoryClient(String),

    #[error("failed to construct LLM adapter: {0}")]
    LlmAdapter(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(String),
}

/// Result type for fallible operations outside the `plan()` boundary.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Non-fatal / fatal failure kinds surfaced in `ExecutionPlan.error` or as a
/// per-step `Observation`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "message")]
pub enum PlanErrorKind {
    /// Reasoning did not converge within `max_iterations`. Fatal.
    IterationLimit,
    /// LLM adapter raised or timed out. Fatal.
    LlmError(String),
    /// LLM output didn't match the grammar. Recovered as an Observation.
    ParseError(String),
    /// `Action` did not resolve to a known `ToolType`. Recovered.
    UnknownTool(String),
    /// Required parameters absent from both `action_input` and `entities`. Recovered.
    MissingParameters(Vec<String>),
    /// Step rejected by the safety validator. Non-fatal for the loop, but
    /// forces `success = false` at terminus.
    BlockedBySafety(String),
    /// Caller cancelled the in-flight plan. Fatal.
    Cancelled,
}

impl std::fmt::Display for PlanErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanErrorKind::IterationLimit => write!(f, "iteration limit reached"),
            PlanErrorKind::LlmError(m) => write!(f, "LLM error: {m}"),
            PlanErrorKind::ParseError(m) => write!(f, "parse error: {m}"),
            PlanErrorKind::UnknownTool(t) => write!(f, "unknown tool: {t}"),
            PlanErrorKind::MissingParameters(ps) => {
                write!(f, "missing parameters: {}", ps.join(", "))
            }
            PlanErrorKind::BlockedBySafety(r) => write!(f, "blocked by safety: {r}"),
            PlanErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}
