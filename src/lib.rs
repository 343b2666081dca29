//! A ReAct-style reasoning core for a voice assistant.
//!
//! Given a classified intent and a raw user utterance, [`planner::Planner`]
//! drives an iterative Thought→Action→Observation loop against an LLM
//! adapter, resolving each proposed action through a closed tool catalog and
//! an end-to-end safety validator, and returns a terminal
//! [`model::ExecutionPlan`]. The crate never executes a tool itself — it
//! only decides which calls, with which parameters, are safe to hand to the
//! caller.

pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod model;
pub mod planner;
pub mod safety;
pub mod tools;

pub use config::AppConfig;
pub use error::{CoreError, PlanErrorKind, Result};
pub use model::{ExecutionPlan, IntentEnvelope, PlanRequest};
pub use planner::Planner;
