//! Risk scoring and the safety validator's result type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Threshold table deriving a [`RiskLevel`] from a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 0.25,
            high: 0.50,
            critical: 0.75,
        }
    }
}

impl RiskThresholds {
    pub fn level_for(self, score: f64) -> RiskLevel {
        if score >= self.critical {
            RiskLevel::Critical
        } else if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// The per-dimension contributions feeding the weighted risk formula
/// `score = 0.5·tool + 0.3·parameters + 0.2·context`, clipped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskContributions {
    pub tool: f64,
    pub parameters: f64,
    pub context: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub level: RiskLevel,
    pub score: f64,
    pub contributions: RiskContributions,
}

impl RiskScore {
    pub fn compute(contributions: RiskContributions, thresholds: RiskThresholds) -> Self {
        let raw = 0.5 * contributions.tool + 0.3 * contributions.parameters + 0.2 * contributions.context;
        let score = raw.clamp(0.0, 1.0);
        Self {
            level: thresholds.level_for(score),
            score,
            contributions,
        }
    }
}

/// Outcome of the safety validator pipeline for a single tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome")]
pub enum ValidationResult {
    Approved {
        parameters: HashMap<String, Value>,
        risk: RiskScore,
    },
    RequiresConfirmation {
        parameters: HashMap<String, Value>,
        message: String,
        risk: RiskScore,
    },
    Sanitized {
        parameters: HashMap<String, Value>,
        warnings: Vec<String>,
        risk: RiskScore,
    },
    Blocked {
        reason: String,
        risk: RiskScore,
    },
}

impl ValidationResult {
    pub fn risk(&self) -> &RiskScore {
        match self {
            ValidationResult::Approved { risk, .. }
            | ValidationResult::RequiresConfirmation { risk, .. }
            | ValidationResult::Sanitized { risk, .. }
            | ValidationResult::Blocked { risk, .. } => risk,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, ValidationResult::Blocked { .. })
    }
}
