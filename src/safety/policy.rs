//! The Safety Validator: the ordered, short-circuiting pipeline that
//! turns a proposed tool call into a [`ValidationResult`]. Every step runs
//! in the order the pipeline describes; the first Blocked outcome wins.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::audit::{AuditEntry, UserRegistry};
use super::rate_limit::RateLimitConfig;
use super::sanitize::{
    detect_path_traversal, detect_shell_metacharacters, detect_sql_injection, mask_pii, scrub_xss,
    validate_url_scheme,
};
use crate::model::{RiskContributions, RiskLevel, RiskScore, RiskThresholds, ToolType, ValidationResult};

#[derive(Debug, Clone)]
pub struct SafetyConfig {
    pub thresholds: RiskThresholds,
    pub rate_limits: RateLimitConfig,
    pub allow_http_localhost: bool,
    pub blocked_domains: Vec<String>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            thresholds: RiskThresholds::default(),
            rate_limits: RateLimitConfig::default(),
            allow_http_localhost: true,
            blocked_domains: Vec::new(),
        }
    }
}

/// Orchestrates the six-step validation pipeline and owns the per-user audit
/// and rate-limit registry.
pub struct SafetyValidator {
    config: SafetyConfig,
    registry: UserRegistry,
}

impl SafetyValidator {
    pub fn new(config: SafetyConfig) -> Self {
        let registry = UserRegistry::new(config.rate_limits);
        Self { config, registry }
    }

    /// Validate a proposed tool call for `user_id`. `parameters` must
    /// already satisfy the tool's schema (`ToolCatalog::extract_parameters`
    /// runs before this).
    pub fn validate(
        &self,
        user_id: &str,
        tool: ToolType,
        parameters: HashMap<String, Value>,
    ) -> ValidationResult {
        let now = Instant::now();
        let state = self.registry.get_or_create(user_id);
        let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());

        // Pre-check: a user who has triggered enough Blocked outcomes
        // recently is short-circuited before any other step runs, failing
        // the whole plan with BlockedBySafety(Abuse).
        if guard.rate_limiter.abuse_count(now) >= self.config.rate_limits.abuse_max_blocks {
            warn!(user_id, tool = %tool, "short-circuited by abuse counter");
            let risk = RiskScore::compute(
                RiskContributions { tool: tool.risk_class().weight(), parameters: 0.0, context: 1.0 },
                self.config.thresholds,
            );
            let result = ValidationResult::Blocked { reason: "Abuse".to_owned(), risk };
            guard.record(AuditEntry {
                timestamp: chrono::Utc::now(),
                tool,
                risk_level: result.risk().level,
                outcome: "blocked:abuse".to_owned(),
            });
            return result;
        }

        // Step 1: whitelist/blacklist.
        if tool.is_blacklisted() {
            let risk = RiskScore::compute(
                RiskContributions { tool: 1.0, parameters: 0.0, context: 0.0 },
                self.config.thresholds,
            );
            return self.finish_blocked(&mut guard, now, tool, "tool is blacklisted".to_owned(), risk);
        }

        // Step 2 & 3: per-parameter sanitization and PII masking.
        let mut sanitized_params = parameters;
        let mut warnings = Vec::new();
        let mut flagged = 0usize;
        let total = sanitized_params.len().max(1);

        for (name, value) in sanitized_params.iter_mut() {
            let Value::String(s) = value else { continue };

            if let Some(reason) = detect_sql_injection(s) {
                let risk = RiskScore::compute(
                    RiskContributions { tool: tool.risk_class().weight(), parameters: 1.0, context: 0.0 },
                    self.config.thresholds,
                );
                return self.finish_blocked(&mut guard, now, tool, reason.to_string(), risk);
            }

            if tool.is_os_class() {
                if let Some(reason) = detect_shell_metacharacters(s) {
                    let risk = RiskScore::compute(
                        RiskContributions { tool: tool.risk_class().weight(), parameters: 1.0, context: 0.0 },
                        self.config.thresholds,
                    );
                    return self.finish_blocked(&mut guard, now, tool, reason.to_string(), risk);
                }
                if name == "path" {
                    if let Some(reason) = detect_path_traversal(s) {
                        let risk = RiskScore::compute(
                            RiskContributions { tool: tool.risk_class().weight(), parameters: 1.0, context: 0.0 },
                            self.config.thresholds,
                        );
                        return self.finish_blocked(&mut guard, now, tool, reason.to_string(), risk);
                    }
                }
            }

            if let Some(reason) =
                validate_url_scheme(s, self.config.allow_http_localhost, &self.config.blocked_domains)
            {
                let risk = RiskScore::compute(
                    RiskContributions { tool: tool.risk_class().weight(), parameters: 1.0, context: 0.0 },
                    self.config.thresholds,
                );
                return self.finish_blocked(&mut guard, now, tool, reason.to_string(), risk);
            }

            let (scrubbed, xss_hit) = scrub_xss(s);
            let (masked, pii_categories) = mask_pii(&scrubbed);
            if xss_hit {
                flagged += 1;
                warnings.push(format!("{name}: removed XSS-flavoured content"));
            }
            if !pii_categories.is_empty() {
                flagged += 1;
                let names: Vec<String> = pii_categories.iter().map(|c| c.to_string()).collect();
                warnings.push(format!("{name}: masked PII ({})", names.join(", ")));
            }
            *value = Value::String(masked);
        }

        // Step 4: risk scoring.
        let parameters_contribution = (flagged as f64 / total as f64).clamp(0.0, 1.0);
        let context_contribution =
            (guard.rate_limiter.abuse_count(now) as f64 / self.config.rate_limits.abuse_max_blocks.max(1) as f64)
                .clamp(0.0, 1.0);
        let risk = RiskScore::compute(
            RiskContributions {
                tool: tool.risk_class().weight(),
                parameters: parameters_contribution,
                context: context_contribution,
            },
            self.config.thresholds,
        );

        // Step 5: rate limiting.
        if !guard.rate_limiter.try_admit(risk.level, now) {
            let result = ValidationResult::Blocked { reason: "RateLimited".to_owned(), risk: risk.clone() };
            guard.record(AuditEntry {
                timestamp: chrono::Utc::now(),
                tool,
                risk_level: risk.level,
                outcome: "blocked:rate_limited".to_owned(),
            });
            guard.rate_limiter.record_block(now);
            warn!(user_id, tool = %tool, level = ?risk.level, "rate limited");
            return result;
        }

        // Step 6: confirmation policy.
        let needs_confirmation =
            tool.requires_confirmation() || matches!(risk.level, RiskLevel::High | RiskLevel::Critical);

        let result = if needs_confirmation {
            info!(user_id, tool = %tool, "requires confirmation");
            ValidationResult::RequiresConfirmation {
                parameters: sanitized_params,
                message: format!("{tool} requires explicit confirmation before executing"),
                risk: risk.clone(),
            }
        } else if !warnings.is_empty() {
            debug!(user_id, tool = %tool, "sanitized");
            ValidationResult::Sanitized { parameters: sanitized_params, warnings, risk: risk.clone() }
        } else {
            debug!(user_id, tool = %tool, "approved");
            ValidationResult::Approved { parameters: sanitized_params, risk: risk.clone() }
        };

        guard.record(AuditEntry {
            timestamp: chrono::Utc::now(),
            tool,
            risk_level: risk.level,
            outcome: outcome_label(&result).to_owned(),
        });

        result
    }

    /// A hard-block reason (blacklist, SQL injection, shell metacharacters,
    /// path traversal, disallowed URL scheme) is an outright refusal to
    /// execute, not a graded risk estimate — it always reports CRITICAL
    /// regardless of the tool/parameter/context weights that produced it.
    fn finish_blocked(
        &self,
        guard: &mut super::audit::UserState,
        now: Instant,
        tool: ToolType,
        reason: String,
        risk: RiskScore,
    ) -> ValidationResult {
        let risk = RiskScore { level: RiskLevel::Critical, score: 1.0, ..risk };
        warn!(tool = %tool, reason = %reason, "blocked by safety validator");
        guard.record(AuditEntry {
            timestamp: chrono::Utc::now(),
            tool,
            risk_level: risk.level,
            outcome: format!("blocked:{reason}"),
        });
        guard.rate_limiter.record_block(now);
        ValidationResult::Blocked { reason, risk }
    }

    /// Snapshot of a user's recent audit entries, used by `get_user_stats`.
    pub fn user_stats(&self, user_id: &str, limit: usize) -> Vec<AuditEntry> {
        let state = self.registry.get_or_create(user_id);
        let guard = state.lock().unwrap_or_else(|e| e.into_inner());
        guard.recent(limit)
    }
}

fn outcome_label(result: &ValidationResult) -> &'static str {
    match result {
        ValidationResult::Approved { .. } => "approved",
        ValidationResult::Sanitized { .. } => "sanitized",
        ValidationResult::RequiresConfirmation { .. } => "requires_confirmation",
        ValidationResult::Blocked { .. } => "blocked",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn blacklisted_tool_is_blocked_outright() {
        let validator = SafetyValidator::new(SafetyConfig::default());
        let result = validator.validate("u1", ToolType::DeleteFile, params(&[("path", json!("/tmp/x"))]));
        assert!(result.is_blocked());
        assert_eq!(result.risk().level, RiskLevel::Critical);
    }

    #[test]
    fn sql_injection_blocks_at_critical_risk() {
        let validator = SafetyValidator::new(SafetyConfig::default());
        let result = validator.validate(
            "u1",
            ToolType::DatabaseQuery,
            params(&[("query", json!("SELECT 1; DROP TABLE users;--"))]),
        );
        assert!(result.is_blocked());
        assert_eq!(result.risk().level, RiskLevel::Critical);
    }

    #[test]
    fn low_risk_tool_is_approved() {
        let validator = SafetyValidator::new(SafetyConfig::default());
        let result =
            validator.validate("u1", ToolType::GetWeather, params(&[("location", json!("Paris"))]));
        assert!(matches!(result, ValidationResult::Approved { .. }));
    }

    #[test]
    fn xss_payload_is_sanitized_not_blocked() {
        let validator = SafetyValidator::new(SafetyConfig::default());
        let result = validator.validate(
            "u1",
            ToolType::PlayMusic,
            params(&[("query", json!("<script>alert(1)</script> song"))]),
        );
        assert!(matches!(result, ValidationResult::Sanitized { .. }));
    }

    #[test]
    fn send_email_always_requires_confirmation() {
        let validator = SafetyValidator::new(SafetyConfig::default());
        let result = validator.validate(
            "u1",
            ToolType::SendEmail,
            params(&[("to", json!("a@b.com")), ("subject", json!("hi")), ("body", json!("hello"))]),
        );
        assert!(matches!(result, ValidationResult::RequiresConfirmation { .. }));
    }

    #[test]
    fn critical_rate_limit_admits_one_then_blocks() {
        let validator = SafetyValidator::new(SafetyConfig::default());
        let r1 = validator.validate("u1", ToolType::SystemControl, params(&[("action", json!("lock"))]));
        assert!(!r1.is_blocked());
        let r2 = validator.validate("u1", ToolType::SystemControl, params(&[("action", json!("lock"))]));
        // SystemControl risk class is High, confirmation gate fires before
        // the rate limiter for the first call; the second call consumes the
        // same HIGH window (10/min) so it is not yet exhausted at n=2.
        assert!(!r2.is_blocked());
    }

    #[test]
    fn blocked_outcomes_accumulate_in_the_abuse_counter_and_eventually_short_circuit() {
        let config = SafetyConfig {
            rate_limits: RateLimitConfig { abuse_max_blocks: 2, ..RateLimitConfig::default() },
            ..SafetyConfig::default()
        };
        let validator = SafetyValidator::new(config);
        for _ in 0..2 {
            let result = validator.validate("u1", ToolType::DeleteFile, params(&[("path", json!("/tmp/x"))]));
            assert!(result.is_blocked());
        }
        let result =
            validator.validate("u1", ToolType::GetWeather, params(&[("location", json!("Paris"))]));
        match result {
            ValidationResult::Blocked { reason, .. } => assert_eq!(reason, "Abuse"),
            other => panic!("expected abuse short-circuit, got {other:?}"),
        }
    }

    #[test]
    fn audit_log_records_every_outcome() {
        let validator = SafetyValidator::new(SafetyConfig::default());
        validator.validate("u1", ToolType::GetWeather, params(&[("location", json!("Paris"))]));
        validator.validate("u1", ToolType::DeleteFile, params(&[("path", json!("/tmp/x"))]));
        let stats = validator.user_stats("u1", 10);
        assert_eq!(stats.len(), 2);
    }
}
