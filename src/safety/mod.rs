//! Safety Validator: sanitization, PII masking, risk scoring, rate
//! limiting, confirmation policy, and the per-user audit trail.

pub mod audit;
pub mod policy;
pub mod rate_limit;
pub mod sanitize;

pub use audit::{AuditEntry, UserRegistry, UserState};
pub use policy::{SafetyConfig, SafetyValidator};
pub use rate_limit::{RateLimitConfig, UserRateLimiter};
