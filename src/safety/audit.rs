//! Per-user audit log and the per-user state registry. Each user gets one
//! ring buffer of the last 1024 validation outcomes and one rate limiter,
//! both behind a single per-user lock so a validation never blocks on
//! another user's traffic. The registry itself uses a get-or-create-under-
//! lock pattern over a `Mutex<HashMap<...>>`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::rate_limit::{RateLimitConfig, UserRateLimiter};
use crate::model::{RiskLevel, ToolType};

/// Bound on a user's audit ring.
const AUDIT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub tool: ToolType,
    pub risk_level: RiskLevel,
    pub outcome: String,
}

/// Per-user mutable state: audit ring plus rate limiter, always locked and
/// released together so an observer never sees a rate-limit decision that
/// isn't reflected in the audit log yet.
pub struct UserState {
    audit: VecDeque<AuditEntry>,
    pub rate_limiter: UserRateLimiter,
}

impl UserState {
    fn new(rate_config: RateLimitConfig) -> Self {
        Self {
            audit: VecDeque::with_capacity(AUDIT_CAPACITY),
            rate_limiter: UserRateLimiter::new(rate_config),
        }
    }

    pub fn record(&mut self, entry: AuditEntry) {
        if self.audit.len() == AUDIT_CAPACITY {
            self.audit.pop_front();
        }
        self.audit.push_back(entry);
    }

    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit.iter().rev().take(limit).cloned().collect()
    }
}

/// Global registry of per-user state, keyed by user id. Each entry is its
/// own `Arc<Mutex<_>>` so validations for different users never contend.
pub struct UserRegistry {
    users: Mutex<HashMap<String, Arc<Mutex<UserState>>>>,
    rate_config: RateLimitConfig,
}

impl UserRegistry {
    pub fn new(rate_config: RateLimitConfig) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            rate_config,
        }
    }

    /// Fetch this user's state, creating it on first use.
    pub fn get_or_create(&self, user_id: &str) -> Arc<Mutex<UserState>> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        users
            .entry(user_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(UserState::new(self.rate_config))))
            .clone()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
