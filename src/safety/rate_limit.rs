//! Sliding-window rate limiting. Each user gets one window
//! per risk level plus a dedicated abuse-counter window that every
//! `Blocked` outcome feeds regardless of the risk level that produced it.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::model::RiskLevel;

/// A single fixed-size, fixed-duration sliding window over event timestamps.
struct SlidingWindow {
    window: Duration,
    max_events: usize,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindow {
    fn new(window: Duration, max_events: usize) -> Self {
        Self {
            window,
            max_events,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Drop expired timestamps, then admit the current instant if the
    /// window has room. Returns whether the event was admitted.
    fn try_record(&self, now: Instant) -> bool {
        let mut ts = self.timestamps.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(&front) = ts.front() {
            if now.duration_since(front) > self.window {
                ts.pop_front();
            } else {
                break;
            }
        }
        if ts.len() >= self.max_events {
            false
        } else {
            ts.push_back(now);
            true
        }
    }

    fn count(&self, now: Instant) -> usize {
        let mut ts = self.timestamps.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(&front) = ts.front() {
            if now.duration_since(front) > self.window {
                ts.pop_front();
            } else {
                break;
            }
        }
        ts.len()
    }
}

/// Per-risk-level request budget, expressed as events per rolling minute:
/// LOW 60, MEDIUM 30, HIGH 10, CRITICAL 1.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub low_per_minute: usize,
    pub medium_per_minute: usize,
    pub high_per_minute: usize,
    pub critical_per_minute: usize,
    pub abuse_window: Duration,
    pub abuse_max_blocks: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            low_per_minute: 60,
            medium_per_minute: 30,
            high_per_minute: 10,
            critical_per_minute: 1,
            abuse_window: Duration::from_secs(600),
            abuse_max_blocks: 5,
        }
    }
}

/// One user's rate-limiting state: four risk-level windows plus the abuse
/// counter. Lives behind a per-user lock (see [`crate::safety::audit`]).
pub struct UserRateLimiter {
    low: SlidingWindow,
    medium: SlidingWindow,
    high: SlidingWindow,
    critical: SlidingWindow,
    abuse: SlidingWindow,
}

impl UserRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let minute = Duration::from_secs(60);
        Self {
            low: SlidingWindow::new(minute, config.low_per_minute),
            medium: SlidingWindow::new(minute, config.medium_per_minute),
            high: SlidingWindow::new(minute, config.high_per_minute),
            critical: SlidingWindow::new(minute, config.critical_per_minute),
            abuse: SlidingWindow::new(config.abuse_window, config.abuse_max_blocks),
        }
    }

    fn window_for(&self, level: RiskLevel) -> &SlidingWindow {
        match level {
            RiskLevel::Low => &self.low,
            RiskLevel::Medium => &self.medium,
            RiskLevel::High => &self.high,
            RiskLevel::Critical => &self.critical,
        }
    }

    /// Admit one action at `level`. Returns `false` if the per-level
    /// window is exhausted.
    pub fn try_admit(&self, level: RiskLevel, now: Instant) -> bool {
        self.window_for(level).try_record(now)
    }

    /// Record a `Blocked` outcome against the abuse counter. Returns
    /// `false` once the user has been blocked too many times in the
    /// abuse window, signalling that further requests should themselves
    /// be blocked regardless of their own risk level.
    pub fn record_block(&self, now: Instant) -> bool {
        self.abuse.try_record(now)
    }

    pub fn abuse_count(&self, now: Instant) -> usize {
        self.abuse.count(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_the_configured_limit_then_rejects() {
        let limiter = UserRateLimiter::new(RateLimitConfig {
            critical_per_minute: 1,
            ..RateLimitConfig::default()
        });
        let now = Instant::now();
        assert!(limiter.try_admit(RiskLevel::Critical, now));
        assert!(!limiter.try_admit(RiskLevel::Critical, now));
    }

    #[test]
    fn risk_levels_have_independent_windows() {
        let limiter = UserRateLimiter::new(RateLimitConfig::default());
        let now = Instant::now();
        assert!(limiter.try_admit(RiskLevel::Critical, now));
        assert!(!limiter.try_admit(RiskLevel::Critical, now));
        assert!(limiter.try_admit(RiskLevel::Low, now));
    }

    #[test]
    fn abuse_counter_trips_after_repeated_blocks() {
        let limiter = UserRateLimiter::new(RateLimitConfig {
            abuse_max_blocks: 2,
            ..RateLimitConfig::default()
        });
        let now = Instant::now();
        assert!(limiter.record_block(now));
        assert!(limiter.record_block(now));
        assert!(!limiter.record_block(now));
    }

    #[test]
    fn expired_entries_free_up_the_window() {
        let limiter = UserRateLimiter::new(RateLimitConfig {
            critical_per_minute: 1,
            ..RateLimitConfig::default()
        });
        let now = Instant::now();
        assert!(limiter.try_admit(RiskLevel::Critical, now));
        let later = now + Duration::from_secs(61);
        assert!(limiter.try_admit(RiskLevel::Critical, later));
    }
}
