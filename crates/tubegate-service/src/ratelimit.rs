//! Per-client sliding-window rate limiting.
//!
//! Each client identity owns the timestamps of its admitted requests inside
//! the trailing window. An admission check purges timestamps that fell out
//! of the window, rejects if the remaining count reached the quota, and
//! otherwise records the new request. The purge-check-append sequence runs
//! under the identity's map shard lock, so concurrent requests from one
//! client can never be admitted beyond the quota.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default window length (one hour).
const DEFAULT_WINDOW_SECS: u64 = 3600;

/// Default requests per window.
const DEFAULT_MAX_REQUESTS: u32 = 100;

/// Default interval between sweeps of idle identities.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Length of the sliding window.
    pub window_secs: u64,
    /// Requests admitted per window and identity.
    pub max_requests: u32,
    /// How often idle identities are evicted. Zero disables sweeping.
    pub sweep_interval_secs: u64,
    /// Take the client identity from `X-Forwarded-For` when present.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            max_requests: DEFAULT_MAX_REQUESTS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            trust_forwarded_for: false,
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Admitted; `remaining` more requests fit in the current window.
    Allowed { remaining: u32 },
    /// Rejected; the oldest counted request leaves the window after `retry_after`.
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Sliding-window rate limiter keyed by client identity.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    windows: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_secs),
            max_requests: config.max_requests,
            windows: DashMap::new(),
        }
    }

    /// Admit or reject one request from `identity`.
    pub fn admit(&self, identity: &str) -> bool {
        self.check(identity).is_allowed()
    }

    pub fn check(&self, identity: &str) -> RateDecision {
        self.check_at(identity, Instant::now())
    }

    /// Admission check as seen at `now`.
    pub fn check_at(&self, identity: &str, now: Instant) -> RateDecision {
        let mut entry = self.windows.entry(identity.to_string()).or_default();
        let timestamps = entry.value_mut();

        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        let used = timestamps.len();
        if used >= self.max_requests as usize {
            let retry_after = timestamps
                .front()
                .map(|&oldest| self.window.saturating_sub(now.saturating_duration_since(oldest)))
                .unwrap_or(self.window);
            debug!(identity, used, "Rate limit reached");
            return RateDecision::Limited { retry_after };
        }

        timestamps.push_back(now);
        RateDecision::Allowed {
            remaining: self.max_requests - (used as u32 + 1),
        }
    }

    /// Drop identities with no request inside the window at `now`.
    /// Returns the number of identities evicted.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|&latest| now.saturating_duration_since(latest) < self.window)
        });
        before.saturating_sub(self.windows.len())
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Number of identities currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&RateLimitConfig::default())
    }
}
