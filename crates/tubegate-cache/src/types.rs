//! Cache record types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tubegate_core::VideoInfo;

/// A cached metadata result. Replaced wholesale on refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the payload was fetched from the engine.
    #[serde(rename = "cache_time")]
    pub fetched_at: DateTime<Utc>,
    #[serde(rename = "info")]
    pub payload: VideoInfo,
}

impl CacheEntry {
    pub fn new(payload: VideoInfo, fetched_at: DateTime<Utc>) -> Self {
        Self {
            fetched_at,
            payload,
        }
    }

    /// Fresh while `now - fetched_at < ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}
