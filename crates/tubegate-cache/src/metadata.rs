//! Metadata cache keyed by content identifier.

use crate::store::CacheStore;
use crate::types::CacheEntry;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tubegate_core::{ContentId, VideoInfo};

/// One hour.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Time-bounded cache of shaped metadata.
///
/// Absence is an ordinary outcome: storage failures are logged and reported
/// as a miss (on read) or silently dropped (on write), never as errors.
/// Expired entries are not deleted on read; the next `put` overwrites them.
pub struct MetadataCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl MetadataCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl_secs: u64) -> Self {
        Self {
            store,
            ttl: i64::try_from(ttl_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, id: &ContentId) -> Option<VideoInfo> {
        self.get_at(id, Utc::now()).await
    }

    /// Lookup as seen at `now`.
    pub async fn get_at(&self, id: &ContentId, now: DateTime<Utc>) -> Option<VideoInfo> {
        match self.store.load(id.as_str()).await {
            Ok(Some(entry)) if entry.is_fresh(now, self.ttl) => {
                debug!(content_id = %id, "Metadata cache hit");
                Some(entry.payload)
            }
            Ok(Some(_)) => {
                debug!(content_id = %id, "Metadata cache entry expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(content_id = %id, error = %e, "Failed to read metadata cache entry");
                None
            }
        }
    }

    pub async fn put(&self, id: &ContentId, info: VideoInfo) {
        self.put_at(id, info, Utc::now()).await
    }

    /// Store `info` as fetched at `now`.
    pub async fn put_at(&self, id: &ContentId, info: VideoInfo, now: DateTime<Utc>) {
        let entry = CacheEntry::new(info, now);
        if let Err(e) = self.store.save(id.as_str(), &entry).await {
            warn!(content_id = %id, error = %e, "Failed to write metadata cache entry");
        }
    }

    /// Delete every entry whose ttl has elapsed at `now`. Returns the number
    /// of entries removed. Unreadable entries are removed as well.
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let keys = match self.store.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list metadata cache entries");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            let expired = match self.store.load(&key).await {
                Ok(Some(entry)) => !entry.is_fresh(now, self.ttl),
                Ok(None) => false,
                Err(_) => true,
            };
            if !expired {
                continue;
            }
            match self.store.delete(&key).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(key = %key, error = %e, "Failed to purge metadata cache entry"),
            }
        }

        if removed > 0 {
            info!(removed, "Purged expired metadata cache entries");
        }
        removed
    }

    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now()).await
    }
}
