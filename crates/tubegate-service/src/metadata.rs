//! Metadata lookup: cache first, engine on miss.

use std::sync::Arc;
use tracing::{debug, error, info};
use tubegate_cache::MetadataCache;
use tubegate_core::{EngineOptions, Error, ExtractionEngine, IdResolver, Result, VideoInfo};

pub struct MetadataService {
    resolver: Arc<dyn IdResolver>,
    engine: Arc<dyn ExtractionEngine>,
    cache: Arc<MetadataCache>,
    options: EngineOptions,
}

impl MetadataService {
    pub fn new(
        resolver: Arc<dyn IdResolver>,
        engine: Arc<dyn ExtractionEngine>,
        cache: Arc<MetadataCache>,
        options: EngineOptions,
    ) -> Self {
        Self {
            resolver,
            engine,
            cache,
            options,
        }
    }

    /// Shaped metadata for `url`.
    ///
    /// A fresh cache entry short-circuits the engine. On a miss the engine
    /// result is shaped, cached and returned. Concurrent misses for the same
    /// content may both reach the engine; the last write wins.
    pub async fn fetch_info(&self, url: &str) -> Result<VideoInfo> {
        let id = self.resolver.resolve(url)?;

        if let Some(info) = self.cache.get(&id).await {
            debug!(content_id = %id, "Serving metadata from cache");
            return Ok(info);
        }

        info!(content_id = %id, engine = self.engine.name(), "Extracting metadata");
        let source = self
            .engine
            .extract_info(url, &self.options)
            .await
            .map_err(|e| {
                error!(content_id = %id, error = %e, "Metadata extraction failed");
                Error::from(e)
            })?;

        let info = VideoInfo::from_source(source).map_err(Error::into_request_error)?;
        self.cache.put(&id, info.clone()).await;

        Ok(info)
    }
}
