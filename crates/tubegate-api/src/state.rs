//! Application state shared across handlers.

use std::sync::Arc;
use tubegate_service::{DownloadPipeline, MetadataService, RateLimiter};

/// HTTP-facing settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Origins allowed by CORS. `*` mirrors any origin.
    pub cors_origins: Vec<String>,
    /// Identify clients by the first `X-Forwarded-For` hop.
    pub trust_forwarded_for: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec!["http://localhost:5173".to_string()],
            trust_forwarded_for: false,
        }
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<MetadataService>,
    pub downloads: Arc<DownloadPipeline>,
    pub limiter: Arc<RateLimiter>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(
        metadata: Arc<MetadataService>,
        downloads: Arc<DownloadPipeline>,
        limiter: Arc<RateLimiter>,
        config: ApiConfig,
    ) -> Self {
        Self {
            metadata,
            downloads,
            limiter,
            config,
        }
    }
}
