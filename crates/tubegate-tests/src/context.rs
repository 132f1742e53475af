//! Test context: a running server over temporary directories.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tubegate_api::{ApiConfig, AppState};
use tubegate_cache::{DEFAULT_TTL_SECS, FilesystemStore, MetadataCache};
use tubegate_core::{EngineOptions, YoutubeIdResolver};
use tubegate_service::{
    DownloadConfig, DownloadPipeline, MetadataService, RateLimitConfig, RateLimiter,
};

use crate::fixtures::ScriptedEngine;
use crate::helpers::{ApiTestClient, start_test_server};

/// Knobs for a test server.
#[derive(Debug, Clone)]
pub struct TestSettings {
    pub max_requests: u32,
    pub window_secs: u64,
    pub chunk_size: usize,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 3600,
            chunk_size: 8192,
        }
    }
}

/// A server bound to a loopback port.
///
/// Drop this to stop the server and remove its directories.
pub struct TestContext {
    pub addr: SocketAddr,
    pub client: ApiTestClient,
    pub engine: Arc<ScriptedEngine>,
    dir: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl TestContext {
    /// Default settings and engine script.
    pub async fn new() -> anyhow::Result<Self> {
        Self::start(ScriptedEngine::new(), TestSettings::default()).await
    }

    pub async fn with_engine(engine: ScriptedEngine) -> anyhow::Result<Self> {
        Self::start(engine, TestSettings::default()).await
    }

    pub async fn start(engine: ScriptedEngine, settings: TestSettings) -> anyhow::Result<Self> {
        crate::init_test_logging();

        let dir = tempfile::tempdir()?;
        let engine = Arc::new(engine);
        let resolver = Arc::new(YoutubeIdResolver::new());

        let cache = Arc::new(MetadataCache::new(
            Arc::new(FilesystemStore::new(dir.path().join("cache"))),
            DEFAULT_TTL_SECS,
        ));
        let metadata = MetadataService::new(
            resolver.clone(),
            engine.clone(),
            cache,
            EngineOptions::info_defaults(),
        );
        let downloads = DownloadPipeline::new(
            resolver,
            engine.clone(),
            EngineOptions::download_defaults(),
            DownloadConfig {
                download_dir: dir.path().join("downloads"),
                chunk_size: settings.chunk_size,
                ..Default::default()
            },
        );
        let limiter = RateLimiter::new(&RateLimitConfig {
            window_secs: settings.window_secs,
            max_requests: settings.max_requests,
            ..Default::default()
        });

        let state = Arc::new(AppState::new(
            Arc::new(metadata),
            Arc::new(downloads),
            Arc::new(limiter),
            ApiConfig::default(),
        ));
        let (addr, handle) = start_test_server(state).await?;

        Ok(Self {
            addr,
            client: ApiTestClient::new(addr),
            engine,
            dir,
            handle,
        })
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    pub fn download_dir(&self) -> PathBuf {
        self.dir.path().join("downloads")
    }

    /// Files currently present in the download directory.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.download_dir())
            .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
            .unwrap_or_default()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
