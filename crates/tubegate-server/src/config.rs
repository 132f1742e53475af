//! Server configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tubegate_api::ApiConfig;
use tubegate_core::EngineOptions;
use tubegate_engine::YtDlpConfig;
use tubegate_service::{DownloadConfig, RateLimitConfig};

/// Server configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub bind: SocketAddr,
    /// Directory holding cached metadata.
    pub cache_dir: PathBuf,
    /// Metadata freshness in seconds.
    pub cache_ttl_secs: u64,
    /// How often expired cache entries are deleted. Zero disables purging.
    pub cache_purge_interval_secs: u64,
    /// Directory downloads are written to before streaming.
    pub download_dir: PathBuf,
    /// Engine output template, relative to `download_dir`.
    pub output_template: String,
    /// Streamed chunk size in bytes.
    pub chunk_size: usize,
    pub rate_limit: RateLimitConfig,
    pub cors_origins: Vec<String>,
    pub engine: YtDlpConfig,
    /// Options for metadata extraction.
    pub info_options: EngineOptions,
    /// Options for downloads.
    pub download_options: EngineOptions,
    pub log: LogConfig,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Filter directives used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let download = DownloadConfig::default();
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cache_dir: PathBuf::from("cache"),
            cache_ttl_secs: tubegate_cache::DEFAULT_TTL_SECS,
            cache_purge_interval_secs: 3600,
            download_dir: download.download_dir,
            output_template: download.output_template,
            chunk_size: download.chunk_size,
            rate_limit: RateLimitConfig::default(),
            cors_origins: ApiConfig::default().cors_origins,
            engine: YtDlpConfig::default(),
            info_options: EngineOptions::info_defaults(),
            download_options: EngineOptions::download_defaults(),
            log: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, std::io::Error> {
        serde_yaml::from_str(contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            download_dir: self.download_dir.clone(),
            output_template: self.output_template.clone(),
            chunk_size: self.chunk_size,
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            cors_origins: self.cors_origins.clone(),
            trust_forwarded_for: self.rate_limit.trust_forwarded_for,
        }
    }
}
