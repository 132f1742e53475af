//! Tubegate server entrypoint.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::{Instant, Interval};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tubegate_api::{AppState, build_app};
use tubegate_cache::{FilesystemStore, MetadataCache};
use tubegate_core::YoutubeIdResolver;
use tubegate_engine::YtDlpEngine;
use tubegate_service::{DownloadPipeline, MetadataService, RateLimiter};

mod config;

use config::{LogConfig, ServerConfig};

#[derive(Parser)]
#[command(name = "tubegate")]
#[command(author, version, about = "Rate-limited video metadata and download gateway", long_about = None)]
struct Cli {
    /// Path to a YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration file.
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if cli.json_logs {
        config.log.json = true;
    }

    init_tracing(&config.log);

    let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
    let cache = Arc::new(MetadataCache::new(
        Arc::new(FilesystemStore::new(&config.cache_dir)),
        config.cache_ttl_secs,
    ));
    let resolver = Arc::new(YoutubeIdResolver::new());
    let engine = Arc::new(YtDlpEngine::new(&config.engine));

    let metadata = Arc::new(MetadataService::new(
        resolver.clone(),
        engine.clone(),
        cache.clone(),
        config.info_options.clone(),
    ));
    let downloads = Arc::new(DownloadPipeline::new(
        resolver,
        engine,
        config.download_options.clone(),
        config.download_config(),
    ));

    spawn_rate_limit_sweep(limiter.clone(), config.rate_limit.sweep_interval_secs);
    spawn_cache_purge(cache, config.cache_purge_interval_secs);

    let state = Arc::new(AppState::new(
        metadata,
        downloads,
        limiter,
        config.api_config(),
    ));
    let app = build_app(state);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(addr = %config.bind, "Tubegate listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("Tubegate stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn spawn_rate_limit_sweep(limiter: Arc<RateLimiter>, interval_secs: u64) {
    let Some(mut ticker) = periodic(interval_secs) else {
        return;
    };
    tokio::spawn(async move {
        loop {
            ticker.tick().await;
            let evicted = limiter.sweep();
            debug!(
                evicted,
                tracked = limiter.tracked_identities(),
                "Swept idle rate limit identities"
            );
        }
    });
}

fn spawn_cache_purge(cache: Arc<MetadataCache>, interval_secs: u64) {
    let Some(mut ticker) = periodic(interval_secs) else {
        return;
    };
    tokio::spawn(async move {
        loop {
            ticker.tick().await;
            cache.purge_expired().await;
        }
    });
}

/// Ticker whose first tick is one period from now. `None` when the interval
/// is zero or too large to schedule.
fn periodic(interval_secs: u64) -> Option<Interval> {
    if interval_secs == 0 {
        return None;
    }
    let period = Duration::from_secs(interval_secs);
    let Some(start) = Instant::now().checked_add(period) else {
        warn!(interval_secs, "Interval too large to schedule, task disabled");
        return None;
    };
    Some(tokio::time::interval_at(start, period))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
