//! Download pipeline: engine download, artifact validation, streamed
//! response, guaranteed artifact removal.
//!
//! Every request downloads into its own directory under the download root.
//! A [`Workdir`] guard owns that directory from before the engine runs, so
//! partial files, kept fragments and the artifact itself are deleted
//! together, exactly once, on every exit path. The engine call runs on a
//! detached task, so if the requester goes away mid-download the task still
//! finishes and its result (and with it the guard) is dropped.

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};
use tubegate_core::{EngineOptions, Error, ExtractionEngine, IdResolver, Result};
use uuid::Uuid;

/// Default streamed chunk size.
const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Longest accepted format selector.
const MAX_FORMAT_ID_LEN: usize = 128;

/// Download pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Root under which per-request directories are created.
    pub download_dir: PathBuf,
    /// Engine output template, relative to the request directory.
    pub output_template: String,
    /// Size of streamed chunks in bytes.
    pub chunk_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            output_template: "%(title)s.%(ext)s".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// A finished download ready to be streamed.
pub struct Download {
    /// Suggested attachment name (the artifact's base name).
    pub filename: String,
    pub size_bytes: u64,
    pub stream: ArtifactStream,
}

pub struct DownloadPipeline {
    resolver: Arc<dyn IdResolver>,
    engine: Arc<dyn ExtractionEngine>,
    options: EngineOptions,
    config: DownloadConfig,
}

impl DownloadPipeline {
    pub fn new(
        resolver: Arc<dyn IdResolver>,
        engine: Arc<dyn ExtractionEngine>,
        options: EngineOptions,
        config: DownloadConfig,
    ) -> Self {
        Self {
            resolver,
            engine,
            options,
            config,
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download `format_id` of `url` and open the artifact for streaming.
    pub async fn download(&self, url: &str, format_id: &str) -> Result<Download> {
        let id = self.resolver.resolve(url)?;
        let format_id = validate_format_id(format_id)?;

        let root = self.download_root().await?;
        let workdir = Workdir::create(&root).await?;
        let template = workdir
            .path()
            .join(&self.config.output_template)
            .to_string_lossy()
            .to_string();

        info!(content_id = %id, format_id, engine = self.engine.name(), "Starting download");

        let engine = self.engine.clone();
        let options = self.options.clone();
        let url = url.to_string();
        let format = format_id.to_string();

        let task = tokio::spawn(async move {
            let path = engine
                .extract_and_download(&url, &format, &template, &options)
                .await?;
            claim_artifact(workdir, path).await
        });

        let artifact = task
            .await
            .map_err(|e| Error::InternalFailure(format!("download task failed: {}", e)))?
            .inspect_err(|e| error!(content_id = %id, format_id, error = %e, "Download failed"))?;

        let file = File::open(artifact.path())
            .await
            .map_err(|e| Error::InternalFailure(format!("failed to open artifact: {}", e)))?;
        let size_bytes = file
            .metadata()
            .await
            .map_err(|e| Error::InternalFailure(format!("failed to stat artifact: {}", e)))?
            .len();

        let filename = artifact
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.bin", id));

        debug!(content_id = %id, filename = %filename, size_bytes, "Streaming artifact");

        Ok(Download {
            filename,
            size_bytes,
            stream: ArtifactStream::new(file, artifact, self.config.chunk_size),
        })
    }

    /// Absolute, symlink-free form of the configured download directory,
    /// created if missing.
    async fn download_root(&self) -> Result<PathBuf> {
        let dir = &self.config.download_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::InternalFailure(format!("failed to create download dir: {}", e)))?;
        tokio::fs::canonicalize(dir)
            .await
            .map_err(|e| Error::InternalFailure(format!("failed to resolve download dir: {}", e)))
    }
}

/// The selector as passed to the engine.
fn validate_format_id(format_id: &str) -> Result<&str> {
    let trimmed = format_id.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_FORMAT_ID_LEN || trimmed.starts_with('-') {
        return Err(Error::InvalidFormat(format_id.to_string()));
    }
    Ok(trimmed)
}

/// Confirm the reported file exists inside the request directory and take
/// ownership of it. Relative paths resolve against the working directory.
async fn claim_artifact(workdir: Workdir, reported: PathBuf) -> Result<Artifact> {
    let path = match tokio::fs::canonicalize(&reported).await {
        Ok(path) => path,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::ArtifactMissing(reported.display().to_string()));
        }
        Err(e) => {
            return Err(Error::InternalFailure(format!(
                "failed to resolve artifact {}: {}",
                reported.display(),
                e
            )));
        }
    };

    if !path.starts_with(workdir.path()) {
        return Err(Error::InternalFailure(format!(
            "engine reported a path outside the download directory: {}",
            reported.display()
        )));
    }

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Ok(Artifact { path, workdir }),
        Ok(_) => Err(Error::ArtifactMissing(format!(
            "{} is not a regular file",
            path.display()
        ))),
        Err(e) => Err(Error::InternalFailure(format!(
            "failed to stat artifact {}: {}",
            path.display(),
            e
        ))),
    }
}

/// A request's private download directory. Deleted with its contents
/// exactly once.
#[derive(Debug)]
struct Workdir {
    path: PathBuf,
    removed: bool,
}

impl Workdir {
    async fn create(root: &Path) -> Result<Self> {
        let path = root.join(Uuid::new_v4().simple().to_string());
        tokio::fs::create_dir(&path)
            .await
            .map_err(|e| Error::InternalFailure(format!("failed to create request dir: {}", e)))?;
        Ok(Self {
            path,
            removed: false,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Blocking, and may run on a runtime worker from `Drop`. The directory
    /// only ever holds one request's output.
    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Request directory removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Request directory already gone")
            }
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove request directory"
            ),
        }
    }
}

impl Drop for Workdir {
    fn drop(&mut self) {
        self.remove();
    }
}

/// A confirmed artifact and the directory that owns it.
#[derive(Debug)]
struct Artifact {
    path: PathBuf,
    workdir: Workdir,
}

impl Artifact {
    fn path(&self) -> &Path {
        &self.path
    }

    fn remove(&mut self) {
        self.workdir.remove();
    }
}

/// Finite, single-pass stream of artifact chunks.
///
/// The file handle is closed and the artifact removed when the stream ends,
/// yields an error, or is dropped before completion.
pub struct ArtifactStream {
    reader: Option<ReaderStream<File>>,
    artifact: Artifact,
}

impl ArtifactStream {
    fn new(file: File, artifact: Artifact, chunk_size: usize) -> Self {
        Self {
            reader: Some(ReaderStream::with_capacity(file, chunk_size.max(1))),
            artifact,
        }
    }

    fn finish(&mut self) {
        // Close the handle before unlinking.
        self.reader.take();
        self.artifact.remove();
    }
}

impl Stream for ArtifactStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(reader) = this.reader.as_mut() else {
            return Poll::Ready(None);
        };

        match Pin::new(reader).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(e))) => {
                warn!(path = %this.artifact.path().display(), error = %e, "Artifact read failed");
                this.finish();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ArtifactStream {
    fn drop(&mut self) {
        self.finish();
    }
}
