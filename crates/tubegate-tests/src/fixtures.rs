//! Test fixtures: sample engine metadata and a scriptable engine.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tubegate_core::{EngineError, EngineOptions, ExtractionEngine, SourceFormat, SourceMetadata};

/// Factory for engine metadata.
pub struct MetadataFixture;

impl MetadataFixture {
    /// Six renditions, four of them in accepted containers.
    pub fn mixed_formats() -> SourceMetadata {
        SourceMetadata {
            id: Some("dQw4w9WgXcQ".to_string()),
            title: Some("Never Gonna Give You Up".to_string()),
            thumbnail: Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hq.jpg".to_string()),
            duration: Some(212.4),
            description: Some("Official video".to_string()),
            view_count: Some(1_500_000_000),
            upload_date: Some("20091025".to_string()),
            formats: vec![
                Self::rendition("sb2", "mhtml", None),
                Self::rendition("160", "mp4", Some("144p")),
                Self::rendition("22", "mp4", Some("720p")),
                Self::rendition("251", "webm", Some("medium")),
                Self::rendition("140", "m4a", Some("medium")),
                Self::rendition("13", "3gp", Some("small")),
            ],
        }
    }

    pub fn rendition(format_id: &str, ext: &str, note: Option<&str>) -> SourceFormat {
        SourceFormat {
            format_id: format_id.to_string(),
            ext: Some(ext.to_string()),
            format_note: note.map(str::to_string),
            ..Default::default()
        }
    }
}

/// What a scripted download does.
#[derive(Debug, Clone)]
pub enum ScriptedDownload {
    /// Write `bytes` as `<download dir>/<name>`.
    Produce { name: String, bytes: Vec<u8> },
    /// Report success without writing anything.
    ReportOnly { name: String },
    /// Fail with the given engine message.
    Refuse(String),
}

/// Extraction engine that answers from a script and counts its calls.
pub struct ScriptedEngine {
    info: Mutex<Result<SourceMetadata, String>>,
    download: Mutex<ScriptedDownload>,
    info_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self {
            info: Mutex::new(Ok(MetadataFixture::mixed_formats())),
            download: Mutex::new(ScriptedDownload::Produce {
                name: "Never Gonna Give You Up.mp4".to_string(),
                bytes: b"rickroll".to_vec(),
            }),
            info_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_info(self, message: &str) -> Self {
        *self.info.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn download(self, script: ScriptedDownload) -> Self {
        *self.download.lock().unwrap() = script;
        self
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn extract_info(
        &self,
        _url: &str,
        _options: &EngineOptions,
    ) -> Result<SourceMetadata, EngineError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.info
            .lock()
            .unwrap()
            .clone()
            .map_err(EngineError::Extraction)
    }

    async fn extract_and_download(
        &self,
        _url: &str,
        _format_id: &str,
        output_template: &str,
        _options: &EngineOptions,
    ) -> Result<PathBuf, EngineError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let dir = Path::new(output_template)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let script = self.download.lock().unwrap().clone();
        match script {
            ScriptedDownload::Produce { name, bytes } => {
                let path = dir.join(name);
                tokio::fs::write(&path, bytes)
                    .await
                    .map_err(|e| EngineError::Extraction(e.to_string()))?;
                Ok(path)
            }
            ScriptedDownload::ReportOnly { name } => Ok(dir.join(name)),
            ScriptedDownload::Refuse(message) => Err(EngineError::Extraction(message)),
        }
    }
}
