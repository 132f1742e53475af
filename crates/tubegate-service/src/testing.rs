//! In-process engine double for service tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tubegate_core::{EngineError, EngineOptions, ExtractionEngine, SourceFormat, SourceMetadata};

pub enum DownloadBehaviour {
    /// Write these bytes to `<dir of template>/<name>` and report that path.
    Write { name: String, bytes: Vec<u8> },
    /// Report a path without creating the file.
    Phantom { name: String },
    /// Report an absolute path, creating the file there.
    Elsewhere { path: PathBuf },
    /// Like `Write`, also leaving the named sibling files behind.
    WriteWithLeftovers {
        name: String,
        bytes: Vec<u8>,
        leftovers: Vec<String>,
    },
    /// Write a partial file next to the template, then fail.
    FailAfterPartial { name: String, detail: String },
    Fail(String),
}

pub struct FakeEngine {
    pub metadata: Mutex<Result<SourceMetadata, String>>,
    pub download: Mutex<DownloadBehaviour>,
    pub info_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
    /// Format selector and output template of the last download call.
    pub last_download: Mutex<Option<(String, String)>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            metadata: Mutex::new(Ok(sample_metadata())),
            download: Mutex::new(DownloadBehaviour::Write {
                name: "Sample.mp4".to_string(),
                bytes: b"sample".to_vec(),
            }),
            info_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
            last_download: Mutex::new(None),
        }
    }

    pub fn with_download(self, behaviour: DownloadBehaviour) -> Self {
        *self.download.lock().unwrap() = behaviour;
        self
    }

    pub fn with_metadata(self, metadata: Result<SourceMetadata, String>) -> Self {
        *self.metadata.lock().unwrap() = metadata;
        self
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn last_download(&self) -> Option<(String, String)> {
        self.last_download.lock().unwrap().clone()
    }
}

pub fn sample_metadata() -> SourceMetadata {
    let format = |id: &str, ext: &str| SourceFormat {
        format_id: id.to_string(),
        ext: Some(ext.to_string()),
        format_note: Some("720p".to_string()),
        ..Default::default()
    };
    SourceMetadata {
        id: Some("abc".to_string()),
        title: Some("Sample".to_string()),
        thumbnail: Some("thumb.jpg".to_string()),
        duration: Some(42.0),
        formats: vec![
            format("18", "mp4"),
            format("251", "webm"),
            format("sb0", "mhtml"),
            format("140", "m4a"),
            format("17", "3gp"),
        ],
        ..Default::default()
    }
}

#[async_trait]
impl ExtractionEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn extract_info(
        &self,
        _url: &str,
        _options: &EngineOptions,
    ) -> Result<SourceMetadata, EngineError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata
            .lock()
            .unwrap()
            .clone()
            .map_err(EngineError::Extraction)
    }

    async fn extract_and_download(
        &self,
        _url: &str,
        format_id: &str,
        output_template: &str,
        _options: &EngineOptions,
    ) -> Result<PathBuf, EngineError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_download.lock().unwrap() =
            Some((format_id.to_string(), output_template.to_string()));
        let dir = Path::new(output_template)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        match &*self.download.lock().unwrap() {
            DownloadBehaviour::Write { name, bytes } => {
                let path = dir.join(name);
                std::fs::write(&path, bytes).map_err(|e| EngineError::Extraction(e.to_string()))?;
                Ok(path)
            }
            DownloadBehaviour::Phantom { name } => Ok(dir.join(name)),
            DownloadBehaviour::Elsewhere { path } => {
                std::fs::write(path, b"x").map_err(|e| EngineError::Extraction(e.to_string()))?;
                Ok(path.clone())
            }
            DownloadBehaviour::WriteWithLeftovers {
                name,
                bytes,
                leftovers,
            } => {
                for leftover in leftovers {
                    std::fs::write(dir.join(leftover), b"fragment")
                        .map_err(|e| EngineError::Extraction(e.to_string()))?;
                }
                let path = dir.join(name);
                std::fs::write(&path, bytes).map_err(|e| EngineError::Extraction(e.to_string()))?;
                Ok(path)
            }
            DownloadBehaviour::FailAfterPartial { name, detail } => {
                std::fs::write(dir.join(format!("{}.part", name)), b"partial")
                    .map_err(|e| EngineError::Extraction(e.to_string()))?;
                Err(EngineError::Extraction(detail.clone()))
            }
            DownloadBehaviour::Fail(detail) => Err(EngineError::Extraction(detail.clone())),
        }
    }
}
