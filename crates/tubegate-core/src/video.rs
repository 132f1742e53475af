//! Video metadata as returned to clients, and as reported by the engine.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Container extensions a rendition must have to be offered to clients.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["mp4", "webm", "m4a", "mp3"];

/// One downloadable rendition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFormat {
    pub format_id: String,
    pub ext: String,
    #[serde(rename = "quality")]
    pub quality_label: String,
    #[serde(rename = "filesize")]
    pub filesize_bytes: Option<u64>,
    pub resolution: Option<String>,
    pub fps: Option<f64>,
    #[serde(rename = "vcodec")]
    pub video_codec: Option<String>,
    #[serde(rename = "acodec")]
    pub audio_codec: Option<String>,
}

/// Shaped metadata for one piece of media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub thumbnail: String,
    #[serde(rename = "duration")]
    pub duration_seconds: u64,
    pub formats: Vec<VideoFormat>,
    pub description: Option<String>,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
}

/// Raw rendition as reported by the extraction engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceFormat {
    #[serde(default)]
    pub format_id: String,
    pub ext: Option<String>,
    pub format_note: Option<String>,
    pub filesize: Option<u64>,
    pub resolution: Option<String>,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

impl SourceFormat {
    /// Whether the rendition's container is on the allow-list.
    pub fn is_accepted(&self) -> bool {
        self.ext
            .as_deref()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext))
    }
}

impl From<SourceFormat> for VideoFormat {
    fn from(f: SourceFormat) -> Self {
        Self {
            format_id: f.format_id,
            ext: f.ext.unwrap_or_default(),
            quality_label: f.format_note.unwrap_or_default(),
            filesize_bytes: f.filesize,
            resolution: f.resolution,
            fps: f.fps,
            video_codec: f.vcodec,
            audio_codec: f.acodec,
        }
    }
}

/// Raw metadata as reported by the extraction engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub formats: Vec<SourceFormat>,
    pub description: Option<String>,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
}

impl VideoInfo {
    /// Shape engine metadata into a client-facing record, dropping
    /// renditions outside [`ACCEPTED_EXTENSIONS`].
    ///
    /// A missing title is an engine inconsistency. Live streams have no
    /// duration and some sources have no thumbnail, so those default.
    pub fn from_source(source: SourceMetadata) -> Result<Self> {
        let title = source.title.ok_or_else(|| {
            Error::InternalFailure("engine metadata is missing a title".to_string())
        })?;

        let formats = source
            .formats
            .into_iter()
            .filter(SourceFormat::is_accepted)
            .map(VideoFormat::from)
            .collect();

        Ok(Self {
            title,
            thumbnail: source.thumbnail.unwrap_or_default(),
            duration_seconds: source.duration.map_or(0, |d| d.max(0.0) as u64),
            formats,
            description: source.description,
            view_count: source.view_count,
            upload_date: source.upload_date,
        })
    }
}
