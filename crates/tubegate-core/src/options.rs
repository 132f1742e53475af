//! Option bag handed to the extraction engine.
//!
//! The services build these from configuration and pass them through
//! without looking inside; only the engine adapter interprets them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Format selector (e.g. "best").
    pub format: Option<String>,
    /// Format sort keys (e.g. "res:1080p", "ext:mp4:m4a").
    pub format_sort: Vec<String>,
    /// Network socket timeout in seconds.
    pub socket_timeout_secs: Option<u32>,
    /// Retries for the whole request.
    pub retries: Option<u32>,
    /// Retries per fragment for segmented streams.
    pub fragment_retries: Option<u32>,
    /// Skip fragments that stay unavailable after retries.
    pub skip_unavailable_fragments: Option<bool>,
    /// Two-letter country code for geo bypass.
    pub geo_bypass_country: Option<String>,
    /// Browser to import cookies from.
    pub cookies_from_browser: Option<String>,
    /// Netscape cookie file.
    pub cookies_file: Option<PathBuf>,
    /// Proxy URL.
    pub proxy: Option<String>,
    /// Keep intermediate files after post-processing.
    pub keep_video: bool,
    /// Overwrite existing files.
    pub overwrites: bool,
    /// Do not resolve playlist entries.
    pub flat: bool,
    /// Raw arguments appended verbatim.
    pub extra_args: Vec<String>,
}

impl EngineOptions {
    /// Options for metadata-only extraction.
    pub fn info_defaults() -> Self {
        Self {
            format: Some("best".to_string()),
            socket_timeout_secs: Some(10),
            retries: Some(3),
            geo_bypass_country: Some("US".to_string()),
            flat: true,
            ..Default::default()
        }
    }

    /// Options for downloads.
    pub fn download_defaults() -> Self {
        Self {
            format_sort: vec!["res:1080p".to_string(), "ext:mp4:m4a".to_string()],
            socket_timeout_secs: Some(10),
            retries: Some(3),
            fragment_retries: Some(10),
            skip_unavailable_fragments: Some(false),
            geo_bypass_country: Some("US".to_string()),
            keep_video: true,
            overwrites: true,
            ..Default::default()
        }
    }
}
