//! Content identifiers derived from source URLs.

use crate::ports::IdResolver;
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use url::Url;

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid id pattern"));

/// Stable key for a piece of source media. Used as the sole cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Validate and wrap a raw identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if ID_PATTERN.is_match(&raw) {
            Ok(Self(raw))
        } else {
            Err(Error::InvalidUrl(format!("malformed content id: {:?}", raw)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ContentId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Resolves YouTube watch, short-link, shorts and embed URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct YoutubeIdResolver;

impl YoutubeIdResolver {
    pub fn new() -> Self {
        Self
    }

    fn raw_id(url: &Url) -> Option<String> {
        let host = url.host_str()?.to_ascii_lowercase();
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

        if host == "youtu.be" {
            return segments.next().map(str::to_string);
        }

        let host = host.strip_prefix("www.").unwrap_or(&host);
        if !matches!(host, "youtube.com" | "m.youtube.com" | "music.youtube.com") {
            return None;
        }

        if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
            return Some(v.into_owned());
        }

        match segments.next()? {
            "shorts" | "embed" | "live" | "v" => segments.next().map(str::to_string),
            _ => None,
        }
    }
}

impl IdResolver for YoutubeIdResolver {
    fn resolve(&self, url: &str) -> Result<ContentId> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        let raw = Self::raw_id(&parsed)
            .ok_or_else(|| Error::InvalidUrl(format!("not a recognised video URL: {}", url)))?;
        ContentId::new(raw)
    }
}
