//! Port traits for the collaborators the services depend on.

use crate::content_id::ContentId;
use crate::error::EngineError;
use crate::options::EngineOptions;
use crate::video::SourceMetadata;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Maps a source URL to its content identifier.
pub trait IdResolver: Send + Sync {
    /// Fails with [`crate::Error::InvalidUrl`] when no identifier can be derived.
    fn resolve(&self, url: &str) -> Result<ContentId>;
}

/// External engine that extracts metadata and downloads media.
///
/// Calls may take a long time (network I/O against the source). Callers
/// must not hold locks across them.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Name of the engine (for logging).
    fn name(&self) -> &'static str;

    /// Extract metadata without downloading.
    async fn extract_info(
        &self,
        url: &str,
        options: &EngineOptions,
    ) -> std::result::Result<SourceMetadata, EngineError>;

    /// Download the given rendition to a file named from `output_template`
    /// and return the path of the produced file.
    async fn extract_and_download(
        &self,
        url: &str,
        format_id: &str,
        output_template: &str,
        options: &EngineOptions,
    ) -> std::result::Result<PathBuf, EngineError>;
}
