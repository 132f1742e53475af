//! [`ExtractionEngine`] backed by the `yt-dlp` binary.

use crate::args::{download_args, info_args};
use crate::process::{failure_detail, run_with_timeout};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};
use tubegate_core::{EngineError, EngineOptions, ExtractionEngine, SourceMetadata};

/// Locations checked when no binary is configured.
const COMMON_PATHS: &[&str] = &[
    "/opt/homebrew/bin/yt-dlp",
    "/usr/local/bin/yt-dlp",
    "/usr/bin/yt-dlp",
];

/// yt-dlp engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YtDlpConfig {
    /// Path to the binary. Looked up when unset.
    pub binary: Option<PathBuf>,
    /// Hard limit for a metadata call.
    pub info_timeout_secs: u64,
    /// Hard limit for a download call.
    pub download_timeout_secs: u64,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: None,
            info_timeout_secs: 120,
            download_timeout_secs: 3600,
        }
    }
}

/// Drives `yt-dlp` as a child process per call.
pub struct YtDlpEngine {
    binary: String,
    info_timeout: Duration,
    download_timeout: Duration,
}

impl YtDlpEngine {
    pub fn new(config: &YtDlpConfig) -> Self {
        let binary = config
            .binary
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(Self::find_binary);

        info!(binary = %binary, "Using yt-dlp");

        Self {
            binary,
            info_timeout: Duration::from_secs(config.info_timeout_secs),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn find_binary() -> String {
        COMMON_PATHS
            .iter()
            .find(|p| Path::new(p).exists())
            .map(|p| p.to_string())
            .unwrap_or_else(|| "yt-dlp".to_string())
    }

    async fn run(&self, args: &[String], limit: Duration) -> Result<Vec<u8>, EngineError> {
        let output = run_with_timeout(&self.binary, args, limit).await?;

        if !output.status.success() {
            let detail = failure_detail(&output.stderr);
            error!(
                exit_code = output.status.code().unwrap_or(-1),
                detail = %detail,
                "yt-dlp failed"
            );
            return Err(EngineError::Extraction(detail));
        }

        Ok(output.stdout)
    }
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new(&YtDlpConfig::default())
    }
}

/// Parse `--dump-single-json` output.
pub fn parse_metadata(stdout: &[u8]) -> Result<SourceMetadata, EngineError> {
    serde_json::from_slice(stdout)
        .map_err(|e| EngineError::Extraction(format!("invalid engine JSON: {}", e)))
}

/// The last non-empty stdout line is the file path printed after moving.
pub fn parse_output_path(stdout: &[u8]) -> Result<PathBuf, EngineError> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
        .ok_or(EngineError::NoOutput)
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_info(
        &self,
        url: &str,
        options: &EngineOptions,
    ) -> Result<SourceMetadata, EngineError> {
        let args = info_args(url, options);
        let stdout = self.run(&args, self.info_timeout).await?;
        let metadata = parse_metadata(&stdout)?;
        debug!(url, formats = metadata.formats.len(), "Extracted metadata");
        Ok(metadata)
    }

    async fn extract_and_download(
        &self,
        url: &str,
        format_id: &str,
        output_template: &str,
        options: &EngineOptions,
    ) -> Result<PathBuf, EngineError> {
        let args = download_args(url, format_id, output_template, options);
        let stdout = self.run(&args, self.download_timeout).await?;
        let path = parse_output_path(&stdout)?;
        info!(url, format_id, path = %path.display(), "Download finished");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_path_takes_last_line() {
        let path = parse_output_path(b"\ndownloads/My Video.mp4\n\n").unwrap();
        assert_eq!(path, PathBuf::from("downloads/My Video.mp4"));
    }

    #[test]
    fn test_parse_output_path_empty_is_no_output() {
        assert!(matches!(
            parse_output_path(b"  \n"),
            Err(EngineError::NoOutput)
        ));
    }

    #[test]
    fn test_parse_metadata_rejects_garbage() {
        assert!(matches!(
            parse_metadata(b"<html>"),
            Err(EngineError::Extraction(_))
        ));
    }

    #[test]
    fn test_configured_binary_wins() {
        let engine = YtDlpEngine::new(&YtDlpConfig {
            binary: Some(PathBuf::from("/opt/tools/yt-dlp")),
            ..Default::default()
        });
        assert_eq!(engine.binary(), "/opt/tools/yt-dlp");
    }

    /// Stand-in binary that answers like yt-dlp.
    #[cfg(unix)]
    fn fake_binary(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_info_through_process() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_binary(
            dir.path(),
            r#"echo '{"title":"Clip","duration":3,"formats":[{"format_id":"18","ext":"mp4"}]}'"#,
        );
        let engine = YtDlpEngine::new(&YtDlpConfig {
            binary: Some(binary),
            ..Default::default()
        });

        let metadata = engine
            .extract_info("https://youtu.be/abc", &EngineOptions::info_defaults())
            .await
            .unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Clip"));
        assert_eq!(metadata.formats.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_carries_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_binary(
            dir.path(),
            "echo 'ERROR: [youtube] abc: Private video' 1>&2; exit 1",
        );
        let engine = YtDlpEngine::new(&YtDlpConfig {
            binary: Some(binary),
            ..Default::default()
        });

        let err = engine
            .extract_and_download("https://youtu.be/abc", "18", "%(title)s.%(ext)s", &EngineOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Extraction(d) if d == "[youtube] abc: Private video"));
    }
}
