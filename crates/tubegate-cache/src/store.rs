//! Cache storage trait and the filesystem implementation.

use crate::types::CacheEntry;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use tubegate_core::Result;

const ENTRY_EXTENSION: &str = "json";

/// Trait for durable cache backends.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the entry stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Store an entry, replacing any previous one.
    async fn save(&self, key: &str, entry: &CacheEntry) -> Result<()>;

    /// Delete an entry. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all stored keys.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// One JSON file per key under a root directory.
pub struct FilesystemStore {
    root_dir: PathBuf,
}

impl FilesystemStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let sanitized_key = key.replace(['/', '\\', ':', '.'], "_");
        self.root_dir
            .join(format!("{}.{}", sanitized_key, ENTRY_EXTENSION))
    }
}

#[async_trait]
impl CacheStore for FilesystemStore {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let key_path = self.key_path(key);
        let bytes = match tokio::fs::read(&key_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let key_path = self.key_path(key);
        let bytes = serde_json::to_vec(entry)?;

        // Write to a sibling temp file and rename so readers never see a torn entry.
        let tmp_path = key_path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &key_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(key, path = %key_path.display(), "Cache entry written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.key_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut read_dir = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut keys = vec![];
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }
}

impl Default for FilesystemStore {
    fn default() -> Self {
        Self::new("cache")
    }
}
