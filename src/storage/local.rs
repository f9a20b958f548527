//! Local filesystem storage implementation.
//!
//! Artifacts are plain files under one root directory. Writes go to a
//! temporary sibling first and are renamed into place, so a stage that dies
//! mid-write never leaves a truncated artifact for the next stage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::ArtifactStore;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl ArtifactStore for LocalStorage {
    async fn read_optional(&self, key: &str) -> Result<Option<String>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            None => Ok(None),
        }
    }

    async fn write_text(&self, key: &str, content: &str) -> Result<()> {
        self.write_bytes(key, content.as_bytes()).await?;
        log::debug!("Wrote {} ({} bytes)", self.locate(key), content.len());
        Ok(())
    }

    fn locate(&self, key: &str) -> String {
        self.path(key).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_text("seeds.txt", "a\nb\n").await.unwrap();
        let data = storage.read_text("seeds.txt").await.unwrap();
        assert_eq!(data, "a\nb\n");
        assert!(!tmp.path().join("seeds.txt.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(storage.read_optional("nope.txt").await.unwrap().is_none());
        let err = storage.read_text("nope.txt").await.unwrap_err();
        assert!(matches!(err, AppError::InputMissing { .. }));
    }

    #[tokio::test]
    async fn test_write_creates_directories_and_replaces() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("run"));

        storage.write_text("out/report.csv", "old").await.unwrap();
        storage.write_text("out/report.csv", "new").await.unwrap();
        assert_eq!(storage.read_text("out/report.csv").await.unwrap(), "new");
    }
}
