// Local filesystem adapter - Blob storage for raw, canonical and stitched media

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Directory under the media root holding artifacts that are not yet committed
const STAGING_DIR: &str = ".staging";

/// Blob store rooted at a local directory
pub struct LocalFsAdapter {
    root: PathBuf,
    staging_dir: PathBuf,
    base_url: String,
}

impl LocalFsAdapter {
    /// Create new local filesystem adapter, creating the root if needed
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Result<Self, DomainError> {
        let root = root.into();
        let staging_dir = root.join(STAGING_DIR);

        // Staging lives under the root so commits are same-filesystem renames
        std::fs::create_dir_all(&staging_dir).map_err(|e| {
            DomainError::Storage(format!(
                "Failed to create media root {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self {
            root,
            staging_dir,
            base_url: base_url.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_parent(path: &Path) -> Result<(), DomainError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::Storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStorePort for LocalFsAdapter {
    fn path_for(&self, name: &str) -> Result<PathBuf, DomainError> {
        PathUtils::validate_blob_name(name)?;
        Ok(self.root.join(name))
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }

    async fn exists(&self, name: &str) -> Result<bool, DomainError> {
        let path = self.path_for(name)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn stage(&self, suffix: &str) -> Result<PathBuf, DomainError> {
        let staged = tempfile::Builder::new()
            .prefix("stage-")
            .suffix(suffix)
            .tempfile_in(&self.staging_dir)
            .map_err(|e| DomainError::Storage(format!("Failed to create staging file: {}", e)))?;

        let (_file, path) = staged
            .keep()
            .map_err(|e| DomainError::Storage(format!("Failed to keep staging file: {}", e)))?;
        Ok(path)
    }

    async fn commit(&self, staged: &Path, name: &str) -> Result<(), DomainError> {
        let target = self.path_for(name)?;
        Self::ensure_parent(&target).await?;

        fs::rename(staged, &target).await.map_err(|e| {
            DomainError::Storage(format!(
                "Failed to commit {} to {}: {}",
                staged.display(),
                name,
                e
            ))
        })?;

        debug!("Committed artifact {}", name);
        Ok(())
    }

    async fn import(&self, source: &Path, name: &str) -> Result<(), DomainError> {
        let suffix = PathUtils::get_extension(source)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let staged = self.stage(&suffix).await?;

        if let Err(e) = fs::copy(source, &staged).await {
            self.discard(&staged).await;
            return Err(DomainError::SourceUnavailable(format!(
                "Failed to read {}: {}",
                source.display(),
                e
            )));
        }

        if let Err(e) = self.commit(&staged, name).await {
            self.discard(&staged).await;
            return Err(e);
        }
        Ok(())
    }

    async fn write_text(&self, name: &str, contents: &str) -> Result<(), DomainError> {
        let staged = self.stage(".txt").await?;
        if let Err(e) = fs::write(&staged, contents).await {
            self.discard(&staged).await;
            return Err(DomainError::Storage(format!("Failed to write {}: {}", name, e)));
        }
        self.commit(&staged, name).await
    }

    async fn delete(&self, name: &str) -> Result<(), DomainError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted artifact {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::Storage(format!(
                "Failed to delete {}: {}",
                name, e
            ))),
        }
    }

    async fn discard(&self, staged: &Path) {
        let _ = fs::remove_file(staged).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn adapter(dir: &TempDir) -> LocalFsAdapter {
        LocalFsAdapter::new(dir.path().join("media"), "/media").unwrap()
    }

    #[tokio::test]
    async fn test_commit_moves_staged_file_into_place() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);

        let staged = store.stage(".mp4").await.unwrap();
        std::fs::write(&staged, b"payload").unwrap();
        store.commit(&staged, "videos/A_0001.mp4").await.unwrap();

        assert!(!staged.exists());
        assert!(store.exists("videos/A_0001.mp4").await.unwrap());
        let committed = store.path_for("videos/A_0001.mp4").unwrap();
        assert_eq!(std::fs::read(committed).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_commit_overwrites_existing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);

        store.write_text("videos/A_0001.mp4", "old").await.unwrap();
        store.write_text("videos/A_0001.mp4", "new").await.unwrap();

        let path = store.path_for("videos/A_0001.mp4").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_import_copies_source() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);
        let source = dir.path().join("upload.mp4");
        std::fs::write(&source, b"clip").unwrap();

        store.import(&source, "raw/A_0001.mp4").await.unwrap();

        assert!(source.exists());
        assert!(store.exists("raw/A_0001.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_import_missing_source_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);
        let err = store
            .import(&dir.path().join("missing.mp4"), "raw/A_0001.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);
        store.delete("videos/nope.mp4").await.unwrap();
    }

    #[test]
    fn test_path_for_rejects_escape() {
        let dir = TempDir::new().unwrap();
        let store = adapter(&dir);
        assert!(store.path_for("../outside.mp4").is_err());
        assert_eq!(store.url_for("videos/A_0001.mp4"), "/media/videos/A_0001.mp4");
    }
}
