//! Path utilities for naming artifacts inside the media root

use std::path::{Component, Path};

use crate::domain::errors::DomainError;

/// Path utilities for blob names and uploaded files
pub struct PathUtils;

impl PathUtils {
    /// Check that a blob name is a plain relative path that stays inside the root
    pub fn validate_blob_name(name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::BadArgs("Artifact name cannot be empty".to_string()));
        }

        let path = Path::new(name);
        for component in path.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(DomainError::BadArgs(format!(
                        "Artifact name must be a relative path without '..': {}",
                        name
                    )))
                }
            }
        }

        Ok(())
    }

    /// Get lowercase file extension from path
    pub fn get_extension(path: &Path) -> Option<String> {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Get file name from path
    pub fn get_file_name(path: &Path) -> Option<String> {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_blob_name() {
        assert!(PathUtils::validate_blob_name("videos/A_0001.mp4").is_ok());
        assert!(PathUtils::validate_blob_name("../etc/passwd").is_err());
        assert!(PathUtils::validate_blob_name("/abs/path.mp4").is_err());
        assert!(PathUtils::validate_blob_name("videos/../../x").is_err());
        assert!(PathUtils::validate_blob_name("").is_err());
    }

    #[test]
    fn test_get_extension_is_lowercase() {
        assert_eq!(
            PathUtils::get_extension(Path::new("clip/A_0001.MP4")).as_deref(),
            Some("mp4")
        );
        assert_eq!(PathUtils::get_extension(Path::new("README")), None);
    }
}
