// Ingest interactor - Upload, batch import and removal of segments

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::app::annotate_interactor::transcript_name;
use crate::app::locks::CollectionLocks;
use crate::app::{discard_artifact, find_predecessor, find_segment, invalidate_stitch};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Blob-store directory of never-trimmed captures
pub const RAW_DIR: &str = "raw";
/// Blob-store directory of canonical (current) media
pub const VIDEOS_DIR: &str = "videos";

/// A file the batch import could not ingest
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a batch import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub skipped: Vec<SkippedFile>,
}

/// Interactor for ingestion use cases
pub struct IngestInteractor {
    store: Arc<dyn SegmentStorePort>,
    blobs: Arc<dyn BlobStorePort>,
    locks: Arc<CollectionLocks>,
}

impl IngestInteractor {
    /// Create new ingest interactor with injected ports
    pub fn new(
        store: Arc<dyn SegmentStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        locks: Arc<CollectionLocks>,
    ) -> Self {
        Self {
            store,
            blobs,
            locks,
        }
    }

    /// Store `file` as a new segment.
    ///
    /// The identifier comes from `title`, or the file name when no title is
    /// given. `folder` defaults to the collection key.
    #[instrument(skip(self))]
    pub async fn upload(
        &self,
        file: &Path,
        title: Option<&str>,
        folder: Option<&str>,
    ) -> Result<Segment, DomainError> {
        let identifier = match title {
            Some(title) => title.to_string(),
            None => PathUtils::get_file_name(file).ok_or_else(|| {
                DomainError::BadArgs(format!("{} has no file name", file.display()))
            })?,
        };
        let key = SequenceResolver::parse(&identifier)?;
        let folder = folder.unwrap_or(key.collection_key.as_str()).to_string();

        let name = key.name();
        let ext = PathUtils::get_extension(file).unwrap_or_else(|| "mp4".to_string());
        let raw_ref = format!("{}/{}.{}", RAW_DIR, name, ext);
        let canonical_ref = format!("{}/{}.{}", VIDEOS_DIR, name, ext);
        let segment = Segment::new(key.clone(), folder, canonical_ref, raw_ref)?;

        if !tokio::fs::try_exists(file).await.unwrap_or(false) {
            return Err(DomainError::SourceUnavailable(format!(
                "{} does not exist",
                file.display()
            )));
        }

        let _guard = self.locks.acquire(&key.collection_key).await;
        if self.store.find_by_key(&key).await?.is_some() {
            return Err(DomainError::Duplicate(name));
        }

        self.blobs.import(file, &segment.raw_media).await?;
        if let Err(e) = self.blobs.import(file, &segment.canonical_media).await {
            discard_artifact(&*self.blobs, &segment.raw_media).await;
            return Err(e);
        }

        if let Err(e) = self.store.insert(&segment).await {
            discard_artifact(&*self.blobs, &segment.raw_media).await;
            discard_artifact(&*self.blobs, &segment.canonical_media).await;
            return Err(e);
        }

        info!("Uploaded {} into folder {}", segment.name(), segment.folder);
        Ok(segment)
    }

    /// Upload every video file directly inside `dir` in file-name order.
    ///
    /// With `renumber`, files are named `{folder}_{n:04}` in that order instead
    /// of by their own names. Files that fail are reported and skipped.
    #[instrument(skip(self))]
    pub async fn import_folder(
        &self,
        dir: &Path,
        folder: Option<&str>,
        renumber: bool,
    ) -> Result<ImportReport, DomainError> {
        if !dir.is_dir() {
            return Err(DomainError::SourceUnavailable(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let folder = match folder {
            Some(folder) => folder.to_string(),
            None => PathUtils::get_file_name(dir).ok_or_else(|| {
                DomainError::BadArgs(format!("Cannot derive a folder name from {}", dir.display()))
            })?,
        };

        let mut report = ImportReport::default();
        let mut count: u32 = 0;

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                    report.skipped.push(SkippedFile {
                        path: e.path().map(Path::to_path_buf).unwrap_or_default(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let file_name = entry.file_name().to_string_lossy();
            if !entry.file_type().is_file() || !is_video_file(&file_name) {
                debug!("Ignoring {}", entry.path().display());
                continue;
            }

            count += 1;
            let title = renumber.then(|| SegmentKey::new(folder.as_str(), count).name());

            match self.upload(entry.path(), title.as_deref(), Some(&folder)).await {
                Ok(segment) => report.imported.push(segment.name()),
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path().display(), e);
                    report.skipped.push(SkippedFile {
                        path: entry.path().to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Imported {} files from {} ({} skipped)",
            report.imported.len(),
            dir.display(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Remove a segment with all of its artifacts.
    ///
    /// The predecessor's stitch contained this segment, so it is dropped too.
    #[instrument(skip(self))]
    pub async fn delete(&self, identifier: &str) -> Result<Segment, DomainError> {
        let key = SequenceResolver::parse(identifier)?;
        let _guard = self.locks.acquire(&key.collection_key).await;

        let segment = find_segment(&*self.store, &key).await?;

        // A failure here leaves the record and its media in place
        if let Some(mut predecessor) = find_predecessor(&*self.store, &key).await? {
            invalidate_stitch(&*self.store, &*self.blobs, &mut predecessor).await?;
        }
        self.store.delete(&segment.id).await?;

        let mut artifacts = vec![
            segment.raw_media.clone(),
            segment.canonical_media.clone(),
            transcript_name(&segment.name()),
        ];
        artifacts.extend(segment.stitched_preview.clone());
        for artifact in &artifacts {
            discard_artifact(&*self.blobs, artifact).await;
        }

        info!("Deleted {}", segment.name());
        Ok(segment)
    }
}
