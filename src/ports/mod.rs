// Ports - Interface definitions (contracts) for the collaborators the core consumes

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for segment persistence
#[async_trait]
pub trait SegmentStorePort: Send + Sync {
    /// Insert a new segment; `Duplicate` if its key is taken
    async fn insert(&self, segment: &Segment) -> Result<(), DomainError>;

    /// Fetch by composite key; absence is not an error
    async fn find_by_key(&self, key: &SegmentKey) -> Result<Option<Segment>, DomainError>;

    /// Persist only the stitch columns and `updated_at` of `segment`
    async fn update_stitch(&self, segment: &Segment) -> Result<(), DomainError>;

    /// Persist only the annotation columns and `updated_at` of `segment`
    async fn update_annotation(&self, segment: &Segment) -> Result<(), DomainError>;

    /// Remove the record
    async fn delete(&self, id: &SegmentId) -> Result<(), DomainError>;

    /// All segments of a collection ordered by ordinal
    async fn list_collection(&self, collection_key: &str) -> Result<Vec<Segment>, DomainError>;

    /// Segments filtered by annotation status, oldest first
    async fn list_by_status(
        &self,
        annotated: bool,
        limit: usize,
    ) -> Result<Vec<Segment>, DomainError>;

    /// Segments that arrived with a given upload folder
    async fn list_folder(&self, folder: &str) -> Result<Vec<Segment>, DomainError>;

    /// Segments whose identifier or transcript contains `query`
    async fn search(
        &self,
        folder: Option<&str>,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Segment>, DomainError>;

    /// Most recently created segments
    async fn recent(&self, limit: usize) -> Result<Vec<Segment>, DomainError>;

    /// One summary row per collection, grouped by the store
    async fn collections(&self) -> Result<Vec<CollectionSummary>, DomainError>;

    /// Whole-store totals
    async fn stats(&self) -> Result<StoreStats, DomainError>;

    /// Number of segments annotated by `user`
    async fn count_annotated_by(&self, user: &UserRef) -> Result<u64, DomainError>;
}

/// Port for named binary artifacts (raw, canonical and stitched media)
#[async_trait]
pub trait BlobStorePort: Send + Sync {
    /// Absolute path of a named artifact (it may not exist)
    fn path_for(&self, name: &str) -> Result<PathBuf, DomainError>;

    /// Public URL of a named artifact
    fn url_for(&self, name: &str) -> String;

    /// Check whether a named artifact exists
    async fn exists(&self, name: &str) -> Result<bool, DomainError>;

    /// Reserve a scratch path for an artifact about to be produced
    async fn stage(&self, suffix: &str) -> Result<PathBuf, DomainError>;

    /// Atomically move a staged file over the named artifact
    async fn commit(&self, staged: &Path, name: &str) -> Result<(), DomainError>;

    /// Copy an external file in as the named artifact
    async fn import(&self, source: &Path, name: &str) -> Result<(), DomainError>;

    /// Write a small text artifact
    async fn write_text(&self, name: &str, contents: &str) -> Result<(), DomainError>;

    /// Delete a named artifact; missing artifacts are not an error
    async fn delete(&self, name: &str) -> Result<(), DomainError>;

    /// Discard a staged file that will not be committed
    async fn discard(&self, staged: &Path);
}

/// Port for media processing (probe, trim, concatenate)
#[async_trait]
pub trait MediaPort: Send + Sync {
    /// Duration of a media file in seconds
    async fn duration(&self, path: &Path) -> Result<f64, DomainError>;

    /// Write `[start, end]` of `source` to `dest`
    async fn trim(
        &self,
        source: &Path,
        range: &CutRange,
        dest: &Path,
    ) -> Result<(), DomainError>;

    /// Write the sources back to back into `dest`
    async fn concatenate(&self, sources: &[PathBuf], dest: &Path) -> Result<(), DomainError>;

    /// Backend name for diagnostics
    fn backend_name(&self) -> &'static str;
}
