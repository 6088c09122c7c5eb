// Application layer - Use case interactors

use std::path::PathBuf;

use tracing::warn;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

pub mod annotate_interactor;
pub mod browse_interactor;
pub mod container;
pub mod ingest_interactor;
pub mod locks;
pub mod resplit_interactor;
pub mod stitch_interactor;

// Re-export interactors
pub use annotate_interactor::AnnotateInteractor;
pub use browse_interactor::BrowseInteractor;
pub use container::{AppContainer, DefaultAppContainer};
pub use ingest_interactor::{ImportReport, IngestInteractor};
pub use locks::CollectionLocks;
pub use resplit_interactor::ResplitInteractor;
pub use stitch_interactor::StitchInteractor;

/// Load the segment stored under `key`
pub(crate) async fn find_segment(
    store: &dyn SegmentStorePort,
    key: &SegmentKey,
) -> Result<Segment, DomainError> {
    store
        .find_by_key(key)
        .await?
        .ok_or_else(|| DomainError::NotFound(key.name()))
}

/// Load the segment after `key`, if one is stored
pub(crate) async fn find_successor(
    store: &dyn SegmentStorePort,
    key: &SegmentKey,
) -> Result<Option<Segment>, DomainError> {
    match key.successor() {
        Some(next) => store.find_by_key(&next).await,
        None => Ok(None),
    }
}

/// Load the segment before `key`, if one is stored
pub(crate) async fn find_predecessor(
    store: &dyn SegmentStorePort,
    key: &SegmentKey,
) -> Result<Option<Segment>, DomainError> {
    match key.predecessor() {
        Some(previous) => store.find_by_key(&previous).await,
        None => Ok(None),
    }
}

/// Path of an artifact that must already be committed
pub(crate) async fn require_artifact(
    blobs: &dyn BlobStorePort,
    name: &str,
) -> Result<PathBuf, DomainError> {
    if !blobs.exists(name).await? {
        return Err(DomainError::SourceUnavailable(format!(
            "{} is missing from media storage",
            name
        )));
    }
    blobs.path_for(name)
}

/// Delete an artifact that no record points at any more; failures are only logged
pub(crate) async fn discard_artifact(blobs: &dyn BlobStorePort, name: &str) {
    if let Err(e) = blobs.delete(name).await {
        warn!("Failed to delete stale artifact {}: {}", name, e);
    }
}

/// Drop the cached stitch of `segment`, persisting the change and deleting the
/// stale artifact. No-op when nothing is cached.
pub(crate) async fn invalidate_stitch(
    store: &dyn SegmentStorePort,
    blobs: &dyn BlobStorePort,
    segment: &mut Segment,
) -> Result<(), DomainError> {
    if let Some(stale) = segment.clear_stitch() {
        store.update_stitch(segment).await?;
        discard_artifact(blobs, &stale).await;
    }
    Ok(())
}
