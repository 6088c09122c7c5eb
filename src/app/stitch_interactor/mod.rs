// Stitch interactor - Builds the segment + successor editing preview

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::app::locks::CollectionLocks;
use crate::app::{discard_artifact, find_segment, find_successor, require_artifact};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Blob-store directory holding stitched previews
pub const STITCHED_DIR: &str = "stitched";

/// Interactor for the stitched preview use case
pub struct StitchInteractor {
    store: Arc<dyn SegmentStorePort>,
    blobs: Arc<dyn BlobStorePort>,
    media: Arc<dyn MediaPort>,
    locks: Arc<CollectionLocks>,
}

impl StitchInteractor {
    /// Create new stitch interactor with injected ports
    pub fn new(
        store: Arc<dyn SegmentStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        media: Arc<dyn MediaPort>,
        locks: Arc<CollectionLocks>,
    ) -> Self {
        Self {
            store,
            blobs,
            media,
            locks,
        }
    }

    /// Return the cached preview of `identifier` and its successor, building it
    /// if needed. A segment without a stored successor degrades to its own
    /// canonical media.
    #[instrument(skip(self))]
    pub async fn ensure_stitched(&self, identifier: &str) -> Result<StitchedPreview, DomainError> {
        let key = SequenceResolver::parse(identifier)?;
        let _guard = self.locks.acquire(&key.collection_key).await;
        self.ensure_stitched_locked(&key).await
    }

    async fn ensure_stitched_locked(&self, key: &SegmentKey) -> Result<StitchedPreview, DomainError> {
        let mut segment = find_segment(&*self.store, key).await?;

        if let Some(preview) = &segment.stitched_preview {
            if self.blobs.exists(preview).await? {
                debug!("Stitch cache hit for {}", segment.name());
                return Ok(StitchedPreview {
                    preview_ref: preview.clone(),
                    boundary_offset: segment.stitched_boundary_offset,
                    is_single_segment: false,
                });
            }
            debug!("Cached stitch {} for {} is gone, rebuilding", preview, segment.name());
        }

        let Some(successor) = find_successor(&*self.store, key).await? else {
            require_artifact(&*self.blobs, &segment.canonical_media).await?;
            debug!("{} has no successor, using its own media", segment.name());
            return Ok(StitchedPreview {
                preview_ref: segment.canonical_media.clone(),
                boundary_offset: None,
                is_single_segment: true,
            });
        };

        let first = require_artifact(&*self.blobs, &segment.canonical_media).await?;
        let second = require_artifact(&*self.blobs, &successor.canonical_media).await?;
        let boundary_offset = self.media.duration(&first).await?;

        let staged = self.blobs.stage(".mp4").await?;
        if let Err(e) = self.media.concatenate(&[first, second], &staged).await {
            self.blobs.discard(&staged).await;
            return Err(e);
        }

        let preview_ref = stitched_name(&segment.name());
        if let Err(e) = self.blobs.commit(&staged, &preview_ref).await {
            self.blobs.discard(&staged).await;
            return Err(e);
        }

        segment.set_stitch(preview_ref.clone(), boundary_offset);
        if let Err(e) = self.store.update_stitch(&segment).await {
            discard_artifact(&*self.blobs, &preview_ref).await;
            return Err(e);
        }

        info!(
            "Stitched {} + {} into {} (boundary {:.3}s)",
            segment.name(),
            successor.name(),
            preview_ref,
            boundary_offset
        );
        Ok(StitchedPreview {
            preview_ref,
            boundary_offset: Some(boundary_offset),
            is_single_segment: false,
        })
    }
}

/// Fresh artifact name for a stitched preview; never reused across rebuilds
fn stitched_name(segment_name: &str) -> MediaRef {
    format!(
        "{}/{}_{}.mp4",
        STITCHED_DIR,
        segment_name,
        Uuid::new_v4().simple()
    )
}
