// Re-split interactor - Moves the boundary between a segment and its successor

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::app::locks::CollectionLocks;
use crate::app::{
    discard_artifact, find_predecessor, find_segment, find_successor, invalidate_stitch,
    require_artifact,
};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Interactor for the re-split use case
pub struct ResplitInteractor {
    store: Arc<dyn SegmentStorePort>,
    blobs: Arc<dyn BlobStorePort>,
    media: Arc<dyn MediaPort>,
    locks: Arc<CollectionLocks>,
    epsilon: f64,
}

impl ResplitInteractor {
    /// Create new re-split interactor with injected ports
    pub fn new(
        store: Arc<dyn SegmentStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        media: Arc<dyn MediaPort>,
        locks: Arc<CollectionLocks>,
        epsilon: f64,
    ) -> Self {
        Self {
            store,
            blobs,
            media,
            locks,
            epsilon,
        }
    }

    /// Keep `[start, end]` of the segment's editing source as its new media and
    /// push the tail after `end` into the successor.
    ///
    /// The kept commit lands before the remainder commit. If the second one
    /// fails the segment is trimmed while the successor keeps its old media.
    #[instrument(skip(self))]
    pub async fn apply_cut(
        &self,
        identifier: &str,
        start: f64,
        end: f64,
    ) -> Result<CutOutcome, DomainError> {
        let key = SequenceResolver::parse(identifier)?;
        // Clamping only ever lowers `end`, so reject what can never be valid up front
        CutRange::new(TimeSpec::from_seconds(start), TimeSpec::from_seconds(end))?;

        let _guard = self.locks.acquire(&key.collection_key).await;

        let mut segment = find_segment(&*self.store, &key).await?;
        let mut successor = find_successor(&*self.store, &key).await?;

        let source = self.cut_source(&segment).await?;
        let source_path = self.blobs.path_for(source.media_ref())?;
        let source_duration = self.media.duration(&source_path).await?;

        let kept = CutRange::clamp_to(start, end, source_duration, self.epsilon)?;
        let remainder = successor
            .as_ref()
            .and_then(|_| remainder_range(&source, &kept, source_duration));

        info!(
            "Cutting {} at [{:.3}, {:.3}] of {} ({:.3}s), remainder {}",
            segment.name(),
            kept.start.seconds,
            kept.end.seconds,
            source.media_ref(),
            source_duration,
            remainder
                .map(|r| format!("[{:.3}, {:.3}]", r.start.seconds, r.end.seconds))
                .unwrap_or_else(|| "none".to_string())
        );

        // Encode everything before committing anything
        let staged_kept = self
            .encode(&source_path, &kept, &segment.canonical_media)
            .await?;
        let staged_remainder = match (&remainder, &successor) {
            (Some(range), Some(next)) => {
                match self.encode(&source_path, range, &next.canonical_media).await {
                    Ok(staged) => Some(staged),
                    Err(e) => {
                        self.blobs.discard(&staged_kept).await;
                        return Err(e);
                    }
                }
            }
            _ => None,
        };

        if let Err(e) = self.blobs.commit(&staged_kept, &segment.canonical_media).await {
            self.blobs.discard(&staged_kept).await;
            if let Some(staged) = &staged_remainder {
                self.blobs.discard(staged).await;
            }
            return Err(e);
        }

        let mut remainder_result = Ok(None);
        if let (Some(staged), Some(next)) = (&staged_remainder, &successor) {
            remainder_result = match self.blobs.commit(staged, &next.canonical_media).await {
                Ok(()) => Ok(Some(next.canonical_media.clone())),
                Err(e) => {
                    warn!(
                        "{} trimmed but pushing the remainder into {} failed: {}",
                        segment.name(),
                        next.name(),
                        e
                    );
                    self.blobs.discard(staged).await;
                    Err(e)
                }
            };
        }

        // Both canonicals may have changed, so every stitch covering them is stale
        self.invalidate_neighbourhood(&key, &mut segment, successor.as_mut())
            .await?;

        let remainder_ref = remainder_result?;
        Ok(CutOutcome {
            kept_ref: segment.canonical_media.clone(),
            remainder_ref,
            kept_range: kept,
        })
    }

    /// Stitched preview when one is committed, otherwise the raw capture
    async fn cut_source(&self, segment: &Segment) -> Result<CutSource, DomainError> {
        if let Some(preview) = &segment.stitched_preview {
            if self.blobs.exists(preview).await? {
                return Ok(CutSource::Stitched {
                    preview: preview.clone(),
                    boundary: segment.stitched_boundary_offset,
                });
            }
            warn!(
                "Stitched preview {} of {} is missing, falling back to raw media",
                preview,
                segment.name()
            );
        }

        require_artifact(&*self.blobs, &segment.raw_media).await?;
        Ok(CutSource::Raw(segment.raw_media.clone()))
    }

    /// Trim `range` of `source` into a staged file shaped like `target`
    async fn encode(
        &self,
        source: &Path,
        range: &CutRange,
        target: &str,
    ) -> Result<PathBuf, DomainError> {
        let suffix = PathUtils::get_extension(Path::new(target))
            .map(|ext| format!(".{}", ext))
            .unwrap_or_else(|| ".mp4".to_string());
        let staged = self.blobs.stage(&suffix).await?;

        if let Err(e) = self.media.trim(source, range, &staged).await {
            self.blobs.discard(&staged).await;
            return Err(e);
        }
        Ok(staged)
    }

    async fn invalidate_neighbourhood(
        &self,
        key: &SegmentKey,
        segment: &mut Segment,
        successor: Option<&mut Segment>,
    ) -> Result<(), DomainError> {
        if let Some(mut predecessor) = find_predecessor(&*self.store, key).await? {
            invalidate_stitch(&*self.store, &*self.blobs, &mut predecessor).await?;
        }

        let stale = segment.clear_stitch();
        segment.touch();
        self.store.update_stitch(segment).await?;
        if let Some(stale) = stale {
            discard_artifact(&*self.blobs, &stale).await;
        }

        if let Some(successor) = successor {
            let stale = successor.clear_stitch();
            successor.touch();
            self.store.update_stitch(successor).await?;
            if let Some(stale) = stale {
                discard_artifact(&*self.blobs, &stale).await;
            }
        }
        Ok(())
    }
}
