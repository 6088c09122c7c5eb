// Browse interactor - Read side: lookups, listings, navigation and dashboard figures

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::app::{find_predecessor, find_segment, find_successor};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// How many recent segments the dashboard samples for the average duration
pub const DASHBOARD_SAMPLE: usize = 20;

/// Interactor for read-only queries
pub struct BrowseInteractor {
    store: Arc<dyn SegmentStorePort>,
    blobs: Arc<dyn BlobStorePort>,
    media: Arc<dyn MediaPort>,
}

impl BrowseInteractor {
    /// Create new browse interactor with injected ports
    pub fn new(
        store: Arc<dyn SegmentStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        media: Arc<dyn MediaPort>,
    ) -> Self {
        Self {
            store,
            blobs,
            media,
        }
    }

    pub async fn details(&self, identifier: &str) -> Result<Segment, DomainError> {
        let key = SequenceResolver::parse(identifier)?;
        find_segment(&*self.store, &key).await
    }

    /// Stored segment after `identifier`; `None` for the last one
    pub async fn resolve_successor(&self, identifier: &str) -> Result<Option<Segment>, DomainError> {
        let key = SequenceResolver::parse(identifier)?;
        find_successor(&*self.store, &key).await
    }

    /// Stored segment before `identifier`; `None` for the first one
    pub async fn resolve_predecessor(
        &self,
        identifier: &str,
    ) -> Result<Option<Segment>, DomainError> {
        let key = SequenceResolver::parse(identifier)?;
        find_predecessor(&*self.store, &key).await
    }

    /// First unannotated segment after `identifier` in its collection
    pub async fn next_unannotated(&self, identifier: &str) -> Result<Option<Segment>, DomainError> {
        let key = SequenceResolver::parse(identifier)?;
        let segments = self.store.list_collection(&key.collection_key).await?;
        Ok(segments
            .into_iter()
            .find(|s| s.ordinal > key.ordinal && !s.is_annotated))
    }

    pub async fn collections(&self) -> Result<Vec<CollectionSummary>, DomainError> {
        self.store.collections().await
    }

    pub async fn list_collection(&self, collection_key: &str) -> Result<Vec<Segment>, DomainError> {
        self.store.list_collection(collection_key).await
    }

    pub async fn list_folder(&self, folder: &str) -> Result<Vec<Segment>, DomainError> {
        self.store.list_folder(folder).await
    }

    pub async fn list_by_status(
        &self,
        annotated: bool,
        limit: usize,
    ) -> Result<Vec<Segment>, DomainError> {
        self.store.list_by_status(annotated, limit).await
    }

    pub async fn search(
        &self,
        folder: Option<&str>,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Segment>, DomainError> {
        self.store.search(folder, query.trim(), limit).await
    }

    /// Totals plus the average duration, in minutes, of recent segments.
    /// Segments whose media cannot be probed are left out of the average.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardStats, DomainError> {
        let stats = self.store.stats().await?;

        let mut total_seconds = 0.0;
        let mut sampled = 0;
        for segment in self.store.recent(DASHBOARD_SAMPLE).await? {
            let duration = match self.blobs.path_for(&segment.canonical_media) {
                Ok(path) => self.media.duration(&path).await,
                Err(e) => Err(e),
            };
            match duration {
                Ok(seconds) => {
                    total_seconds += seconds;
                    sampled += 1;
                }
                Err(e) => debug!("Leaving {} out of the average: {}", segment.name(), e),
            }
        }

        let average_duration_minutes = if sampled > 0 {
            (total_seconds / 60.0 / sampled as f64 * 10.0).round() / 10.0
        } else {
            0.0
        };

        Ok(DashboardStats {
            total_segments: stats.total_segments,
            annotated_segments: stats.annotated_segments,
            average_duration_minutes,
            sampled_segments: sampled,
        })
    }

    pub async fn user_stats(&self, user: &UserRef) -> Result<UserStats, DomainError> {
        Ok(UserStats {
            user: user.clone(),
            annotated_segments: self.store.count_annotated_by(user).await?,
        })
    }

    /// Public URL of an artifact
    pub fn media_url(&self, media: &str) -> String {
        self.blobs.url_for(media)
    }
}
