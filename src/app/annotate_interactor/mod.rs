// Annotate interactor - Annotation ledger and dataset export

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::app::find_segment;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Blob-store directory holding mirrored transcripts
pub const TRANSCRIPTS_DIR: &str = "transcripts";

/// Blob name of the mirrored transcript of a segment
pub fn transcript_name(segment_name: &str) -> MediaRef {
    format!("{}/{}.txt", TRANSCRIPTS_DIR, segment_name)
}

/// One exported segment
#[derive(Debug, Serialize)]
pub struct ExportRecord<'a> {
    pub identifier: String,
    pub collection_key: &'a str,
    pub ordinal: u32,
    pub folder: &'a str,
    pub media: &'a str,
    pub is_annotated: bool,
    pub annotated_by: Option<&'a UserRef>,
    #[serde(flatten)]
    pub annotation: &'a Annotation,
}

/// Interactor for the annotation use case
pub struct AnnotateInteractor {
    store: Arc<dyn SegmentStorePort>,
    blobs: Arc<dyn BlobStorePort>,
    mirror_transcripts: bool,
}

impl AnnotateInteractor {
    /// Create new annotate interactor with injected ports
    pub fn new(
        store: Arc<dyn SegmentStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        mirror_transcripts: bool,
    ) -> Self {
        Self {
            store,
            blobs,
            mirror_transcripts,
        }
    }

    /// Merge the supplied fields and mark the segment annotated by `user`.
    ///
    /// Omitted fields keep their stored value. Every successful save sets the
    /// annotated flag, even an empty one.
    #[instrument(skip(self, update))]
    pub async fn save_annotation(
        &self,
        identifier: &str,
        update: AnnotationUpdate,
        user: Option<UserRef>,
    ) -> Result<Segment, DomainError> {
        let key = SequenceResolver::parse(identifier)?;
        let mut segment = find_segment(&*self.store, &key).await?;

        let transcript_changed = update.transcript.is_some();
        segment.apply_annotation(update, user);
        self.store.update_annotation(&segment).await?;

        if self.mirror_transcripts && transcript_changed {
            self.mirror_transcript(&segment).await;
        }

        info!(
            "Saved annotation for {} by {}",
            segment.name(),
            segment
                .annotated_by
                .as_ref()
                .map(UserRef::as_str)
                .unwrap_or("anonymous")
        );
        Ok(segment)
    }

    async fn mirror_transcript(&self, segment: &Segment) {
        let Some(transcript) = &segment.annotation.transcript else {
            return;
        };
        let name = transcript_name(&segment.name());
        if let Err(e) = self.blobs.write_text(&name, transcript).await {
            warn!("Failed to mirror transcript of {}: {}", segment.name(), e);
        }
    }

    /// Write every segment with its annotation as a pretty JSON array.
    /// Returns the number of exported segments.
    #[instrument(skip(self, writer))]
    pub async fn export(&self, writer: &mut dyn Write) -> Result<usize, DomainError> {
        let mut segments = Vec::new();
        for collection in self.store.collections().await? {
            segments.extend(self.store.list_collection(&collection.collection_key).await?);
        }

        let records: Vec<ExportRecord<'_>> = segments
            .iter()
            .map(|segment| ExportRecord {
                identifier: segment.name(),
                collection_key: &segment.collection_key,
                ordinal: segment.ordinal,
                folder: &segment.folder,
                media: &segment.canonical_media,
                is_annotated: segment.is_annotated,
                annotated_by: segment.annotated_by.as_ref(),
                annotation: &segment.annotation,
            })
            .collect();

        serde_json::to_writer_pretty(&mut *writer, &records)
            .map_err(|e| DomainError::Storage(format!("Failed to write export: {}", e)))?;
        writeln!(writer)?;

        info!("Exported {} segments", records.len());
        Ok(records.len())
    }
}
