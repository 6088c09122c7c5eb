// Domain models - Segments, annotations and the time ranges used to cut them

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Lowest ordinal a segment may carry within its collection
pub const MIN_ORDINAL: u32 = 1;

/// Width the ordinal token is zero-padded to when formatting identifiers
pub const ORDINAL_WIDTH: usize = 4;

/// Opaque unique identifier of a stored segment
pub type SegmentId = Uuid;

/// Name of an artifact in blob storage, relative to the media root
/// (e.g. `videos/TVRI_SB_061119_0052.mp4`)
pub type MediaRef = String;

/// Opaque reference to the acting user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRef(pub String);

impl UserRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite key of a segment: the collection it belongs to and its position in it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentKey {
    pub collection_key: String,
    pub ordinal: u32,
}

impl SegmentKey {
    pub fn new(collection_key: impl Into<String>, ordinal: u32) -> Self {
        Self {
            collection_key: collection_key.into(),
            ordinal,
        }
    }

    /// Canonical identifier, `{key}_{ordinal:04}`
    pub fn name(&self) -> String {
        format!(
            "{}_{:0width$}",
            self.collection_key,
            self.ordinal,
            width = ORDINAL_WIDTH
        )
    }

    /// Key of the next segment in the collection
    pub fn successor(&self) -> Option<SegmentKey> {
        self.ordinal
            .checked_add(1)
            .map(|ordinal| SegmentKey::new(self.collection_key.clone(), ordinal))
    }

    /// Key of the previous segment, if this one is not the first
    pub fn predecessor(&self) -> Option<SegmentKey> {
        if self.ordinal <= MIN_ORDINAL {
            return None;
        }
        Some(SegmentKey::new(
            self.collection_key.clone(),
            self.ordinal - 1,
        ))
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Free-text annotation fields recorded for a segment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub transcript: Option<String>,
    pub alignment_notes: Option<String>,
    pub problem_notes: Option<String>,
    pub reviewer_comment: Option<String>,
}

/// Partial annotation update; `None` fields leave the stored value untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationUpdate {
    pub transcript: Option<String>,
    pub alignment_notes: Option<String>,
    pub problem_notes: Option<String>,
    pub reviewer_comment: Option<String>,
}

impl AnnotationUpdate {
    pub fn is_empty(&self) -> bool {
        self.transcript.is_none()
            && self.alignment_notes.is_none()
            && self.problem_notes.is_none()
            && self.reviewer_comment.is_none()
    }

    /// Merge supplied fields into an existing annotation
    pub fn merge_into(self, annotation: &mut Annotation) {
        if let Some(transcript) = self.transcript {
            annotation.transcript = Some(transcript);
        }
        if let Some(notes) = self.alignment_notes {
            annotation.alignment_notes = Some(notes);
        }
        if let Some(notes) = self.problem_notes {
            annotation.problem_notes = Some(notes);
        }
        if let Some(comment) = self.reviewer_comment {
            annotation.reviewer_comment = Some(comment);
        }
    }
}

/// One short video clip plus its metadata and annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub collection_key: String,
    pub ordinal: u32,
    /// Upload or batch-import folder the segment arrived with
    pub folder: String,
    pub canonical_media: MediaRef,
    pub raw_media: MediaRef,
    pub stitched_preview: Option<MediaRef>,
    pub stitched_boundary_offset: Option<f64>,
    pub annotation: Annotation,
    pub is_annotated: bool,
    pub annotated_by: Option<UserRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Segment {
    /// Create a freshly ingested, unannotated segment
    pub fn new(
        key: SegmentKey,
        folder: impl Into<String>,
        canonical_media: MediaRef,
        raw_media: MediaRef,
    ) -> Result<Self, DomainError> {
        if key.ordinal < MIN_ORDINAL {
            return Err(DomainError::BadArgs(format!(
                "Ordinal of {} must be at least {}",
                key.name(),
                MIN_ORDINAL
            )));
        }
        if key.collection_key.is_empty() {
            return Err(DomainError::BadArgs(
                "Collection key cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            collection_key: key.collection_key,
            ordinal: key.ordinal,
            folder: folder.into(),
            canonical_media,
            raw_media,
            stitched_preview: None,
            stitched_boundary_offset: None,
            annotation: Annotation::default(),
            is_annotated: false,
            annotated_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn key(&self) -> SegmentKey {
        SegmentKey::new(self.collection_key.clone(), self.ordinal)
    }

    pub fn name(&self) -> String {
        self.key().name()
    }

    /// Record a freshly built stitched preview
    pub fn set_stitch(&mut self, preview: MediaRef, boundary_offset: f64) {
        self.stitched_preview = Some(preview);
        self.stitched_boundary_offset = Some(boundary_offset);
        self.touch();
    }

    /// Drop any cached stitch, returning the stale artifact reference
    pub fn clear_stitch(&mut self) -> Option<MediaRef> {
        self.stitched_boundary_offset = None;
        let stale = self.stitched_preview.take();
        if stale.is_some() {
            self.touch();
        }
        stale
    }

    /// Merge an annotation update and mark the segment annotated by `user`
    pub fn apply_annotation(&mut self, update: AnnotationUpdate, user: Option<UserRef>) {
        update.merge_into(&mut self.annotation);
        self.is_annotated = true;
        self.annotated_by = user;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Parse time string: seconds (`12.5`), `MM:SS.ms` or `HH:MM:SS.ms`
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() {
                return Err(DomainError::BadArgs(format!(
                    "Time must be finite: {}",
                    trimmed
                )));
            }
            if seconds < 0.0 {
                return Err(DomainError::BadArgs("Time cannot be negative".to_string()));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hours, minutes, seconds_part) = match parts.as_slice() {
            [minutes, seconds] => (0, *minutes, *seconds),
            [hours, minutes, seconds] => {
                let hours = hours
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs("Invalid hours format".to_string()))?;
                (hours, *minutes, *seconds)
            }
            _ => {
                return Err(DomainError::BadArgs(
                    "Invalid time format. Supported formats: seconds (e.g., 12.5), MM:SS.ms (e.g., 0:12.5), HH:MM:SS.ms (e.g., 0:00:12.5)".to_string(),
                ))
            }
        };

        let minutes = minutes
            .parse::<u32>()
            .map_err(|_| DomainError::BadArgs("Invalid minutes format".to_string()))?;
        let seconds = seconds_part
            .parse::<f64>()
            .map_err(|_| DomainError::BadArgs("Invalid seconds format".to_string()))?;

        if parts.len() == 3 && minutes >= 60 {
            return Err(DomainError::BadArgs(
                "Minutes must be less than 60".to_string(),
            ));
        }
        if !(0.0..60.0).contains(&seconds) {
            return Err(DomainError::BadArgs(
                "Seconds must be between 0 and 60".to_string(),
            ));
        }

        Ok(Self::from_seconds(
            hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
        ))
    }

    /// Format as HH:MM:SS.ms, or MM:SS.ms below one hour
    pub fn format_hms(&self) -> String {
        let total_millis = (self.seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis % 3_600_000) / 60_000;
        let seconds = (total_millis % 60_000) / 1000;
        let milliseconds = total_millis % 1000;

        if hours > 0 {
            format!(
                "{:02}:{:02}:{:02}.{:03}",
                hours, minutes, seconds, milliseconds
            )
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Cut range inside a source timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutRange {
    pub start: TimeSpec,
    pub end: TimeSpec,
}

impl CutRange {
    /// Create new cut range with validation
    pub fn new(start: TimeSpec, end: TimeSpec) -> Result<Self, DomainError> {
        if !start.seconds.is_finite() || !end.seconds.is_finite() {
            return Err(DomainError::InvalidRange(
                "Cut bounds must be finite".to_string(),
            ));
        }
        if start.seconds < 0.0 {
            return Err(DomainError::InvalidRange(format!(
                "Start time cannot be negative: {}",
                start.seconds
            )));
        }
        if start.seconds >= end.seconds {
            return Err(DomainError::InvalidRange(format!(
                "Start ({:.3}s) must be before end ({:.3}s)",
                start.seconds, end.seconds
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a cut against a source of `source_duration` seconds.
    ///
    /// An `end` past the source is pulled back to `source_duration - epsilon`;
    /// the range is rejected if nothing is left after that.
    pub fn clamp_to(
        start: f64,
        end: f64,
        source_duration: f64,
        epsilon: f64,
    ) -> Result<Self, DomainError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(DomainError::InvalidRange(
                "Cut bounds must be finite".to_string(),
            ));
        }
        let end = if end > source_duration {
            source_duration - epsilon
        } else {
            end
        };
        Self::new(TimeSpec::from_seconds(start), TimeSpec::from_seconds(end))
    }

    /// Get duration of cut range
    pub fn duration(&self) -> TimeSpec {
        TimeSpec::from_seconds(self.end.seconds - self.start.seconds)
    }
}

/// Result of asking for the editing surface of a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StitchedPreview {
    pub preview_ref: MediaRef,
    /// Position in the preview where the segment ends and its successor begins
    pub boundary_offset: Option<f64>,
    pub is_single_segment: bool,
}

/// Result of re-splitting a segment at a cut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutOutcome {
    pub kept_ref: MediaRef,
    pub remainder_ref: Option<MediaRef>,
    pub kept_range: CutRange,
}

/// One row of the grouped collection listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub collection_key: String,
    pub segment_count: u64,
    pub annotated_count: u64,
    pub first_ordinal: u32,
    pub last_ordinal: u32,
}

impl CollectionSummary {
    /// Ordinals missing between the first and last stored segment
    pub fn gap_count(&self) -> u64 {
        let span = (self.last_ordinal - self.first_ordinal) as u64 + 1;
        span.saturating_sub(self.segment_count)
    }
}

/// Aggregate counts over the whole store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_segments: u64,
    pub annotated_segments: u64,
}

/// Dashboard figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_segments: u64,
    pub annotated_segments: u64,
    pub average_duration_minutes: f64,
    pub sampled_segments: usize,
}

/// Per-annotator figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user: UserRef,
    pub annotated_segments: u64,
}
