// Mock media adapter - JSON span manifests standing in for encoded video
//
// A "clip" is a list of spans of labelled source footage. Trimming selects the
// part of the timeline that overlaps the range, concatenation appends span
// lists, and the duration is the sum of span lengths. Tests can assert exactly
// which footage ended up where.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Spans shorter than this are dropped when trimming
const MIN_SPAN_SECS: f64 = 1e-9;

/// A run of footage taken from `source` between `start` and `end` seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub source: String,
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SpanManifest {
    spans: Vec<Span>,
}

/// Media backend that never touches real video
#[derive(Default)]
pub struct MockMediaAdapter {
    fail_concat: AtomicBool,
    fail_trim: AtomicBool,
    trim_delay_ms: AtomicU64,
}

impl MockMediaAdapter {
    /// Create new mock media adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following concatenation fail
    pub fn set_fail_concat(&self, fail: bool) {
        self.fail_concat.store(fail, Ordering::SeqCst);
    }

    /// Make every following trim fail
    pub fn set_fail_trim(&self, fail: bool) {
        self.fail_trim.store(fail, Ordering::SeqCst);
    }

    /// Make every following trim take at least `delay`, like a real encode
    pub fn set_trim_delay(&self, delay: Duration) {
        self.trim_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Write a single-span clip of `label` footage lasting `duration` seconds
    pub fn write_clip(path: &Path, label: &str, duration: f64) -> Result<(), DomainError> {
        Self::save(
            path,
            &[Span {
                source: label.to_string(),
                start: 0.0,
                end: duration,
            }],
        )
    }

    /// Read back the spans of a clip
    pub fn spans(path: &Path) -> Result<Vec<Span>, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::MediaProcessing(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let manifest: SpanManifest = serde_json::from_str(&content).map_err(|e| {
            DomainError::MediaProcessing(format!("Invalid media {}: {}", path.display(), e))
        })?;
        Ok(manifest.spans)
    }

    fn save(path: &Path, spans: &[Span]) -> Result<(), DomainError> {
        let manifest = SpanManifest {
            spans: spans.to_vec(),
        };
        let content = serde_json::to_string_pretty(&manifest)
            .map_err(|e| DomainError::MediaProcessing(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| {
            DomainError::MediaProcessing(format!("Cannot write {}: {}", path.display(), e))
        })
    }

    /// Select the part of a span list that overlaps `[start, end]` on its timeline
    fn select(spans: &[Span], start: f64, end: f64) -> Vec<Span> {
        let mut selected = Vec::new();
        let mut offset = 0.0;

        for span in spans {
            let span_start = offset;
            let span_end = offset + span.length();
            offset = span_end;

            let from = start.max(span_start);
            let to = end.min(span_end);
            if to - from <= MIN_SPAN_SECS {
                continue;
            }

            selected.push(Span {
                source: span.source.clone(),
                start: span.start + (from - span_start),
                end: span.start + (to - span_start),
            });
        }

        selected
    }
}

#[async_trait]
impl MediaPort for MockMediaAdapter {
    async fn duration(&self, path: &Path) -> Result<f64, DomainError> {
        Ok(Self::spans(path)?.iter().map(Span::length).sum())
    }

    async fn trim(&self, source: &Path, range: &CutRange, dest: &Path) -> Result<(), DomainError> {
        if self.fail_trim.load(Ordering::SeqCst) {
            return Err(DomainError::MediaProcessing("Injected trim failure".to_string()));
        }
        let delay = self.trim_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let spans = Self::spans(source)?;
        let selected = Self::select(&spans, range.start.seconds, range.end.seconds);
        debug!(
            "Mock trim {} [{}..{}] -> {} spans",
            source.display(),
            range.start,
            range.end,
            selected.len()
        );
        Self::save(dest, &selected)
    }

    async fn concatenate(&self, sources: &[PathBuf], dest: &Path) -> Result<(), DomainError> {
        if self.fail_concat.load(Ordering::SeqCst) {
            return Err(DomainError::MediaProcessing(
                "Injected concatenation failure".to_string(),
            ));
        }
        if sources.is_empty() {
            return Err(DomainError::MediaProcessing("Nothing to concatenate".to_string()));
        }

        let mut joined = Vec::new();
        for source in sources {
            joined.extend(Self::spans(source)?);
        }
        Self::save(dest, &joined)
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn range(start: f64, end: f64) -> CutRange {
        CutRange::new(TimeSpec::from_seconds(start), TimeSpec::from_seconds(end)).unwrap()
    }

    #[tokio::test]
    async fn test_concat_then_trim_across_boundary() {
        let dir = TempDir::new().unwrap();
        let media = MockMediaAdapter::new();
        let a = dir.path().join("a.mp4");
        let b = dir.path().join("b.mp4");
        let joined = dir.path().join("ab.mp4");
        let cut = dir.path().join("cut.mp4");
        MockMediaAdapter::write_clip(&a, "A", 10.0).unwrap();
        MockMediaAdapter::write_clip(&b, "B", 8.0).unwrap();

        media.concatenate(&[a, b], &joined).await.unwrap();
        assert_eq!(media.duration(&joined).await.unwrap(), 18.0);

        media.trim(&joined, &range(3.0, 12.0), &cut).await.unwrap();
        let spans = MockMediaAdapter::spans(&cut).unwrap();
        assert_eq!(
            spans,
            vec![
                Span { source: "A".to_string(), start: 3.0, end: 10.0 },
                Span { source: "B".to_string(), start: 0.0, end: 2.0 },
            ]
        );
        assert_eq!(media.duration(&cut).await.unwrap(), 9.0);
    }

    #[tokio::test]
    async fn test_trim_past_end_keeps_what_exists() {
        let dir = TempDir::new().unwrap();
        let media = MockMediaAdapter::new();
        let a = dir.path().join("a.mp4");
        let out = dir.path().join("out.mp4");
        MockMediaAdapter::write_clip(&a, "A", 5.0).unwrap();

        media.trim(&a, &range(4.0, 9.0), &out).await.unwrap();
        assert_eq!(media.duration(&out).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_unreadable_input_is_media_processing() {
        let dir = TempDir::new().unwrap();
        let media = MockMediaAdapter::new();
        let garbage = dir.path().join("garbage.mp4");
        std::fs::write(&garbage, b"\x00\x01not json").unwrap();

        let err = media.duration(&garbage).await.unwrap_err();
        assert!(matches!(err, DomainError::MediaProcessing(_)));
    }

    #[tokio::test]
    async fn test_injected_concat_failure() {
        let dir = TempDir::new().unwrap();
        let media = MockMediaAdapter::new();
        let a = dir.path().join("a.mp4");
        MockMediaAdapter::write_clip(&a, "A", 1.0).unwrap();
        media.set_fail_concat(true);

        let dest = dir.path().join("out.mp4");
        assert!(media.concatenate(&[a], &dest).await.is_err());
        assert!(!dest.exists());
    }
}
