// Domain rules - Naming convention that ties flat clip files into ordered collections

use crate::domain::errors::*;
use crate::domain::model::*;

/// Video file extensions stripped from upload titles before parsing
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi"];

/// Resolves `{collection_key}_{ordinal}` identifiers.
///
/// Pure: performs no I/O. Whether the neighbour actually exists is a question
/// for the segment store.
pub struct SequenceResolver;

impl SequenceResolver {
    /// Split an identifier into collection key and ordinal
    pub fn parse(identifier: &str) -> Result<SegmentKey, DomainError> {
        let stem = Self::strip_extension(identifier.trim());

        let (key, token) = stem.rsplit_once('_').ok_or_else(|| {
            DomainError::MalformedIdentifier(format!(
                "{}: expected KEY_NNNN",
                identifier
            ))
        })?;

        if key.is_empty() {
            return Err(DomainError::MalformedIdentifier(format!(
                "{}: empty collection key",
                identifier
            )));
        }
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::MalformedIdentifier(format!(
                "{}: trailing token '{}' is not a number",
                identifier, token
            )));
        }

        let ordinal = token.parse::<u32>().map_err(|_| {
            DomainError::MalformedIdentifier(format!(
                "{}: ordinal '{}' out of range",
                identifier, token
            ))
        })?;

        Ok(SegmentKey::new(key, ordinal))
    }

    /// Identifier of the next segment (`None` only if the ordinal would overflow)
    pub fn successor(identifier: &str) -> Result<Option<String>, DomainError> {
        Ok(Self::parse(identifier)?.successor().map(|key| key.name()))
    }

    /// Identifier of the previous segment, `None` for the first ordinal
    pub fn predecessor(identifier: &str) -> Result<Option<String>, DomainError> {
        Ok(Self::parse(identifier)?.predecessor().map(|key| key.name()))
    }

    fn strip_extension(identifier: &str) -> &str {
        if let Some((stem, ext)) = identifier.rsplit_once('.') {
            let ext = ext.to_ascii_lowercase();
            if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
                return stem;
            }
        }
        identifier
    }
}

/// Cut ends closer than this to the recorded boundary count as on it
pub const BOUNDARY_TOLERANCE_SECS: f64 = 1e-3;

/// Whether a file name carries one of the recognised video extensions
pub fn is_video_file(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Where the re-splitter reads its footage from
#[derive(Debug, Clone, PartialEq)]
pub enum CutSource {
    /// Committed concatenation of the segment and its successor
    Stitched { preview: MediaRef, boundary: Option<f64> },
    /// Never-trimmed capture of the segment alone
    Raw(MediaRef),
}

impl CutSource {
    pub fn media_ref(&self) -> &MediaRef {
        match self {
            CutSource::Stitched { preview, .. } => preview,
            CutSource::Raw(raw) => raw,
        }
    }
}

/// Decides whether the tail of a cut is pushed into the successor.
///
/// Only a stitched source contains successor footage. Any non-empty tail
/// `[end, duration]` is pushed, including the short one left by clamping.
/// A cut ending on the recorded boundary leaves the successor's content as
/// it is, so nothing is rewritten.
pub fn remainder_range(
    source: &CutSource,
    kept: &CutRange,
    source_duration: f64,
) -> Option<CutRange> {
    let boundary = match source {
        CutSource::Stitched { boundary, .. } => *boundary,
        CutSource::Raw(_) => return None,
    };

    let remainder_start = kept.end.seconds;
    if source_duration - remainder_start <= 0.0 {
        return None;
    }
    if let Some(boundary) = boundary {
        if (remainder_start - boundary).abs() < BOUNDARY_TOLERANCE_SECS {
            return None;
        }
    }

    CutRange::new(
        TimeSpec::from_seconds(remainder_start),
        TimeSpec::from_seconds(source_duration),
    )
    .ok()
}

#[cfg(test)]
mod tests;
