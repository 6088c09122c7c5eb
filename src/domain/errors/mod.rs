// Domain errors - Error taxonomy for segment stitching, re-splitting and annotation

use thiserror::Error;

/// Domain-specific error types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    /// Segment identifier does not follow the `{key}_{ordinal}` convention
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),
    /// No segment stored for the requested identifier
    #[error("Segment not found: {0}")]
    NotFound(String),
    /// Cut bounds are nonsensical after clamping
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    /// Expected media artifact is missing from blob storage
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    /// External encode/decode failure
    #[error("Media processing error: {0}")]
    MediaProcessing(String),
    /// A segment already occupies this collection key and ordinal
    #[error("Duplicate segment: {0}")]
    Duplicate(String),
    /// Persistence or blob storage failure
    #[error("Storage error: {0}")]
    Storage(String),
    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),
}

impl DomainError {
    /// Short machine-readable name of the variant, used in CLI JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::MalformedIdentifier(_) => "malformed_identifier",
            DomainError::NotFound(_) => "not_found",
            DomainError::InvalidRange(_) => "invalid_range",
            DomainError::SourceUnavailable(_) => "source_unavailable",
            DomainError::MediaProcessing(_) => "media_processing",
            DomainError::Duplicate(_) => "duplicate",
            DomainError::Storage(_) => "storage",
            DomainError::BadArgs(_) => "bad_args",
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Storage(err.to_string())
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(err: rusqlite::Error) -> Self {
        DomainError::Storage(err.to_string())
    }
}
