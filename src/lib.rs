//! SignClip Library
//!
//! Stores short sign-language video segments named `{collection}_{ordinal}`,
//! stitches each segment with its successor into an editing preview, moves the
//! boundary between the two at a user-chosen cut and records annotations.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use adapters::toml_config::Settings;
pub use app::container::{AppContainer, DefaultAppContainer};
pub use domain::errors::DomainError;
pub use domain::model::{
    Annotation, AnnotationUpdate, CutOutcome, CutRange, Segment, SegmentKey, StitchedPreview,
    TimeSpec, UserRef,
};
pub use domain::rules::SequenceResolver;
pub use error::{SignClipError, SignClipResult};
