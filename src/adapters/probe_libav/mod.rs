// Probe LibAV adapter - Media duration through libav, no ffprobe process

use std::path::Path;

use ffmpeg_next as ffmpeg;

use crate::domain::errors::*;

/// LibAV-based duration probe
pub struct ProbeLibavAdapter;

impl ProbeLibavAdapter {
    /// Create new LibAV probing adapter
    pub fn new() -> Result<Self, DomainError> {
        ffmpeg::init().map_err(|e| {
            DomainError::MediaProcessing(format!("Failed to initialize libav: {}", e))
        })?;
        Ok(Self)
    }

    /// Container duration in seconds. Blocking; call from `spawn_blocking`.
    pub fn duration(&self, path: &Path) -> Result<f64, DomainError> {
        let ictx = ffmpeg::format::input(&path).map_err(|e| {
            DomainError::MediaProcessing(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let duration = ictx.duration();
        if duration <= 0 {
            return Err(DomainError::MediaProcessing(format!(
                "No duration recorded in {}",
                path.display()
            )));
        }

        Ok(duration as f64 / ffmpeg::ffi::AV_TIME_BASE as f64)
    }
}
