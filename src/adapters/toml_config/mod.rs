// TOML config adapter - Typed settings loaded from and saved to TOML files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SignClipError, SignClipResult};

/// Media backends the container knows how to build
pub const MEDIA_BACKENDS: &[&str] = &["ffmpeg", "mock"];

/// Log levels accepted by `logging.level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Highest CRF libx264 accepts
const MAX_CRF: u8 = 51;

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub media: MediaSettings,
    pub logging: LoggingSettings,
    pub annotation: AnnotationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory of raw, canonical, stitched and transcript artifacts
    pub media_root: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// Prefix used when rendering artifact URLs
    pub base_url: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            database: PathBuf::from("signclip.db"),
            base_url: "/media".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// `ffmpeg` or `mock`
    pub backend: String,
    pub ffmpeg: String,
    pub ffprobe: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub crf: u8,
    /// Encoder threads; all cores when unset
    pub threads: Option<usize>,
    /// How far inside the source an over-long cut end is pulled back
    pub cut_epsilon_secs: f64,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            backend: "ffmpeg".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
            threads: None,
            cut_epsilon_secs: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationSettings {
    /// User recorded as annotator when none is given on the command line
    pub default_user: Option<String>,
    /// Also write each saved transcript to `transcripts/{name}.txt`
    pub mirror_transcripts: bool,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            default_user: None,
            mirror_transcripts: true,
        }
    }
}

impl Settings {
    /// Parse settings from TOML; missing keys take their defaults
    pub fn from_toml_str(content: &str, origin: &str) -> SignClipResult<Self> {
        toml::from_str(content).map_err(|source| SignClipError::ConfigParse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> SignClipResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Render settings as TOML
    pub fn to_toml_string(&self) -> SignClipResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write settings to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> SignClipResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_toml_string()?)?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Reject values the application cannot run with
    pub fn validate(&self) -> SignClipResult<()> {
        if !MEDIA_BACKENDS.contains(&self.media.backend.as_str()) {
            return Err(SignClipError::invalid_setting(
                "media.backend",
                format!(
                    "unknown backend '{}', expected one of {}",
                    self.media.backend,
                    MEDIA_BACKENDS.join(", ")
                ),
            ));
        }
        if self.media.crf > MAX_CRF {
            return Err(SignClipError::invalid_setting(
                "media.crf",
                format!("{} exceeds {}", self.media.crf, MAX_CRF),
            ));
        }
        if !(self.media.cut_epsilon_secs.is_finite() && self.media.cut_epsilon_secs > 0.0) {
            return Err(SignClipError::invalid_setting(
                "media.cut_epsilon_secs",
                "must be a positive number of seconds",
            ));
        }
        if self.media.threads == Some(0) {
            return Err(SignClipError::invalid_setting(
                "media.threads",
                "must be at least 1",
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(SignClipError::invalid_setting(
                "logging.level",
                format!(
                    "unknown level '{}', expected one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.media.cut_epsilon_secs, 0.05);
        assert!(settings.annotation.mirror_transcripts);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [media]
            backend = "mock"

            [logging]
            json = true
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(settings.media.backend, "mock");
        assert_eq!(settings.media.crf, 23);
        assert!(settings.logging.json);
        assert_eq!(settings.storage.database, PathBuf::from("signclip.db"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config").join("signclip.toml");
        let mut settings = Settings::default();
        settings.media.threads = Some(2);
        settings.annotation.default_user = Some("reviewer".to_string());

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.media.crf = 60;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.media.cut_epsilon_secs = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.media.backend = "gstreamer".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.logging.level = "loud".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = Settings::from_toml_str("[media\nbackend=", "broken.toml").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
