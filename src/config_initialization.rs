//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::adapters::toml_config::Settings;
use crate::cli::Cli;
use crate::error::{SignClipError, SignClipResult};

/// Files tried, in order, when no `--config` is given
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["signclip.toml", "config/signclip.toml"];

/// Settings together with the sources they were built from
#[derive(Debug)]
pub struct LoadedConfiguration {
    pub settings: Settings,
    pub file: Option<PathBuf>,
    pub env_overrides: Vec<&'static str>,
}

impl LoadedConfiguration {
    /// Report where the settings came from. Loading happens before the
    /// subscriber exists, so this runs after `init_logging`.
    pub fn log_sources(&self) {
        match &self.file {
            Some(path) => info!("Loaded configuration from {}", path.display()),
            None => debug!("No configuration file found, using defaults"),
        }
        for key in &self.env_overrides {
            info!("Found environment override: {}", key);
        }
        if !self.env_overrides.is_empty() {
            info!(
                "Applied {} environment variable overrides",
                self.env_overrides.len()
            );
        }
    }
}

/// Build settings following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> SignClipResult<LoadedConfiguration> {
    // Step 1 and 2: defaults, overlaid by a file when one is found
    let file = config_file(cli.config.as_deref())?;
    let mut settings = match &file {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    // Step 3: environment
    let env_overrides = apply_environment(&mut settings, |key| std::env::var(key).ok())?;

    // Step 4: command line
    apply_cli_overrides(&mut settings, cli);

    settings.validate()?;
    Ok(LoadedConfiguration {
        settings,
        file,
        env_overrides,
    })
}

/// Configuration file to load. An explicit path must exist.
fn config_file(explicit: Option<&Path>) -> SignClipResult<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(SignClipError::invalid_setting(
                "--config",
                format!("{} does not exist", path.display()),
            ));
        }
        return Ok(Some(path.to_path_buf()));
    }

    Ok(DEFAULT_CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists()))
}

/// Apply `SIGNCLIP_*` variables through `lookup`; returns the keys that were set
pub fn apply_environment<F>(settings: &mut Settings, lookup: F) -> SignClipResult<Vec<&'static str>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = Vec::new();
    let mut found = |key: &'static str| {
        let value = lookup(key).filter(|v| !v.trim().is_empty());
        if value.is_some() {
            applied.push(key);
        }
        value
    };

    if let Some(value) = found("SIGNCLIP_MEDIA_ROOT") {
        settings.storage.media_root = PathBuf::from(value);
    }
    if let Some(value) = found("SIGNCLIP_DATABASE") {
        settings.storage.database = PathBuf::from(value);
    }
    if let Some(value) = found("SIGNCLIP_MEDIA_BACKEND") {
        settings.media.backend = value;
    }
    if let Some(value) = found("SIGNCLIP_FFMPEG") {
        settings.media.ffmpeg = value;
    }
    if let Some(value) = found("SIGNCLIP_FFPROBE") {
        settings.media.ffprobe = value;
    }
    if let Some(value) = found("SIGNCLIP_CRF") {
        settings.media.crf = value
            .trim()
            .parse()
            .map_err(|_| SignClipError::invalid_setting("SIGNCLIP_CRF", value.clone()))?;
    }
    if let Some(value) = found("SIGNCLIP_LOG_LEVEL") {
        settings.logging.level = value;
    }
    if let Some(value) = found("SIGNCLIP_USER") {
        settings.annotation.default_user = Some(value);
    }

    Ok(applied)
}

/// Apply global command-line flags
fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        settings.logging.level = level.clone();
    }
    if let Some(root) = &cli.media_root {
        settings.storage.media_root = root.clone();
    }
    if let Some(database) = &cli.database {
        settings.storage.database = database.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_environment_overrides_file_values() {
        let mut settings = Settings::default();
        settings.media.backend = "ffmpeg".to_string();

        let applied = apply_environment(
            &mut settings,
            env(&[
                ("SIGNCLIP_MEDIA_BACKEND", "mock"),
                ("SIGNCLIP_USER", "ana"),
                ("SIGNCLIP_CRF", "30"),
                ("SIGNCLIP_DATABASE", ""),
            ]),
        )
        .unwrap();

        assert_eq!(
            applied,
            vec!["SIGNCLIP_MEDIA_BACKEND", "SIGNCLIP_CRF", "SIGNCLIP_USER"]
        );
        assert_eq!(settings.media.backend, "mock");
        assert_eq!(settings.annotation.default_user.as_deref(), Some("ana"));
        assert_eq!(settings.media.crf, 30);
        assert_eq!(settings.storage.database, PathBuf::from("signclip.db"));
    }

    #[test]
    fn test_bad_numeric_environment_value() {
        let mut settings = Settings::default();
        let err = apply_environment(&mut settings, env(&[("SIGNCLIP_CRF", "high")])).unwrap_err();
        assert!(err.to_string().contains("SIGNCLIP_CRF"));
    }

    #[test]
    fn test_cli_flags_win() {
        let cli = Cli::try_parse_from([
            "signclip",
            "collections",
            "--log-level",
            "debug",
            "--media-root",
            "/srv/media",
        ])
        .unwrap();
        let mut settings = Settings::default();
        settings.logging.level = "warn".to_string();

        apply_cli_overrides(&mut settings, &cli);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.storage.media_root, PathBuf::from("/srv/media"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        assert!(config_file(Some(&dir.path().join("missing.toml"))).is_err());

        let path = dir.path().join("signclip.toml");
        std::fs::write(&path, "[media]\nbackend = \"mock\"\n").unwrap();
        assert_eq!(config_file(Some(&path)).unwrap(), Some(path));
    }
}
