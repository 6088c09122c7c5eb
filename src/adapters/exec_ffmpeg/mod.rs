//! FFmpeg execution adapter
//!
//! Trims and concatenates by running the `ffmpeg` executable. Durations come
//! from `ffprobe`, or from libav directly when built with the `libav` feature.
//! Output is always re-encoded so clips with differing parameters concatenate
//! cleanly and cuts land on the requested time rather than a keyframe.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::adapters::toml_config::MediaSettings;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Encoder options passed on every ffmpeg invocation
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegOptions {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub crf: u8,
    pub threads: usize,
}

impl From<&MediaSettings> for FfmpegOptions {
    fn from(settings: &MediaSettings) -> Self {
        Self {
            ffmpeg: PathBuf::from(&settings.ffmpeg),
            ffprobe: PathBuf::from(&settings.ffprobe),
            video_codec: settings.video_codec.clone(),
            audio_codec: settings.audio_codec.clone(),
            preset: settings.preset.clone(),
            crf: settings.crf,
            threads: settings.threads.unwrap_or_else(num_cpus::get),
        }
    }
}

impl Default for FfmpegOptions {
    fn default() -> Self {
        Self::from(&MediaSettings::default())
    }
}

/// FFmpeg-based execution adapter
pub struct FfmpegMediaAdapter {
    options: FfmpegOptions,
    #[cfg(feature = "libav")]
    probe: std::sync::Arc<crate::adapters::probe_libav::ProbeLibavAdapter>,
}

impl FfmpegMediaAdapter {
    /// Create new FFmpeg adapter
    pub fn new(options: FfmpegOptions) -> Result<Self, DomainError> {
        Ok(Self {
            options,
            #[cfg(feature = "libav")]
            probe: std::sync::Arc::new(crate::adapters::probe_libav::ProbeLibavAdapter::new()?),
        })
    }

    /// Encoder arguments shared by trim and concat
    fn encode_args(&self) -> Vec<OsString> {
        let o = &self.options;
        vec![
            "-c:v".into(),
            o.video_codec.clone().into(),
            "-preset".into(),
            o.preset.clone().into(),
            "-crf".into(),
            o.crf.to_string().into(),
            "-c:a".into(),
            o.audio_codec.clone().into(),
            "-threads".into(),
            o.threads.to_string().into(),
            "-movflags".into(),
            "+faststart".into(),
        ]
    }

    /// Arguments for writing `[start, end]` of `source` to `dest`
    pub(crate) fn trim_args(&self, source: &Path, range: &CutRange, dest: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-v".into(), "error".into()];
        args.push("-ss".into());
        args.push(format!("{:.3}", range.start.seconds).into());
        args.push("-i".into());
        args.push(source.into());
        args.push("-t".into());
        args.push(format!("{:.3}", range.duration().seconds).into());
        args.extend(self.encode_args());
        args.push(dest.into());
        args
    }

    /// Arguments for joining the files listed in a concat manifest
    pub(crate) fn concat_args(&self, manifest: &Path, dest: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-v", "error", "-f", "concat", "-safe", "0", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(manifest.into());
        args.extend(self.encode_args());
        args.push(dest.into());
        args
    }

    /// Contents of an ffmpeg concat-demuxer manifest
    pub(crate) fn concat_manifest(sources: &[PathBuf]) -> String {
        sources
            .iter()
            .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', "'\\''")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn run(&self, program: &Path, args: &[OsString]) -> Result<String, DomainError> {
        debug!("Running {} {:?}", program.display(), args);

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainError::MediaProcessing(format!(
                    "Failed to launch {}: {}",
                    program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let message = tail.into_iter().rev().collect::<Vec<_>>().join(" | ");
            warn!("{} exited with {}: {}", program.display(), output.status, message);
            return Err(DomainError::MediaProcessing(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                message
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    #[cfg(not(feature = "libav"))]
    async fn probe_duration(&self, path: &Path) -> Result<f64, DomainError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "csv=p=0".into(),
            path.into(),
        ];
        let stdout = self.run(&self.options.ffprobe, &args).await?;
        parse_probe_duration(&stdout).ok_or_else(|| {
            DomainError::MediaProcessing(format!(
                "No duration reported for {}",
                path.display()
            ))
        })
    }

    #[cfg(feature = "libav")]
    async fn probe_duration(&self, path: &Path) -> Result<f64, DomainError> {
        let probe = self.probe.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || probe.duration(&path))
            .await
            .map_err(|e| DomainError::MediaProcessing(format!("Probe task failed: {}", e)))?
    }
}

/// Parse the single value ffprobe prints for `format=duration`
fn parse_probe_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

#[async_trait]
impl MediaPort for FfmpegMediaAdapter {
    #[instrument(skip(self))]
    async fn duration(&self, path: &Path) -> Result<f64, DomainError> {
        self.probe_duration(path).await
    }

    #[instrument(skip(self))]
    async fn trim(&self, source: &Path, range: &CutRange, dest: &Path) -> Result<(), DomainError> {
        let args = self.trim_args(source, range, dest);
        self.run(&self.options.ffmpeg, &args).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn concatenate(&self, sources: &[PathBuf], dest: &Path) -> Result<(), DomainError> {
        if sources.is_empty() {
            return Err(DomainError::MediaProcessing("Nothing to concatenate".to_string()));
        }

        let manifest_dir = dest.parent().unwrap_or_else(|| Path::new("."));
        let manifest = tempfile::Builder::new()
            .prefix("concat-")
            .suffix(".txt")
            .tempfile_in(manifest_dir)
            .map_err(|e| {
                DomainError::MediaProcessing(format!("Failed to create concat manifest: {}", e))
            })?;
        tokio::fs::write(manifest.path(), Self::concat_manifest(sources))
            .await
            .map_err(|e| {
                DomainError::MediaProcessing(format!("Failed to write concat manifest: {}", e))
            })?;

        let args = self.concat_args(manifest.path(), dest);
        self.run(&self.options.ffmpeg, &args).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "ffmpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> FfmpegMediaAdapter {
        FfmpegMediaAdapter {
            options: FfmpegOptions {
                threads: 2,
                ..FfmpegOptions::default()
            },
            #[cfg(feature = "libav")]
            probe: std::sync::Arc::new(crate::adapters::probe_libav::ProbeLibavAdapter),
        }
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_trim_args_seek_then_duration() {
        let range = CutRange::new(TimeSpec::from_seconds(3.0), TimeSpec::from_seconds(12.5)).unwrap();
        let args = strings(&adapter().trim_args(Path::new("in.mp4"), &range, Path::new("out.mp4")));

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "3.000");
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "9.500");
        assert!(args.windows(2).any(|w| w[0] == "-threads" && w[1] == "2"));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_concat_args_use_demuxer() {
        let args = strings(&adapter().concat_args(Path::new("list.txt"), Path::new("ab.mp4")));
        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "concat"));
        assert!(args.windows(2).any(|w| w[0] == "-i" && w[1] == "list.txt"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
    }

    #[test]
    fn test_concat_manifest_quotes_paths() {
        let manifest = FfmpegMediaAdapter::concat_manifest(&[
            PathBuf::from("/media/videos/A_0001.mp4"),
            PathBuf::from("/media/videos/it's.mp4"),
        ]);
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines[0], "file '/media/videos/A_0001.mp4'");
        assert_eq!(lines[1], "file '/media/videos/it'\\''s.mp4'");
    }

    #[test]
    fn test_parse_probe_duration() {
        assert_eq!(parse_probe_duration("10.016000\n"), Some(10.016));
        assert_eq!(parse_probe_duration("N/A\n"), None);
        assert_eq!(parse_probe_duration(""), None);
    }

    #[tokio::test]
    async fn test_missing_executable_is_media_processing() {
        let media = FfmpegMediaAdapter {
            options: FfmpegOptions {
                ffmpeg: PathBuf::from("/nonexistent/ffmpeg-signclip"),
                ..FfmpegOptions::default()
            },
            #[cfg(feature = "libav")]
            probe: std::sync::Arc::new(crate::adapters::probe_libav::ProbeLibavAdapter),
        };
        let range = CutRange::new(TimeSpec::from_seconds(0.0), TimeSpec::from_seconds(1.0)).unwrap();
        let err = media
            .trim(Path::new("in.mp4"), &range, Path::new("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::MediaProcessing(_)));
    }
}
