// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fs_local;
pub mod media_mock;
#[cfg(feature = "libav")]
pub mod probe_libav;
pub mod sqlite_store;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::{FfmpegMediaAdapter, FfmpegOptions};
pub use fs_local::LocalFsAdapter;
pub use media_mock::MockMediaAdapter;
#[cfg(feature = "libav")]
pub use probe_libav::ProbeLibavAdapter;
pub use sqlite_store::SqliteSegmentStore;
pub use toml_config::Settings;
pub use tracing_log::init_logging;
