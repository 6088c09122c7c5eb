use std::sync::Arc;

use tracing::info;

use crate::adapters::toml_config::Settings;
use crate::adapters::{
    FfmpegMediaAdapter, FfmpegOptions, LocalFsAdapter, MockMediaAdapter, SqliteSegmentStore,
};
use crate::app::{
    annotate_interactor::AnnotateInteractor, browse_interactor::BrowseInteractor,
    ingest_interactor::IngestInteractor, locks::CollectionLocks,
    resplit_interactor::ResplitInteractor, stitch_interactor::StitchInteractor,
};
use crate::error::{SignClipError, SignClipResult};
use crate::ports::{BlobStorePort, MediaPort, SegmentStorePort};

pub trait AppContainer: Send + Sync {
    fn stitch_interactor(&self) -> Arc<StitchInteractor>;
    fn resplit_interactor(&self) -> Arc<ResplitInteractor>;
    fn annotate_interactor(&self) -> Arc<AnnotateInteractor>;
    fn ingest_interactor(&self) -> Arc<IngestInteractor>;
    fn browse_interactor(&self) -> Arc<BrowseInteractor>;
}

pub struct DefaultAppContainer {
    stitch_interactor: Arc<StitchInteractor>,
    resplit_interactor: Arc<ResplitInteractor>,
    annotate_interactor: Arc<AnnotateInteractor>,
    ingest_interactor: Arc<IngestInteractor>,
    browse_interactor: Arc<BrowseInteractor>,
    media_backend: &'static str,
}

impl DefaultAppContainer {
    /// Build the production adapters described by `settings`
    pub fn from_settings(settings: &Settings) -> SignClipResult<Self> {
        settings.validate()?;

        let store = Arc::new(SqliteSegmentStore::open(&settings.storage.database)?);
        let blobs = Arc::new(LocalFsAdapter::new(
            settings.storage.media_root.clone(),
            settings.storage.base_url.clone(),
        )?);
        let media: Arc<dyn MediaPort> = match settings.media.backend.as_str() {
            "ffmpeg" => Arc::new(FfmpegMediaAdapter::new(FfmpegOptions::from(
                &settings.media,
            ))?),
            "mock" => Arc::new(MockMediaAdapter::new()),
            other => {
                return Err(SignClipError::invalid_setting(
                    "media.backend",
                    format!("unknown backend '{}'", other),
                ))
            }
        };

        info!(
            "Using database {}, media root {}, {} backend",
            settings.storage.database.display(),
            settings.storage.media_root.display(),
            media.backend_name()
        );

        Ok(Self::with_ports(
            store as Arc<dyn SegmentStorePort>,
            blobs as Arc<dyn BlobStorePort>,
            media,
            settings,
        ))
    }

    /// Wire interactors around already-built ports
    pub fn with_ports(
        store: Arc<dyn SegmentStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        media: Arc<dyn MediaPort>,
        settings: &Settings,
    ) -> Self {
        let locks = Arc::new(CollectionLocks::new());

        let stitch_interactor = Arc::new(StitchInteractor::new(
            Arc::clone(&store),
            Arc::clone(&blobs),
            Arc::clone(&media),
            Arc::clone(&locks),
        ));

        let resplit_interactor = Arc::new(ResplitInteractor::new(
            Arc::clone(&store),
            Arc::clone(&blobs),
            Arc::clone(&media),
            Arc::clone(&locks),
            settings.media.cut_epsilon_secs,
        ));

        let annotate_interactor = Arc::new(AnnotateInteractor::new(
            Arc::clone(&store),
            Arc::clone(&blobs),
            settings.annotation.mirror_transcripts,
        ));

        let ingest_interactor = Arc::new(IngestInteractor::new(
            Arc::clone(&store),
            Arc::clone(&blobs),
            Arc::clone(&locks),
        ));

        let media_backend = media.backend_name();
        let browse_interactor = Arc::new(BrowseInteractor::new(store, blobs, media));

        Self {
            stitch_interactor,
            resplit_interactor,
            annotate_interactor,
            ingest_interactor,
            browse_interactor,
            media_backend,
        }
    }

    pub fn media_backend(&self) -> &'static str {
        self.media_backend
    }
}

impl AppContainer for DefaultAppContainer {
    fn stitch_interactor(&self) -> Arc<StitchInteractor> {
        Arc::clone(&self.stitch_interactor)
    }

    fn resplit_interactor(&self) -> Arc<ResplitInteractor> {
        Arc::clone(&self.resplit_interactor)
    }

    fn annotate_interactor(&self) -> Arc<AnnotateInteractor> {
        Arc::clone(&self.annotate_interactor)
    }

    fn ingest_interactor(&self) -> Arc<IngestInteractor> {
        Arc::clone(&self.ingest_interactor)
    }

    fn browse_interactor(&self) -> Arc<BrowseInteractor> {
        Arc::clone(&self.browse_interactor)
    }
}
