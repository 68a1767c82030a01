//! Publish a directory of audio files as a podcast feed.
//!
//! [`FeedService`] wires the workspace crates together from a
//! [`Config`](podshelf_config::Config) and exposes the three entry points an
//! outer HTTP layer needs: the current feed, a forced refresh, and read
//! access to derived cover art.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use podshelf_artwork::{CoverArtist, FitMode};
use podshelf_config::{Config, CoverMode};
use podshelf_feed::models::{Channel, FeedDocument, Owner};
use podshelf_feed::{DescriptionTemplate, FeedCache, FeedPipeline, FeedSource, PipelineSettings};
use podshelf_library::{IdentifierGenerator, LibrarySignature};
use podshelf_storage::backend::LocalBackend;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::instrument;

/// Outcome of a forced rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub items: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub built_at: OffsetDateTime,
}

/// The feed materialization pipeline behind a single-flight cache.
#[derive(Clone)]
pub struct FeedService {
    cache: FeedCache<FeedPipeline>,
    artist: Arc<CoverArtist>,
}
impl FeedService {
    #[instrument(skip_all, fields(root = %config.library.root.display()))]
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = LocalBackend::new("covers", &config.cover.directory).or_raise(|| ErrorKind::Setup)?;
        let mode = match config.cover.mode {
            CoverMode::Crop => FitMode::Crop,
            CoverMode::Pad => FitMode::Pad,
        };
        let artist = CoverArtist::new(Arc::new(store), &config.cover.public_url, config.cover.size, mode)
            .or_raise(|| ErrorKind::Setup)?;
        let artist = Arc::new(artist);
        let template =
            DescriptionTemplate::new(config.description.template.as_deref()).or_raise(|| ErrorKind::Setup)?;

        let channel = &config.channel;
        let pipeline = FeedPipeline::new(
            PipelineSettings {
                root: config.library.root.clone(),
                folder_separator: config.library.folder_separator.clone(),
                public_url: config.library.public_url.clone(),
                max_items: config.feed.max_items,
                release_link: config.description.release_link.clone(),
                social_links: config.description.social_links.clone(),
            },
            Channel {
                title: channel.title.clone(),
                link: channel.link.clone(),
                description: channel.description.clone(),
                language: channel.language.clone(),
                copyright: channel.copyright.clone(),
                author: channel.author.clone(),
                owner: Owner {
                    name: channel.owner_name.clone(),
                    email: channel.owner_email.clone(),
                },
                explicit: channel.explicit,
                category: channel.category.clone(),
                image: channel.image_url.clone(),
            },
            template,
            Arc::clone(&artist),
            IdentifierGenerator::default(),
        );
        let cache = FeedCache::new(pipeline, Duration::from_secs(config.cache.ttl_seconds));
        tracing::debug!(ttl = config.cache.ttl_seconds, cover_size = config.cover.size, "Feed service ready");
        Ok(Self { cache, artist })
    }

    /// The current feed, rebuilt only when stale.
    pub async fn feed(&self) -> Result<Arc<FeedDocument>> {
        self.cache.get().await.or_raise(|| ErrorKind::Feed)
    }

    /// Rebuilds the feed now, ignoring TTL and library signature.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let document = self.cache.refresh().await.or_raise(|| ErrorKind::Feed)?;
        Ok(RefreshReport {
            items: document.items.len(),
            built_at: document.generated_at,
        })
    }

    /// Reads a derived cover by its generated file name.
    pub async fn cover(&self, file_name: &str) -> Result<Vec<u8>> {
        use podshelf_artwork::error::ErrorKind as CoverError;
        match self.artist.read(file_name).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if matches!(&*err, CoverError::InvalidName(_) | CoverError::NotFound(_)) => {
                Err(err.raise(ErrorKind::CoverNotFound(file_name.to_string())))
            },
            Err(err) => Err(err.raise(ErrorKind::Cover)),
        }
    }

    /// Fingerprint of the library as it is on disk right now.
    pub async fn signature(&self) -> LibrarySignature {
        self.cache.source().signature().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    /// One second of untagged 8 kHz mono 8-bit silence.
    fn silent_wav() -> Vec<u8> {
        let mut fmt = Vec::new();
        for field in [1u16, 1] {
            fmt.extend_from_slice(&field.to_le_bytes());
        }
        for field in [8000u32, 8000] {
            fmt.extend_from_slice(&field.to_le_bytes());
        }
        for field in [1u16, 8] {
            fmt.extend_from_slice(&field.to_le_bytes());
        }
        let mut wave = b"WAVE".to_vec();
        wave.extend(chunk(b"fmt ", &fmt));
        wave.extend(chunk(b"data", &[0x80; 8000]));
        chunk(b"RIFF", &wave)
    }

    fn config(library: &Path, covers: &Path) -> Config {
        let mut config = Config::default();
        config.library.root = library.to_path_buf();
        config.cover.directory = covers.to_path_buf();
        config.validate().unwrap();
        config
    }

    #[tokio::test]
    async fn test_feed_is_cached_until_refresh() {
        let library = tempfile::tempdir().unwrap();
        let covers = tempfile::tempdir().unwrap();
        std::fs::write(library.path().join("Artist - Set.wav"), silent_wav()).unwrap();

        let service = FeedService::from_config(&config(library.path(), covers.path())).unwrap();
        let first = service.feed().await.unwrap();
        assert_eq!(first.items.len(), 1);
        assert!(Arc::ptr_eq(&first, &service.feed().await.unwrap()));

        std::fs::write(library.path().join("Second.wav"), silent_wav()).unwrap();
        let report = service.refresh().await.unwrap();
        assert_eq!(report.items, 2);
        assert_eq!(service.feed().await.unwrap().generated_at, report.built_at);
    }

    #[tokio::test]
    async fn test_empty_library_fails() {
        let library = tempfile::tempdir().unwrap();
        let covers = tempfile::tempdir().unwrap();
        let service = FeedService::from_config(&config(library.path(), covers.path())).unwrap();
        let err = service.refresh().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Feed));
    }

    #[tokio::test]
    async fn test_cover_names_are_validated() {
        let library = tempfile::tempdir().unwrap();
        let covers = tempfile::tempdir().unwrap();
        let service = FeedService::from_config(&config(library.path(), covers.path())).unwrap();
        for name in ["../../etc/passwd", &format!("{}-1400.jpg", "0".repeat(64))] {
            let err = service.cover(name).await.unwrap_err();
            assert!(matches!(&*err, ErrorKind::CoverNotFound(_)));
        }
    }

    #[test]
    fn test_invalid_template_fails_setup() {
        let library = tempfile::tempdir().unwrap();
        let covers = tempfile::tempdir().unwrap();
        let mut config = config(library.path(), covers.path());
        config.description.template = Some("{{ nonsense }}".to_string());
        let err = FeedService::from_config(&config).err().unwrap();
        assert!(matches!(&*err, ErrorKind::Setup));
    }
}
