use crate::assemble::assemble;
use crate::cache::{Built, FeedSource};
use crate::describe::{DescriptionTemplate, Fallbacks};
use crate::duration::format_duration;
use crate::error::{ErrorKind, Result};
use crate::models::{Channel, Enclosure, FeedItem, Guid};
use async_trait::async_trait;
use futures::{FutureExt, StreamExt, TryStreamExt};
use podshelf_artwork::CoverArtist;
use podshelf_extract::TrackMetadata;
use podshelf_library::{AudioAsset, FolderCredit, IdentifierGenerator, LibrarySignature, scan};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

/// Files whose metadata and covers are processed at the same time.
const CONCURRENCY: usize = 4;

/// Where the library lives and how its files are published.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub root: PathBuf,
    pub folder_separator: String,
    /// Base URL the library root is served from.
    pub public_url: String,
    pub max_items: Option<usize>,
    /// Release link for files that carry none.
    pub release_link: Option<String>,
    pub social_links: Option<String>,
}

/// Scans the library and turns every usable audio file into a feed item.
///
/// One unreadable file or one broken cover never fails the build: the file
/// is skipped, or the item falls back to the channel cover. Only a library
/// with no usable file at all is an error.
pub struct FeedPipeline {
    settings: PipelineSettings,
    channel: Channel,
    template: DescriptionTemplate,
    artist: Arc<CoverArtist>,
    ids: IdentifierGenerator,
}
impl FeedPipeline {
    /// `channel.image`, when set, is the source URL for the channel cover.
    pub fn new(
        settings: PipelineSettings,
        channel: Channel,
        template: DescriptionTemplate,
        artist: Arc<CoverArtist>,
        ids: IdentifierGenerator,
    ) -> Self {
        Self {
            settings,
            channel,
            template,
            artist,
            ids,
        }
    }

    /// The configured channel with its image swapped for the derived square
    /// cover. If that fails the configured URL is kept as is.
    async fn channel(&self) -> Channel {
        let mut channel = self.channel.clone();
        if let Some(url) = &self.channel.image {
            match self.artist.derive_remote_cover(url).await {
                Ok(cover) => channel.image = Some(cover.public_url),
                Err(err) => tracing::warn!(url, error = ?err, "Channel cover unavailable; using configured image"),
            }
        }
        channel
    }

    async fn metadata(asset: &AudioAsset) -> Option<TrackMetadata> {
        let path = asset.absolute_path.clone();
        match tokio::task::spawn_blocking(move || podshelf_extract::read(path)).await {
            Ok(Ok(metadata)) => Some(metadata),
            Ok(Err(err)) => {
                tracing::warn!(path = %asset.absolute_path.display(), error = ?err, "Skipping unreadable audio file");
                None
            },
            Err(err) => {
                tracing::warn!(path = %asset.absolute_path.display(), error = %err, "Metadata worker failed; skipping file");
                None
            },
        }
    }

    async fn cover(&self, metadata: &TrackMetadata, asset: &AudioAsset) -> Option<String> {
        let picture = metadata.picture.as_deref()?;
        match self.artist.derive_square_cover(picture).await {
            Ok(cover) => Some(cover.public_url),
            Err(err) => {
                tracing::warn!(path = %asset.absolute_path.display(), error = ?err, "Embedded cover unusable");
                None
            },
        }
    }

    fn enclosure_url(&self, asset: &AudioAsset) -> String {
        let path = asset
            .relative_segments()
            .into_iter()
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.settings.public_url.trim_end_matches('/'), path)
    }

    #[instrument(skip_all, fields(file = %asset.file_name))]
    async fn item(&self, asset: &AudioAsset, channel_cover: Option<&str>) -> Result<Option<FeedItem>> {
        let Some(metadata) = Self::metadata(asset).await else {
            return Ok(None);
        };
        let credit = asset
            .folder
            .as_deref()
            .and_then(|folder| FolderCredit::parse(folder, &self.settings.folder_separator));
        let title = match metadata.title() {
            Some(title) => title.to_string(),
            None => credit.as_ref().map_or_else(|| asset.stem().to_string(), |c| c.title.clone()),
        };
        let author = match metadata.artist() {
            Some(artist) => artist.to_string(),
            None => credit.as_ref().map_or_else(|| self.channel.author.clone(), |c| c.artist.clone()),
        };
        let description = self.template.describe(
            &metadata,
            &Fallbacks {
                title: Some(&title),
                author: Some(&author),
                release_link: self.settings.release_link.as_deref(),
                social_links: self.settings.social_links.as_deref(),
            },
        )?;
        let cover_url = match self.cover(&metadata, asset).await {
            Some(url) => Some(url),
            None => channel_cover.map(str::to_string),
        };
        Ok(Some(FeedItem {
            guid: Guid {
                value: self.ids.identify(&asset.absolute_path, asset.size).to_string(),
                is_permalink: false,
            },
            title,
            author,
            duration: format_duration(metadata.duration_secs()),
            explicit: self.channel.explicit,
            description,
            enclosure: Enclosure {
                url: self.enclosure_url(asset),
                mime_type: asset.format.mime_type(),
                length: asset.size,
            },
            published_at: asset.modified,
            cover_url,
        }))
    }
}

#[async_trait]
impl FeedSource for FeedPipeline {
    async fn signature(&self) -> LibrarySignature {
        LibrarySignature::of(&scan(&self.settings.root).await)
    }

    #[instrument(skip_all, fields(root = %self.settings.root.display()))]
    async fn build(&self) -> Result<Built> {
        let assets = scan(&self.settings.root).await;
        let signature = LibrarySignature::of(&assets);
        if assets.is_empty() {
            exn::bail!(ErrorKind::NoAudioFiles(self.settings.root.clone()));
        }
        let channel = self.channel().await;
        let channel_cover = channel.image.as_deref();
        let pending: Vec<_> = assets.iter().map(|asset| self.item(asset, channel_cover).boxed()).collect();
        let items: Vec<Option<FeedItem>> = futures::stream::iter(pending)
            .buffered(CONCURRENCY)
            .try_collect()
            .await?;
        let items: Vec<FeedItem> = items.into_iter().flatten().collect();
        tracing::debug!(scanned = assets.len(), usable = items.len(), "Library processed");
        if items.is_empty() {
            exn::bail!(ErrorKind::NoAudioFiles(self.settings.root.clone()));
        }
        Ok(Built {
            document: assemble(channel, items, self.settings.max_items),
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FeedCache;
    use crate::models::{FeedDocument, Owner};
    use image::{ImageFormat, Rgb, RgbImage};
    use lofty::config::WriteOptions;
    use lofty::picture::{MimeType, Picture, PictureType};
    use lofty::tag::{Tag, TagExt, TagType};
    use podshelf_artwork::{ContentKey, FitMode};
    use podshelf_storage::backend::MockBackend;
    use std::io::Cursor;
    use std::path::Path;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const COVERS: &str = "https://cdn.example.com/covers";

    fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    /// `seconds` of untagged 8 kHz mono 8-bit silence.
    fn silent_wav(seconds: u32) -> Vec<u8> {
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&1u16.to_le_bytes());
        fmt.extend_from_slice(&1u16.to_le_bytes());
        fmt.extend_from_slice(&8000u32.to_le_bytes());
        fmt.extend_from_slice(&8000u32.to_le_bytes());
        fmt.extend_from_slice(&1u16.to_le_bytes());
        fmt.extend_from_slice(&8u16.to_le_bytes());
        let mut wave = b"WAVE".to_vec();
        wave.extend(chunk(b"fmt ", &fmt));
        wave.extend(chunk(b"data", &vec![0x80; 8000 * seconds as usize]));
        chunk(b"RIFF", &wave)
    }

    fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb(color));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Writes a one-second WAV carrying `picture` as its front cover.
    fn wav_with_cover(path: &Path, picture: Vec<u8>) {
        std::fs::write(path, silent_wav(1)).unwrap();
        let mut tag = Tag::new(TagType::Id3v2);
        tag.push_picture(Picture::new_unchecked(PictureType::CoverFront, Some(MimeType::Png), None, picture));
        tag.save_to_path(path, WriteOptions::default()).unwrap();
    }

    /// Answers exactly one HTTP request with `body` and returns its URL.
    async fn serve_once(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await.unwrap();
            let head = format!("HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n", body.len());
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{address}/logo.png")
    }

    fn cover_url(source: &[u8]) -> String {
        format!("{COVERS}/{}", ContentKey::of(source, 100).file_name())
    }

    fn channel(image: Option<&str>) -> Channel {
        Channel {
            title: "Friday Mixes".to_string(),
            link: "https://mixes.example.com/".to_string(),
            description: "Weekly sets".to_string(),
            language: "en".to_string(),
            copyright: None,
            author: "House Band".to_string(),
            owner: Owner {
                name: "Owner".to_string(),
                email: "owner@example.com".to_string(),
            },
            explicit: true,
            category: Some("Music".to_string()),
            image: image.map(str::to_string),
        }
    }

    struct Fixture {
        pipeline: FeedPipeline,
        store: Arc<MockBackend>,
        artist: Arc<CoverArtist>,
    }

    fn fixture(root: &Path, image: Option<&str>) -> Fixture {
        let store = Arc::new(MockBackend::default());
        let artist = Arc::new(CoverArtist::new(store.clone(), COVERS, 100, FitMode::Crop).unwrap());
        let settings = PipelineSettings {
            root: root.to_path_buf(),
            folder_separator: " - ".to_string(),
            public_url: "https://mixes.example.com/audio/".to_string(),
            max_items: None,
            release_link: Some("https://shop.example.com".to_string()),
            social_links: None,
        };
        let pipeline = FeedPipeline::new(
            settings,
            channel(image),
            DescriptionTemplate::new(Some("{{ title }} | {{ author }} | {{ release_link }}")).unwrap(),
            Arc::clone(&artist),
            IdentifierGenerator::default(),
        );
        Fixture {
            pipeline,
            store,
            artist,
        }
    }

    async fn build(root: &Path) -> Result<FeedDocument> {
        Ok(fixture(root, None).pipeline.build().await?.document)
    }

    fn item<'a>(document: &'a FeedDocument, title: &str) -> &'a FeedItem {
        document.items.iter().find(|item| item.title == title).unwrap()
    }

    #[tokio::test]
    async fn test_build_from_folders_and_root_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let folder = temp_dir.path().join("Bonobo - Live at Brixton");
        std::fs::create_dir(&folder).unwrap();
        std::fs::write(folder.join("Part One.wav"), silent_wav(2)).unwrap();
        std::fs::write(temp_dir.path().join("loose take.wav"), silent_wav(1)).unwrap();

        let document = build(temp_dir.path()).await.unwrap();
        assert_eq!(document.items.len(), 2);
        assert!(document.channel.image.is_none());

        let set = item(&document, "Live at Brixton");
        assert_eq!(set.author, "Bonobo");
        assert_eq!(set.duration, "0:02");
        assert!(set.explicit);
        assert!(!set.guid.is_permalink);
        assert!(set.guid.value.starts_with("urn:uuid:"));
        assert_eq!(set.description, "Live at Brixton | Bonobo | https://shop.example.com");
        assert_eq!(
            set.enclosure.url,
            "https://mixes.example.com/audio/Bonobo%20-%20Live%20at%20Brixton/Part%20One.wav"
        );
        assert_eq!(set.enclosure.mime_type, "audio/wav");
        assert_eq!(set.enclosure.length, silent_wav(2).len() as u64);
        assert!(set.cover_url.is_none());

        let loose = item(&document, "loose take");
        assert_eq!(loose.author, "House Band");
        assert_eq!(loose.enclosure.url, "https://mixes.example.com/audio/loose%20take.wav");
    }

    #[tokio::test]
    async fn test_identifiers_stable_across_builds() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("a.wav"), silent_wav(1)).unwrap();
        std::fs::write(temp_dir.path().join("b.wav"), silent_wav(1)).unwrap();

        let guids = |document: &FeedDocument| {
            let mut guids: Vec<String> = document.items.iter().map(|item| item.guid.value.clone()).collect();
            guids.sort();
            guids
        };
        let first = build(temp_dir.path()).await.unwrap();
        // A separate pipeline has a fresh memo table, like a restarted process.
        let second = build(temp_dir.path()).await.unwrap();
        assert_eq!(guids(&first), guids(&second));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("good.wav"), silent_wav(1)).unwrap();
        std::fs::write(temp_dir.path().join("broken.flac"), b"not a flac stream").unwrap();

        let document = build(temp_dir.path()).await.unwrap();
        assert_eq!(document.items.len(), 1);
        assert_eq!(document.items[0].title, "good");
    }

    #[tokio::test]
    async fn test_empty_library_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), b"not audio").unwrap();
        let err = build(temp_dir.path()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NoAudioFiles(_)));
    }

    #[tokio::test]
    async fn test_only_broken_files_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("broken.flac"), b"not a flac stream").unwrap();
        let err = build(temp_dir.path()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NoAudioFiles(_)));
    }

    #[tokio::test]
    async fn test_embedded_cover_is_derived() {
        let temp_dir = tempfile::tempdir().unwrap();
        let art = png(160, 120, [255, 0, 0]);
        wav_with_cover(&temp_dir.path().join("with art.wav"), art.clone());
        std::fs::write(temp_dir.path().join("plain.wav"), silent_wav(1)).unwrap();

        let fixture = fixture(temp_dir.path(), None);
        let document = fixture.pipeline.build().await.unwrap().document;
        assert_eq!(item(&document, "with art").cover_url, Some(cover_url(&art)));
        assert!(item(&document, "plain").cover_url.is_none());
        assert_eq!(fixture.artist.renders(), 1);
        assert_eq!(fixture.store.writes(), 1);
        let stored = fixture.artist.read(&ContentKey::of(&art, 100).file_name()).await.unwrap();
        assert_eq!(image::load_from_memory(&stored).unwrap().to_rgb8().dimensions(), (100, 100));
    }

    #[tokio::test]
    async fn test_channel_cover_is_derived_and_inherited() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("plain.wav"), silent_wav(1)).unwrap();
        let url = serve_once(png(300, 200, [0, 0, 255])).await;

        let fixture = fixture(temp_dir.path(), Some(&url));
        let document = fixture.pipeline.build().await.unwrap().document;
        let derived = cover_url(url.as_bytes());
        assert_eq!(document.channel.image, Some(derived.clone()));
        assert_eq!(document.items[0].cover_url, Some(derived));
        assert_eq!(fixture.store.writes(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_embedded_cover_falls_back_to_channel() {
        let temp_dir = tempfile::tempdir().unwrap();
        let art = png(120, 120, [255, 0, 0]);
        wav_with_cover(&temp_dir.path().join("good art.wav"), art.clone());
        wav_with_cover(&temp_dir.path().join("bad art.wav"), b"these bytes are no image".to_vec());
        let url = serve_once(png(300, 200, [0, 0, 255])).await;

        let fixture = fixture(temp_dir.path(), Some(&url));
        let document = fixture.pipeline.build().await.unwrap().document;
        let channel_cover = cover_url(url.as_bytes());
        assert_eq!(document.items.len(), 2);
        assert_eq!(item(&document, "bad art").cover_url, Some(channel_cover));
        assert_eq!(item(&document, "good art").cover_url, Some(cover_url(&art)));
    }

    #[tokio::test]
    async fn test_unreachable_channel_image_keeps_configured_url() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("a.wav"), silent_wav(1)).unwrap();
        let image = "http://127.0.0.1:9/logo.png";

        let fixture = fixture(temp_dir.path(), Some(image));
        let document = fixture.pipeline.build().await.unwrap().document;
        assert_eq!(document.channel.image.as_deref(), Some(image));
        // Items without art of their own fall back to the channel cover.
        assert_eq!(document.items[0].cover_url.as_deref(), Some(image));
        assert_eq!(fixture.store.writes(), 0);
    }

    #[tokio::test]
    async fn test_cached_feed_does_not_rederive_covers() {
        let temp_dir = tempfile::tempdir().unwrap();
        wav_with_cover(&temp_dir.path().join("with art.wav"), png(160, 120, [255, 0, 0]));
        let Fixture {
            pipeline,
            store,
            artist,
        } = fixture(temp_dir.path(), None);
        let cache = FeedCache::new(pipeline, Duration::from_secs(300));

        let first = cache.get().await.unwrap();
        let (renders, writes) = (artist.renders(), store.writes());
        assert_eq!((renders, writes), (1, 1));
        let second = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!((artist.renders(), store.writes()), (renders, writes));

        // A forced rebuild finds the cover already in the store.
        cache.refresh().await.unwrap();
        assert_eq!((artist.renders(), store.writes()), (renders, writes));
    }

    #[tokio::test]
    async fn test_signature_tracks_file_set() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("a.wav"), silent_wav(1)).unwrap();
        let pipeline = fixture(temp_dir.path(), None).pipeline;

        let before = pipeline.signature().await;
        assert_eq!(before, pipeline.signature().await);
        assert_eq!(pipeline.build().await.unwrap().signature, before);
        std::fs::write(temp_dir.path().join("b.wav"), silent_wav(1)).unwrap();
        assert_ne!(before, pipeline.signature().await);
    }
}
