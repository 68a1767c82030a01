use crate::error::{ErrorKind, Result};
use crate::fetch::fetch;
use crate::geometry::FitMode;
use crate::render::render_square;
use exn::{OptionExt, ResultExt};
use podshelf_storage::BackendHandle;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::instrument;

const EXTENSION: &str = ".jpg";

/// Content address of a derived cover: a digest of the source plus the
/// target size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    digest: String,
    size: u32,
}
impl ContentKey {
    /// Key for `source` rendered at `size`. For embedded art the source is
    /// the encoded image; for remote art it is the URL.
    pub fn of(source: &[u8], size: u32) -> Self {
        Self {
            digest: blake3::hash(source).to_hex().to_string(),
            size,
        }
    }

    /// Parses a stored file name (`{64 hex}-{size}.jpg`) back into a key.
    pub fn parse(file_name: &str) -> Option<Self> {
        let (digest, size) = file_name.strip_suffix(EXTENSION)?.split_once('-')?;
        let is_digest = digest.len() == 64 && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !is_digest || size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            digest: digest.to_string(),
            size: size.parse().ok()?,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn file_name(&self) -> String {
        format!("{self}{EXTENSION}")
    }
}
impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.digest, self.size)
    }
}

/// A derived square cover, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArtAsset {
    pub key: ContentKey,
    /// Path relative to the cover store root.
    pub storage_path: PathBuf,
    /// Where feed readers fetch it from.
    pub public_url: String,
}

/// Derives square covers and keeps them in a content-addressed store.
///
/// Derivation is idempotent: when a cover for the same key already exists in
/// the store, it is returned without decoding, fetching or writing anything.
/// Two concurrent derivations of the same new key may both render; they
/// produce identical bytes and the store's atomic write keeps the file whole.
pub struct CoverArtist {
    store: BackendHandle,
    public_url: String,
    size: u32,
    mode: FitMode,
    client: reqwest::Client,
    renders: AtomicUsize,
}
impl CoverArtist {
    /// `public_url` is the base under which the store's files are served.
    pub fn new(store: BackendHandle, public_url: impl Into<String>, size: u32, mode: FitMode) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::Fetch("client initialization".to_string()))?;
        Ok(Self {
            store,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            size,
            mode,
            client,
            renders: AtomicUsize::new(0),
        })
    }

    /// Number of images this artist has actually rendered (cache misses).
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::Relaxed)
    }

    /// Derives (or finds) the square cover for embedded image bytes.
    #[instrument(skip_all, fields(store = self.store.name(), bytes = source.len()))]
    pub async fn derive_square_cover(&self, source: &[u8]) -> Result<CoverArtAsset> {
        let key = ContentKey::of(source, self.size);
        if let Some(asset) = self.lookup(&key).await? {
            return Ok(asset);
        }
        self.render_and_store(key, source.to_vec()).await
    }

    /// Derives (or finds) the square cover for a remote image.
    ///
    /// The key is taken from the URL, so a cover derived once is never
    /// fetched again while it stays in the store.
    #[instrument(skip(self), fields(store = self.store.name()))]
    pub async fn derive_remote_cover(&self, url: &str) -> Result<CoverArtAsset> {
        let key = ContentKey::of(url.as_bytes(), self.size);
        if let Some(asset) = self.lookup(&key).await? {
            return Ok(asset);
        }
        let source = fetch(&self.client, url).await?;
        self.render_and_store(key, source).await
    }

    /// Reads a stored cover by file name.
    ///
    /// # Errors
    ///
    /// - [`InvalidName`](ErrorKind::InvalidName) for anything that is not a
    ///   name this artist generates.
    /// - [`NotFound`](ErrorKind::NotFound) if no such cover has been derived.
    pub async fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        let key = ContentKey::parse(file_name).ok_or_raise(|| ErrorKind::InvalidName(file_name.to_string()))?;
        let path = PathBuf::from(key.file_name());
        if !self.store.exists(&path).await.or_raise(|| ErrorKind::Storage)? {
            exn::bail!(ErrorKind::NotFound(file_name.to_string()));
        }
        self.store.read(&path).await.or_raise(|| ErrorKind::Storage)
    }

    fn asset(&self, key: ContentKey) -> CoverArtAsset {
        let file_name = key.file_name();
        CoverArtAsset {
            public_url: format!("{}/{}", self.public_url, file_name),
            storage_path: PathBuf::from(file_name),
            key,
        }
    }

    async fn lookup(&self, key: &ContentKey) -> Result<Option<CoverArtAsset>> {
        let asset = self.asset(key.clone());
        if self.store.exists(&asset.storage_path).await.or_raise(|| ErrorKind::Storage)? {
            tracing::debug!(key = %key, "Cover already derived");
            return Ok(Some(asset));
        }
        Ok(None)
    }

    async fn render_and_store(&self, key: ContentKey, source: Vec<u8>) -> Result<CoverArtAsset> {
        let (size, mode) = (self.size, self.mode);
        let jpeg = tokio::task::spawn_blocking(move || render_square(&source, size, mode))
            .await
            .or_raise(|| ErrorKind::Worker)??;
        self.renders.fetch_add(1, Ordering::Relaxed);
        let asset = self.asset(key);
        self.store
            .write(&asset.storage_path, &jpeg)
            .await
            .or_raise(|| ErrorKind::Storage)?;
        tracing::debug!(key = %asset.key, bytes = jpeg.len(), "Derived square cover");
        Ok(asset)
    }
}
