//! Layered configuration for podshelf.
//!
//! Values are merged lowest to highest priority:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. An optional TOML file.
//! 3. Environment variables prefixed `PODSHELF_`, with `__` separating
//!    nested keys (`PODSHELF_COVER__SIZE=600`).
//!
//! ```toml
//! [library]
//! root = "/srv/mixes"
//! public_url = "https://mixes.example.com/audio"
//!
//! [channel]
//! title = "Friday Mixes"
//! image_url = "https://mixes.example.com/logo.png"
//!
//! [cover]
//! directory = "/var/cache/podshelf/covers"
//! mode = "pad"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "PODSHELF_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub channel: ChannelConfig,
    pub cache: CacheConfig,
    pub cover: CoverConfig,
    pub description: DescriptionConfig,
    pub feed: FeedConfig,
    /// Raises the default log level to `debug`.
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory scanned for audio files.
    pub root: PathBuf,
    /// Separator between artist and title in folder names.
    pub folder_separator: String,
    /// Base URL the library directory is served from.
    pub public_url: String,
}
impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            folder_separator: " - ".to_string(),
            public_url: "http://localhost:8080/audio".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub copyright: Option<String>,
    pub author: String,
    pub owner_name: String,
    pub owner_email: String,
    pub explicit: bool,
    pub category: Option<String>,
    /// Channel artwork; derived into a square cover like item art.
    pub image_url: Option<String>,
}
impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: "Podshelf".to_string(),
            link: "http://localhost:8080/".to_string(),
            description: "Audio files published as a podcast".to_string(),
            language: "en".to_string(),
            copyright: None,
            author: "Unknown Artist".to_string(),
            owner_name: "Unknown".to_string(),
            owner_email: String::new(),
            explicit: false,
            category: Some("Music".to_string()),
            image_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a built feed is served before the library is re-checked.
    pub ttl_seconds: u64,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 300 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverMode {
    #[default]
    Crop,
    Pad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    /// Edge length of derived square covers, in pixels.
    pub size: u32,
    pub mode: CoverMode,
    /// Directory derived covers are stored in.
    pub directory: PathBuf,
    /// Base URL the cover directory is served from.
    pub public_url: String,
}
impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            size: 1400,
            mode: CoverMode::default(),
            directory: PathBuf::new(),
            public_url: "http://localhost:8080/covers".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionConfig {
    /// Item description template; `None` selects the built-in layout.
    pub template: Option<String>,
    /// Release link used when a file has none of its own.
    pub release_link: Option<String>,
    /// Free text appended as the social links block.
    pub social_links: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Keep only the newest `max_items` episodes.
    pub max_items: Option<usize>,
}

impl Config {
    /// Loads defaults, then `file` (if given), then the environment.
    ///
    /// A missing file is an error when it was asked for explicitly. The
    /// result is [validated](Self::validate).
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            if !file.is_file() {
                exn::bail!(ErrorKind::Invalid(format!("config file {} does not exist", file.display())));
            }
            figment = figment.merge(Toml::file(file));
        }
        let config = Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))?;
        tracing::debug!(file = ?file, "Configuration loaded");
        Ok(config)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot work.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(exn::Exn::from(ErrorKind::Invalid(message.to_string())));
        if !self.library.root.is_absolute() {
            return invalid("library.root must be an absolute path");
        }
        if self.library.folder_separator.is_empty() {
            return invalid("library.folder_separator must not be empty");
        }
        if !self.cover.directory.is_absolute() {
            return invalid("cover.directory must be an absolute path");
        }
        if self.cover.size == 0 {
            return invalid("cover.size must be greater than zero");
        }
        if self.feed.max_items == Some(0) {
            return invalid("feed.max_items must be greater than zero when set");
        }
        Ok(())
    }
}
