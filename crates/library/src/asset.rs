use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// An audio container podshelf is willing to publish.
///
/// Detection is by file extension only; anything else found in the library
/// is ignored without complaint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Aac,
    Ogg,
    Opus,
    Flac,
    Wav,
}
impl AudioFormat {
    /// Detect the format from a path's extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "m4a" | "m4b" => Some(Self::M4a),
            "aac" => Some(Self::Aac),
            "ogg" | "oga" => Some(Self::Ogg),
            "opus" => Some(Self::Opus),
            "flac" => Some(Self::Flac),
            "wav" => Some(Self::Wav),
            _ => None,
        }
    }

    /// MIME type advertised in the feed enclosure.
    #[inline]
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::M4a => "audio/mp4",
            Self::Aac => "audio/aac",
            Self::Ogg => "audio/ogg",
            Self::Opus => "audio/opus",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
        }
    }
}

/// A single audio file, as seen by one scan.
///
/// Identity is the absolute path. Nothing is persisted between scans; every
/// pipeline run produces fresh snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    pub absolute_path: PathBuf,
    /// Name of the folder directly inside the library root that holds the
    /// file, or `None` for files at the root itself.
    pub folder: Option<String>,
    pub file_name: String,
    pub size: u64,
    pub modified: OffsetDateTime,
    pub format: AudioFormat,
}
impl AudioAsset {
    /// Path relative to the library root, as `/`-separated segments.
    pub fn relative_segments(&self) -> Vec<&str> {
        self.folder.iter().map(String::as_str).chain(std::iter::once(self.file_name.as_str())).collect()
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name).file_stem().and_then(|s| s.to_str()).unwrap_or(&self.file_name)
    }
}
