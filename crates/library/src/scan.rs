use crate::asset::{AudioAsset, AudioFormat};
use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs::{self, DirEntry, ReadDir};
use tracing::instrument;

enum WalkEntry {
    File(AudioAsset),
    Descend(PathBuf, String),
    Skip,
}

/// Fingerprint over the set of audio files in the library.
///
/// Built from paths and names only, never file contents, so computing it
/// costs one directory listing. It changes when files are added, removed or
/// renamed; it does not change when a file is rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibrarySignature(String);
impl LibrarySignature {
    pub fn of(assets: &[AudioAsset]) -> Self {
        let mut entries: Vec<String> = assets
            .iter()
            .map(|asset| format!("{}{}", asset.absolute_path.display(), asset.file_name))
            .collect();
        entries.sort_unstable();
        let mut hasher = blake3::Hasher::new();
        for entry in &entries {
            hasher.update(entry.as_bytes());
            // Separator, so ["ab", "c"] and ["a", "bc"] differ.
            hasher.update(b"\n");
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for LibrarySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collects every audio file under `root` into a [`Vec`], in directory
/// enumeration order.
///
/// An unreadable root is not an error: it is logged as a warning and
/// produces an empty list. Whether "empty" means "no feed" is the caller's
/// decision.
#[instrument(skip_all, fields(root = %root.as_ref().display()))]
pub async fn scan(root: impl AsRef<Path>) -> Vec<AudioAsset> {
    let assets: Vec<AudioAsset> = scan_stream(root.as_ref().to_path_buf()).collect().await;
    tracing::debug!(count = assets.len(), "Library scan complete");
    assets
}

/// Streams audio files found directly in `root` and in its immediate
/// sub-folders. Deeper folders are not visited.
///
/// Files are yielded as soon as they are discovered; a sub-folder is listed
/// at the point it is encountered, so the overall order matches directory
/// enumeration order. Unreadable directories and entries are skipped with a
/// warning.
pub fn scan_stream(root: PathBuf) -> impl Stream<Item = AudioAsset> {
    stream! {
        let mut entries = match open(&root).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = ?err, "Library directory is unreadable; treating it as empty");
                return;
            },
        };
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(path = %root.display(), error = %err, "Failed to read library entry");
                    continue;
                },
            };
            match classify(entry, None).await {
                WalkEntry::File(asset) => yield asset,
                WalkEntry::Descend(dir, folder) => {
                    let mut children = match open(&dir).await {
                        Ok(children) => children,
                        Err(err) => {
                            tracing::warn!(error = ?err, "Skipping unreadable folder");
                            continue;
                        },
                    };
                    loop {
                        match children.next_entry().await {
                            Ok(Some(child)) => {
                                // Only one level deep: nested folders are skipped.
                                if let WalkEntry::File(asset) = classify(child, Some(&folder)).await {
                                    yield asset;
                                }
                            },
                            Ok(None) => break,
                            Err(err) => {
                                tracing::warn!(path = %dir.display(), error = %err, "Failed to read library entry");
                                continue;
                            },
                        }
                    }
                },
                WalkEntry::Skip => {},
            }
        }
    }
}

async fn open(dir: &Path) -> Result<ReadDir> {
    fs::read_dir(dir).await.or_raise(|| ErrorKind::Unreadable(dir.to_path_buf()))
}

async fn classify(entry: DirEntry, folder: Option<&str>) -> WalkEntry {
    let path = entry.path();
    let metadata = match entry.metadata().await {
        Ok(metadata) => metadata,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Failed to stat library entry");
            return WalkEntry::Skip;
        },
    };
    let Some(name) = entry.file_name().to_str().map(str::to_string) else {
        tracing::warn!(path = %path.display(), "Skipping entry with a non-UTF-8 name");
        return WalkEntry::Skip;
    };
    if metadata.is_dir() {
        return WalkEntry::Descend(path, name);
    }
    if !metadata.is_file() {
        // Most likely a broken symlink.
        return WalkEntry::Skip;
    }
    let Some(format) = AudioFormat::from_path(&path) else {
        return WalkEntry::Skip;
    };
    WalkEntry::File(AudioAsset {
        modified: modified_at(&metadata),
        size: metadata.len(),
        folder: folder.map(str::to_string),
        file_name: name,
        absolute_path: path,
        format,
    })
}

fn modified_at(metadata: &Metadata) -> OffsetDateTime {
    metadata.modified().map(OffsetDateTime::from).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}
