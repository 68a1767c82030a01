use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

const DEGRADED_PREFIX: &str = "urn:podshelf:crc32:";

/// Digest used to derive identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Digest {
    /// BLAKE3 over `(path, size)`, truncated to 16 bytes and rendered as a
    /// `urn:uuid:` URN.
    #[default]
    Blake3,
    /// CRC32 over the path alone. Degraded: collisions are plausible and a
    /// size change does not produce a new identifier.
    Crc32,
}

/// Stable, opaque identifier for a feed item (the item's GUID).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);
impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier came from the degraded [`Digest::Crc32`] path.
    pub fn is_degraded(&self) -> bool {
        self.0.starts_with(DEGRADED_PREFIX)
    }
}
impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives item identifiers from `(absolute path, size in bytes)`.
///
/// Identifiers are a pure function of those two values, so they survive
/// process restarts and ignore modification times (touching a file must not
/// re-publish it as a new episode). Results are memoized for the lifetime of
/// the generator; the table only ever grows.
///
/// ```
/// use podshelf_library::IdentifierGenerator;
/// use std::path::Path;
///
/// let ids = IdentifierGenerator::default();
/// let id = ids.identify(Path::new("/library/set.mp3"), 1024);
/// assert!(id.as_str().starts_with("urn:uuid:"));
/// assert_eq!(id, IdentifierGenerator::default().identify(Path::new("/library/set.mp3"), 1024));
/// ```
#[derive(Debug, Default)]
pub struct IdentifierGenerator {
    digest: Digest,
    memo: RwLock<HashMap<(PathBuf, u64), Identifier>>,
}
impl IdentifierGenerator {
    pub fn new(digest: Digest) -> Self {
        Self {
            digest,
            memo: RwLock::default(),
        }
    }

    pub fn identify(&self, path: &Path, size: u64) -> Identifier {
        let key = (path.to_path_buf(), size);
        // A poisoned lock only means another thread panicked mid-insert; the
        // map itself is still a valid cache of pure results.
        if let Some(found) = self.memo.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            return found.clone();
        }
        let identifier = match self.digest {
            Digest::Blake3 => Self::blake3(path, size),
            Digest::Crc32 => Self::crc32(path),
        };
        self.memo.write().unwrap_or_else(PoisonError::into_inner).entry(key).or_insert(identifier).clone()
    }

    /// Number of memoized identifiers.
    pub fn len(&self) -> usize {
        self.memo.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn blake3(path: &Path, size: u64) -> Identifier {
        let mut hasher = blake3::Hasher::new();
        hasher.update(path.as_os_str().as_encoded_bytes());
        hasher.update(&[0]);
        hasher.update(&size.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash.as_bytes()[..16]);
        Identifier(Uuid::from_bytes(bytes).urn().to_string())
    }

    fn crc32(path: &Path) -> Identifier {
        let checksum = crc32fast::hash(path.as_os_str().as_encoded_bytes());
        Identifier(format!("{DEGRADED_PREFIX}{checksum:08x}"))
    }
}
