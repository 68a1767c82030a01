//! Storage backend trait and implementations.
//!
//! A [`StorageBackend`] is a flat blob store addressed by root-relative paths.
//! The local filesystem backend is what a running server uses; the in-memory
//! [`MockBackend`] (feature `mock`) exists for tests in dependent crates.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for asset stores.
///
/// # Path Handling
/// All paths are relative to the store root and are validated with
/// [`validate_path`](crate::validate_path) by every implementation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use podshelf_storage::{backend::StorageBackend, error::Result};
///
/// async fn fetch_or_empty(backend: &dyn StorageBackend, name: &str) -> Result<Vec<u8>> {
///     let path = Path::new(name);
///     if backend.exists(path).await? {
///         backend.read(path).await
///     } else {
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, replacing any existing file.
    ///
    /// # Notes
    /// - Implementations should create parent directories as needed.
    /// - Readers must never observe a partially written file; a concurrent
    ///   [`read`](Self::read) sees either the previous contents (or
    ///   `NotFound`) or the complete new contents.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
