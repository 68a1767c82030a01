//! Backing stores for assets podshelf derives at runtime (square cover art).
//!
//! Stores are flat, path-addressed blobs. Callers decide the naming scheme;
//! every path is validated by [`validate_path`] so nothing escapes the root.

pub mod backend;
pub mod error;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
