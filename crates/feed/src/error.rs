//! Feed Error Types
//!
//! Build failures are shared between every caller waiting on the same
//! rebuild, so [`ErrorKind`] is `Clone`; the full error tree is logged once
//! where the rebuild fails.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A feed error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ErrorKind {
    /// The description template does not compile or uses unknown fields.
    #[display("invalid description template")]
    Template,
    /// Scanning found no audio files that could be published.
    #[display("no usable audio files in {}", _0.display())]
    NoAudioFiles(#[error(not(source))] PathBuf),
    /// The rebuild did not run to completion.
    #[display("feed build did not complete")]
    Build,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// An empty library may be filled later, so it is worth asking again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NoAudioFiles(_) | Self::Build => true,
            Self::Template => false,
        }
    }
}
