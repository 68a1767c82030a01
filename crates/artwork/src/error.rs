//! Artwork Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An artwork error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for artwork operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Feed building treats every one of these as "no cover for this item".
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Source bytes are not an image we can decode.
    #[display("could not decode source image")]
    Decode,
    /// The derived image could not be encoded.
    #[display("could not encode derived image")]
    Encode,
    /// The blocking image worker did not finish.
    #[display("image worker did not complete")]
    Worker,
    /// Transport-level failure fetching a remote image.
    #[display("failed to fetch {_0}")]
    Fetch(#[error(not(source))] String),
    /// The remote server answered with a non-success status.
    #[display("remote image request returned HTTP {_0}")]
    Status(#[error(not(source))] u16),
    /// The backing store failed.
    #[display("cover store error")]
    Storage,
    /// A requested cover file name is not one we generate.
    #[display("not a cover file name: {_0}")]
    InvalidName(#[error(not(source))] String),
    /// No cover with that name has been derived.
    #[display("cover not found: {_0}")]
    NotFound(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(_) | Self::Storage | Self::Worker => true,
            Self::Status(code) => *code >= 500 || *code == 429,
            Self::Decode | Self::Encode | Self::InvalidName(_) | Self::NotFound(_) => false,
        }
    }
}
