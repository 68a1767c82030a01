//! Service Error Types

use derive_more::{Display, Error};

/// A service error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The service could not be constructed from its configuration.
    #[display("could not initialize feed service")]
    Setup,
    /// The feed could not be built.
    #[display("feed unavailable")]
    Feed,
    /// No derived cover answers to this name.
    #[display("no cover named {_0}")]
    CoverNotFound(#[error(not(source))] String),
    /// The cover store failed.
    #[display("cover unavailable")]
    Cover,
    /// Output could not be written.
    #[display("could not write output")]
    Output,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Feed | Self::Cover)
    }
}
