//! Ingest Error Types
//!
//! Anything surfacing here aborts the current file: its session is rolled
//! back and the import stream ends. Entries that fail to parse are not errors
//! at this level; they are quarantined and counted.

use derive_more::{Display, Error};

/// An ingest error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for ingest operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not list source files")]
    Discovery,
    #[display("could not fetch {_0}")]
    Fetch(#[error(not(source))] String),
    #[display("{_0} is not valid UTF-8")]
    Encoding(#[error(not(source))] String),
    #[display("could not parse {_0}")]
    Parse(#[error(not(source))] String),
    #[display("store rejected changes from {_0}")]
    Store(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Discovery | Self::Fetch(_))
    }
}
