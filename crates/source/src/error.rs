//! Source Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A source error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Path or revision does not exist in the repository.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Could not reach the remote repository at all.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The remote repository answered, but not with success.
    #[display("remote responded with status {status} for {path}")]
    Status { status: u16, path: String },
    /// The remote repository answered with something we can't understand.
    #[display("unexpected response: {_0}")]
    InvalidResponse(#[error(not(source))] &'static str),
    /// The fetcher could not be constructed from the given settings.
    #[display("invalid source configuration: {_0}")]
    Configuration(#[error(not(source))] &'static str),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Nothing in the pipeline retries automatically; this only informs the
    /// operator whether re-running the job is worth a shot.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io(_) | Self::Network(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
