//! Source fetcher trait and implementations.
//!
//! A fetcher is a read-only view of one versioned repository: list a
//! directory, ask when a path last changed, and fetch the bytes behind a
//! revision returned by a listing.

mod github;
mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::github::GitHubSource;
pub use self::local::LocalSource;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockSource;
use crate::SourceEntry;
use crate::error::Result;
use async_trait::async_trait;
use time::UtcDateTime;

/// Unified read-only interface over a source repository.
///
/// # Path Handling
/// Paths are relative to the repository root; a leading `/` is ignored.
/// Implementations validate them with [`validate_path`](crate::validate_path)
/// and refuse anything escaping the root.
///
/// # Examples
///
/// ```
/// use cce_source::{SourceFetcher, error::Result};
///
/// async fn first_file(source: &dyn SourceFetcher) -> Result<Option<Vec<u8>>> {
///     let listing = source.list_directory("/data").await?;
///     match listing.iter().find(|e| !e.is_dir()) {
///         Some(entry) => Ok(Some(source.get_blob(&entry.revision).await?)),
///         None => Ok(None),
///     }
/// }
/// ```
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Name of the configured source (used for logging only).
    fn name(&self) -> &str;

    /// List the immediate children of a directory, sorted by name.
    async fn list_directory(&self, path: &str) -> Result<Vec<SourceEntry>>;

    /// When the file at `path` was last changed in the repository.
    async fn latest_change_time(&self, path: &str) -> Result<UtcDateTime>;

    /// Raw bytes for a revision taken from [`SourceEntry::revision`].
    async fn get_blob(&self, revision: &str) -> Result<Vec<u8>>;
}
