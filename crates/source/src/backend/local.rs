//! Local checkout source.
//!
//! Reads a working copy of a repository from the local filesystem via
//! `tokio::fs`. Revisions are repository-relative paths and the change time
//! is the file's modification time.

use crate::error::{ErrorKind, Result};
use crate::path::{normalize, validate as validate_path};
use crate::{EntryKind, SourceEntry, SourceFetcher};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::fs;
use tracing::instrument;

/// A local directory standing in for a remote repository.
///
/// ```no_run
/// use cce_source::backend::LocalSource;
///
/// # fn example() -> cce_source::error::Result<()> {
/// let source = LocalSource::new("cce", "/srv/catalog_of_copyright_entries_project")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalSource {
    name: String,
    root: PathBuf,
}
impl LocalSource {
    /// The root must be an existing absolute directory; sources are
    /// read-only so it is never created.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || !root.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root })
    }

    fn absolute_path(&self, path: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_path(path)?))
    }

    fn map_io_error(e: std::io::Error, path: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_string()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl SourceFetcher for LocalSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn list_directory(&self, path: &str) -> Result<Vec<SourceEntry>> {
        let relative = normalize(path)?;
        let mut reader = fs::read_dir(self.absolute_path(path)?).await.map_err(|e| Self::map_io_error(e, path))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(ErrorKind::Io)? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };
            let kind = match entry.file_type().await.map_err(ErrorKind::Io)?.is_dir() {
                true => EntryKind::Dir,
                false => EntryKind::File,
            };
            let child = match relative.is_empty() {
                true => name.clone(),
                false => format!("{relative}/{name}"),
            };
            entries.push(SourceEntry::new(name, child.clone(), child, kind));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn latest_change_time(&self, path: &str) -> Result<UtcDateTime> {
        let metadata = fs::metadata(self.absolute_path(path)?).await.map_err(|e| Self::map_io_error(e, path))?;
        let modified = metadata.modified().map_err(ErrorKind::Io)?;
        Ok(UtcDateTime::from(modified))
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn get_blob(&self, revision: &str) -> Result<Vec<u8>> {
        let absolute = self.absolute_path(revision)?;
        Ok(fs::read(&absolute).await.map_err(|e| Self::map_io_error(e, revision))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn checkout() -> (TempDir, LocalSource) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("xml/1950")).unwrap();
        std::fs::write(dir.path().join("xml/1950/b.xml"), b"<b/>").unwrap();
        std::fs::write(dir.path().join("xml/1950/a.xml"), b"<a/>").unwrap();
        let source = LocalSource::new("local", dir.path()).unwrap();
        (dir, source)
    }

    #[test]
    fn test_relative_root_rejected() {
        assert!(LocalSource::new("local", "relative/path").is_err());
    }

    #[tokio::test]
    async fn test_list_directory_sorted() {
        let (_dir, source) = checkout();
        let root = source.list_directory("/xml").await.unwrap();
        assert_eq!(root, vec![SourceEntry::new("1950", "xml/1950", "xml/1950", EntryKind::Dir)]);
        let files = source.list_directory("xml/1950").await.unwrap();
        let names = files.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
        assert_eq!(files[0].path, "xml/1950/a.xml");
    }

    #[tokio::test]
    async fn test_get_blob_by_revision() {
        let (_dir, source) = checkout();
        let files = source.list_directory("xml/1950").await.unwrap();
        assert_eq!(source.get_blob(&files[1].revision).await.unwrap(), b"<b/>");
    }

    #[tokio::test]
    async fn test_missing_paths() {
        let (_dir, source) = checkout();
        assert!(source.list_directory("/data").await.is_err());
        assert!(source.get_blob("xml/1950/missing.xml").await.is_err());
        assert!(source.get_blob("../outside").await.is_err());
    }

    #[tokio::test]
    async fn test_latest_change_time_is_recent() {
        let (_dir, source) = checkout();
        let changed = source.latest_change_time("xml/1950/a.xml").await.unwrap();
        assert!(UtcDateTime::now() - changed < time::Duration::minutes(5));
    }
}
