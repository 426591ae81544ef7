//! In-memory source for testing.

use crate::error::{ErrorKind, Result};
use crate::path::normalize;
use crate::{EntryKind, SourceEntry, SourceFetcher};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use time::UtcDateTime;
use tokio::sync::RwLock;

/// In-memory repository for testing.
///
/// Files live in a map behind a [`RwLock`] so tests can add or replace files
/// between imports through `&self`. Directories are implied by file paths.
/// Revisions are the normalized file paths.
///
/// ```
/// use cce_source::backend::MockSource;
/// use cce_source::SourceFetcher;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MockSource::with_files([("data/1950.tsv", "entry_id\toreg\n")]);
/// let listing = source.list_directory("/data").await?;
/// assert_eq!(listing[0].name, "1950.tsv");
/// # Ok(())
/// # }
/// ```
pub struct MockSource {
    files: RwLock<BTreeMap<String, (UtcDateTime, Vec<u8>)>>,
}

impl MockSource {
    /// Create a mock source pre-populated with files, all changed "now".
    ///
    /// Panics if any path fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl AsRef<str>, impl Into<Vec<u8>>)>) -> Self {
        let now = UtcDateTime::now();
        let mut map = BTreeMap::new();
        for (path, data) in files {
            let Ok(normalized) = normalize(path.as_ref()) else {
                panic!("MockSource::with_files: invalid path {}", path.as_ref());
            };
            map.insert(normalized, (now, data.into()));
        }
        Self { files: RwLock::new(map) }
    }

    /// Add or replace a file, recording when it changed.
    pub async fn put(&self, path: &str, data: impl Into<Vec<u8>>, changed: UtcDateTime) {
        let Ok(normalized) = normalize(path) else {
            panic!("MockSource::put: invalid path {path}");
        };
        self.files.write().await.insert(normalized, (changed, data.into()));
    }
}
impl Default for MockSource {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl SourceFetcher for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<SourceEntry>> {
        let dir = normalize(path)?;
        let prefix = match dir.is_empty() {
            true => String::new(),
            false => format!("{dir}/"),
        };
        let guard = self.files.read().await;
        let mut dirs = BTreeSet::new();
        let mut entries = Vec::new();
        for file in guard.keys().filter(|k| k.starts_with(&prefix)) {
            let rest = &file[prefix.len()..];
            match rest.split_once('/') {
                Some((child, _)) => {
                    dirs.insert(child.to_string());
                },
                None => entries.push(SourceEntry::new(rest, file.clone(), file.clone(), EntryKind::File)),
            }
        }
        if entries.is_empty() && dirs.is_empty() {
            exn::bail!(ErrorKind::NotFound(dir));
        }
        entries.extend(dirs.into_iter().map(|name| {
            let path = format!("{prefix}{name}");
            SourceEntry::new(name, path.clone(), path, EntryKind::Dir)
        }));
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn latest_change_time(&self, path: &str) -> Result<UtcDateTime> {
        let path = normalize(path)?;
        let guard = self.files.read().await;
        guard.get(&path).map(|(changed, _)| *changed).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn get_blob(&self, revision: &str) -> Result<Vec<u8>> {
        let revision = normalize(revision)?;
        let guard = self.files.read().await;
        guard.get(&revision).map(|(_, data)| data.clone()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(revision)))
    }
}
