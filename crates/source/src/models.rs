/// Whether a listed entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a repository directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Final path segment, e.g. `1950-v4-pt1.xml`.
    pub name: String,
    /// Path relative to the repository root, e.g. `xml/1950/1950-v4-pt1.xml`.
    pub path: String,
    /// Opaque identifier passed back to
    /// [`SourceFetcher::get_blob`](crate::SourceFetcher::get_blob). A content
    /// hash for remote repositories, the path itself for local ones.
    pub revision: String,
    pub kind: EntryKind,
}
impl SourceEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>, revision: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            revision: revision.into(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}
