//! Repository path validation.
//!
//! Listing and blob paths come from remote directory listings and from the
//! command line; neither is allowed to step outside the repository root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a repository path, resolving `.` and `..` without touching the
/// filesystem.
///
/// A leading `/` is accepted and ignored, so `/xml/1950` and `xml/1950` name
/// the same directory. The repository root itself resolves to an empty path.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use cce_source::validate_path;
/// assert_eq!(validate_path("/xml/1950").unwrap(), Path::new("xml/1950"));
/// assert_eq!(validate_path("data/../data/1950.tsv").unwrap(), Path::new("data/1950.tsv"));
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a\0b").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
            },
        }
    }
    Ok(components.into_iter().collect())
}

/// Same as [`validate`], rendered with forward slashes for use in URLs and
/// as map keys.
pub(crate) fn normalize(path: impl AsRef<Path>) -> Result<String> {
    let validated = validate(path.as_ref())?;
    let parts = validated
        .components()
        .map(|c| c.as_os_str().to_str().ok_or_else(|| ErrorKind::InvalidPath(path.as_ref().to_path_buf())))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/xml", "xml")]
    #[case("xml/1950/", "xml/1950")]
    #[case("./data//1950.tsv", "data/1950.tsv")]
    #[case("wrong/../xml/./1950", "xml/1950")]
    #[case("/", "")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input).unwrap(), expected);
    }

    #[rstest]
    #[case("../secrets")]
    #[case("xml/../../secrets")]
    #[case("xml/a\0b")]
    fn test_rejected(#[case] input: &str) {
        assert!(validate(input).is_err());
    }
}
