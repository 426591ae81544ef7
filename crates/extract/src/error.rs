//! Extraction Error Types
//!
//! Two layers of failure exist while parsing:
//!
//! - [`ErrorKind`]: the whole file cannot be processed (broken XML, no header,
//!   an element kind we don't know how to handle, a TSV missing a column).
//! - [`EntryError`]: a single registration entry is malformed. These are
//!   data, not control flow: the importer turns them into quarantine records
//!   and carries on with the next entry.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The XML is too broken to process.
    #[display("malformed XML: {_0}")]
    MalformedXml(#[error(not(source))] String),
    /// The document has no `header` element to build a volume from.
    #[display("missing volume header")]
    MissingHeader,
    /// A top-level element outside the known set. Either the source format
    /// changed or the wrong file was fed in.
    #[display("unknown element: <{_0}>")]
    UnknownElement(#[error(not(source))] String),
    /// An element lacks an attribute that every record depends on.
    #[display("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: &'static str, attribute: &'static str },
    /// The tabular file is missing a column (under every accepted name).
    #[display("missing column: {_0}")]
    MissingColumn(#[error(not(source))] &'static str),
    /// The tabular file could not be read.
    #[display("malformed TSV: {_0}")]
    MalformedTsv(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Source files are either parseable or they're not.
        false
    }
}

/// Why a single registration entry was quarantined.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum EntryError {
    /// The entry has no `regnum` attribute at all.
    #[display("missing_regnum")]
    MissingRegnum,
    /// A token looked like a registration number range but couldn't be split
    /// into a prefix, a start, and an end.
    #[display("regnum_range_parsing_error")]
    RangeParsing { token: String },
    /// Registration numbers and registration dates could not be paired up.
    #[display("regnum_date_mismatch")]
    DateMismatch { regnums: Vec<String>, dates: usize },
}
impl EntryError {
    /// Stable reason code stored on the quarantine record.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingRegnum => "missing_regnum",
            Self::RangeParsing { .. } => "regnum_range_parsing_error",
            Self::DateMismatch { .. } => "regnum_date_mismatch",
        }
    }

    /// Registration numbers worth keeping on the quarantine record.
    pub fn regnum(&self) -> Option<String> {
        match self {
            Self::DateMismatch { regnums, .. } => Some(regnums.join("; ")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_matches_display() {
        let errors = [
            EntryError::MissingRegnum,
            EntryError::RangeParsing { token: "A1-B2".to_string() },
            EntryError::DateMismatch { regnums: vec![], dates: 2 },
        ];
        for error in errors {
            assert_eq!(error.reason(), error.to_string());
        }
    }

    #[test]
    fn test_mismatch_regnum_is_joined() {
        let error = EntryError::DateMismatch {
            regnums: vec!["A1".to_string(), "A2".to_string()],
            dates: 0,
        };
        assert_eq!(error.regnum().as_deref(), Some("A1; A2"));
        assert_eq!(EntryError::MissingRegnum.regnum(), None);
    }
}
