//! Index Error Types

use derive_more::{Display, Error};

/// An indexing error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for indexing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Individual documents the index refuses are not errors; they come back as
/// failed [`BulkItem`](crate::BulkItem)s.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The index settings can't be used as given.
    #[display("invalid index configuration: {_0}")]
    Configuration(#[error(not(source))] &'static str),
    /// The index node did not answer within the request timeout.
    #[display("search index is unavailable")]
    Unavailable,
    /// A request failed below HTTP (connection reset, timeout).
    #[display("search index request failed")]
    Transport,
    /// The index answered a whole request with an error status.
    #[display("search index returned status {status} for {collection}")]
    Status { status: u16, collection: String },
    #[display("unexpected search index response: {_0}")]
    InvalidResponse(#[error(not(source))] &'static str),
    /// Records could not be read from the store.
    #[display("could not read records to index")]
    Store,
    #[display("could not serialize document {_0}")]
    Serialize(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable | Self::Transport => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Transport, true)]
    #[case(ErrorKind::Status { status: 503, collection: "cce".to_string() }, true)]
    #[case(ErrorKind::Status { status: 429, collection: "cce".to_string() }, true)]
    #[case(ErrorKind::Status { status: 400, collection: "cce".to_string() }, false)]
    #[case(ErrorKind::InvalidResponse("no items"), false)]
    fn test_retryable(#[case] kind: ErrorKind, #[case] retryable: bool) {
        assert_eq!(kind.is_retryable(), retryable);
    }
}
