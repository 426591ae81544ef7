//! Search indexing of imported registrations and renewals.
//!
//! Records changed since a checkpoint are turned into [`Document`]s and
//! streamed into one collection per record type in fixed-size bulk batches.
//! A document the index refuses is counted and skipped; a batch that fails as
//! a whole ends the run.

pub mod backend;
mod bulk;
mod document;
pub mod error;
mod indexer;
mod mapping;

pub use crate::backend::SearchIndex;
pub use crate::bulk::stream_bulk;
pub use crate::document::{cce_document, renewal_document};
pub use crate::indexer::{IndexSettings, IndexStats, Indexer};
pub use crate::mapping::{cce_mapping, renewal_mapping};
use serde_json::Value;

/// A document addressed by its id within a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// The index's verdict on one document of a bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItem {
    pub id: String,
    pub ok: bool,
    /// Why the document was refused.
    pub detail: Option<String>,
}
impl BulkItem {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: true,
            detail: None,
        }
    }

    pub fn failed(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: false,
            detail: Some(detail.into()),
        }
    }
}
