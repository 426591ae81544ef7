//! Search index trait and implementations.

mod elastic;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::elastic::ElasticsearchIndex;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockIndex;
use crate::error::Result;
use crate::{BulkItem, Document};
use async_trait::async_trait;
use serde_json::Value;

/// A search engine holding named document collections.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create a collection from its mapping. Callers check
    /// [`collection_exists`](Self::collection_exists) first; an existing
    /// collection is never recreated.
    async fn create_collection(&self, name: &str, mapping: &Value) -> Result<()>;

    /// Write one batch of documents, returning one result per document in
    /// request order.
    ///
    /// Documents the index refuses come back as failed items. An `Err` means
    /// the batch as a whole failed.
    async fn bulk(&self, name: &str, documents: Vec<Document>) -> Result<Vec<BulkItem>>;
}
