//! In-memory index for testing.

use crate::backend::SearchIndex;
use crate::error::{ErrorKind, Result};
use crate::{BulkItem, Document};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Collection {
    mapping: Value,
    documents: BTreeMap<String, Value>,
}

/// In-memory search index for testing.
///
/// Documents whose id was passed to [`reject`](Self::reject) come back as
/// failed items, the way a real index refuses a document that doesn't fit
/// its mapping. [`fail_transport`](Self::fail_transport) makes every bulk
/// request fail as a whole.
#[derive(Default)]
pub struct MockIndex {
    collections: RwLock<BTreeMap<String, Collection>>,
    rejected: HashSet<String>,
    transport_down: AtomicBool,
    created: AtomicUsize,
    requests: AtomicUsize,
}

impl MockIndex {
    pub fn reject(mut self, id: impl Into<String>) -> Self {
        self.rejected.insert(id.into());
        self
    }

    pub fn fail_transport(&self) {
        self.transport_down.store(true, Ordering::SeqCst);
    }

    /// How many collections were created through [`SearchIndex::create_collection`].
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// How many bulk requests were sent.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub async fn documents(&self, name: &str) -> BTreeMap<String, Value> {
        self.collections.read().await.get(name).map(|c| c.documents.clone()).unwrap_or_default()
    }

    pub async fn mapping(&self, name: &str) -> Option<Value> {
        self.collections.read().await.get(name).map(|c| c.mapping.clone())
    }
}

#[async_trait]
impl SearchIndex for MockIndex {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, name: &str, mapping: &Value) -> Result<()> {
        let mut guard = self.collections.write().await;
        if guard.contains_key(name) {
            exn::bail!(ErrorKind::Status {
                status: 400,
                collection: name.to_string(),
            });
        }
        guard.insert(name.to_string(), Collection {
            mapping: mapping.clone(),
            documents: BTreeMap::new(),
        });
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn bulk(&self, name: &str, documents: Vec<Document>) -> Result<Vec<BulkItem>> {
        if self.transport_down.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Transport);
        }
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.collections.write().await;
        let collection = guard.entry(name.to_string()).or_default();
        let items = documents
            .into_iter()
            .map(|document| match self.rejected.contains(&document.id) {
                true => BulkItem::failed(document.id, "mapper_parsing_exception"),
                false => {
                    let item = BulkItem::ok(&document.id);
                    collection.documents.insert(document.id, document.body);
                    item
                },
            })
            .collect();
        Ok(items)
    }
}
