//! Elasticsearch over a single node.

use crate::backend::SearchIndex;
use crate::error::{ErrorKind, Result};
use crate::{BulkItem, Document};
use async_trait::async_trait;
use elasticsearch::http::Url;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{IndicesCreateParts, IndicesExistsParts};
use elasticsearch::{BulkOperation, BulkParts, Elasticsearch};
use exn::{OptionExt, ResultExt};
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

#[derive(Clone)]
pub struct ElasticsearchIndex {
    client: Elasticsearch,
}
impl ElasticsearchIndex {
    /// Connect and ping the node. A node that doesn't answer within `timeout`
    /// is an error here rather than on the first write.
    #[instrument(skip(timeout))]
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let url: Url = url.parse().or_raise(|| ErrorKind::Configuration("index url is not a valid URL"))?;
        let transport = TransportBuilder::new(SingleNodeConnectionPool::new(url))
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::Configuration("could not build index transport"))?;
        let client = Elasticsearch::new(transport);
        let response = client.ping().send().await.or_raise(|| ErrorKind::Unavailable)?;
        if !response.status_code().is_success() {
            exn::bail!(ErrorKind::Unavailable);
        }
        Ok(Self { client })
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .or_raise(|| ErrorKind::Transport)?;
        Ok(response.status_code().is_success())
    }

    #[instrument(skip(self, mapping))]
    async fn create_collection(&self, name: &str, mapping: &Value) -> Result<()> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(mapping)
            .send()
            .await
            .or_raise(|| ErrorKind::Transport)?;
        let status = response.status_code();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status {
                status: status.as_u16(),
                collection: name.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    async fn bulk(&self, name: &str, documents: Vec<Document>) -> Result<Vec<BulkItem>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let operations = documents
            .into_iter()
            .map(|d| BulkOperation::index(d.body).id(d.id).into())
            .collect::<Vec<BulkOperation<Value>>>();
        let response = self
            .client
            .bulk(BulkParts::Index(name))
            .body(operations)
            .send()
            .await
            .or_raise(|| ErrorKind::Transport)?;
        let status = response.status_code();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status {
                status: status.as_u16(),
                collection: name.to_string(),
            });
        }
        let body = response
            .json::<Value>()
            .await
            .or_raise(|| ErrorKind::InvalidResponse("bulk response is not JSON"))?;
        parse_bulk_response(&body)
    }
}

/// One [`BulkItem`] per entry of the response's `items` array.
fn parse_bulk_response(body: &Value) -> Result<Vec<BulkItem>> {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_raise(|| ErrorKind::InvalidResponse("bulk response has no items"))?;
    Ok(items.iter().map(parse_bulk_item).collect())
}

fn parse_bulk_item(item: &Value) -> BulkItem {
    // Each item is keyed by its action: {"index": {...}}.
    let Some(result) = item.as_object().and_then(|o| o.values().next()) else {
        return BulkItem::failed("", "malformed bulk item");
    };
    let id = result.get("_id").and_then(Value::as_str).unwrap_or_default();
    let status = result.get("status").and_then(Value::as_u64).unwrap_or_default();
    match result.get("error") {
        Some(error) => {
            let reason = error
                .get("reason")
                .and_then(Value::as_str)
                .or_else(|| error.get("type").and_then(Value::as_str))
                .unwrap_or("unknown error");
            BulkItem::failed(id, reason)
        },
        None if (200..300).contains(&status) => BulkItem::ok(id),
        None => BulkItem::failed(id, format!("status {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bulk_response() {
        let body = json!({
            "took": 3,
            "errors": true,
            "items": [
                {"index": {"_index": "cce", "_id": "e1", "status": 201, "result": "created"}},
                {"index": {"_index": "cce", "_id": "e2", "status": 400, "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [registrations.regdate]"
                }}},
                {"index": {"_index": "cce", "_id": "e3", "status": 200, "result": "updated"}},
                {"index": {"_index": "cce", "_id": "e4", "status": 429}}
            ]
        });
        let items = parse_bulk_response(&body).unwrap();
        let summary = items.iter().map(|i| (i.id.as_str(), i.ok)).collect::<Vec<_>>();
        assert_eq!(summary, vec![("e1", true), ("e2", false), ("e3", true), ("e4", false)]);
        assert_eq!(items[1].detail.as_deref(), Some("failed to parse field [registrations.regdate]"));
        assert_eq!(items[3].detail.as_deref(), Some("status 429"));
    }

    #[test]
    fn test_missing_items_is_invalid() {
        let err = parse_bulk_response(&json!({"error": "nope"})).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidResponse(_)));
    }

    #[test]
    fn test_malformed_item() {
        let item = parse_bulk_item(&json!("index"));
        assert!(!item.ok);
        assert_eq!(item.id, "");
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let err = ElasticsearchIndex::connect("not a url", Duration::from_secs(1)).await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::Configuration(_)));
    }
}
