use crate::backend::SearchIndex;
use crate::error::Result;
use crate::{BulkItem, Document};
use async_stream::stream;
use futures::Stream;

/// Write documents in batches of `chunk_size`, yielding one item per
/// document.
///
/// Refused documents are yielded as failed items and the stream carries on.
/// A batch that fails as a whole yields its error and ends the stream.
pub fn stream_bulk<'a>(
    index: &'a dyn SearchIndex,
    collection: &'a str,
    documents: Vec<Document>,
    chunk_size: usize,
) -> impl Stream<Item = Result<BulkItem>> + 'a {
    stream!({
        let mut documents = documents.into_iter().peekable();
        while documents.peek().is_some() {
            let chunk = documents.by_ref().take(chunk_size.max(1)).collect::<Vec<_>>();
            let items = match index.bulk(collection, chunk).await {
                Ok(items) => items,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            for item in items {
                yield Ok(item);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockIndex;
    use futures::StreamExt;
    use serde_json::json;

    fn documents(count: usize) -> Vec<Document> {
        (0..count)
            .map(|i| Document {
                id: format!("e{i}"),
                body: json!({"uuid": format!("e{i}")}),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_refused_document_does_not_block_batch() {
        let index = MockIndex::default().reject("e1");
        let items = stream_bulk(&index, "cce", documents(5), 2).collect::<Vec<_>>().await;
        let verdicts = items.into_iter().map(|i| i.unwrap().ok).collect::<Vec<_>>();
        assert_eq!(verdicts, vec![true, false, true, true, true]);
        assert_eq!(index.requests(), 3);
        assert_eq!(index.documents("cce").await.len(), 4);
    }

    #[tokio::test]
    async fn test_transport_failure_ends_stream() {
        let index = MockIndex::default();
        index.fail_transport();
        let items = stream_bulk(&index, "cce", documents(5), 2).collect::<Vec<_>>().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        let index = MockIndex::default();
        let items = stream_bulk(&index, "cce", Vec::new(), 500).collect::<Vec<_>>().await;
        assert!(items.is_empty());
        assert_eq!(index.requests(), 0);
    }
}
