use crate::backend::SearchIndex;
use crate::error::{ErrorKind, Result};
use crate::{Document, cce_document, cce_mapping, renewal_document, renewal_mapping, stream_bulk};
use cce_store::Repository;
use derive_more::{Add, AddAssign};
use exn::ResultExt;
use futures::StreamExt;
use std::pin::pin;
use time::UtcDateTime;
use tracing::instrument;

/// Where documents go and how many are sent per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    pub cce_collection: String,
    pub ccr_collection: String,
    pub chunk_size: usize,
}
impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            cce_collection: "cce".to_string(),
            ccr_collection: "ccr".to_string(),
            chunk_size: 500,
        }
    }
}

impl IndexSettings {
    /// Create whichever collection is missing. Existing collections are left
    /// as they are, mapping included.
    #[instrument(skip(index))]
    pub async fn ensure_collections(&self, index: &dyn SearchIndex) -> Result<()> {
        let collections = [(&self.cce_collection, cce_mapping()), (&self.ccr_collection, renewal_mapping())];
        for (name, mapping) in collections {
            if index.collection_exists(name).await? {
                tracing::debug!(collection = %name, "Collection exists");
                continue;
            }
            index.create_collection(name, &mapping).await?;
            tracing::info!(collection = %name, "Created collection");
        }
        Ok(())
    }
}

/// Outcome counts for one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Add, AddAssign)]
pub struct IndexStats {
    pub success: u64,
    pub failure: u64,
    /// Records that produce no document.
    pub skipped: u64,
}

/// Reads changed records from the store and loads them into the index.
///
/// Reads happen outside any import session and never write to the store.
pub struct Indexer<'a> {
    index: &'a dyn SearchIndex,
    repo: &'a Repository,
    settings: IndexSettings,
}

impl<'a> Indexer<'a> {
    pub fn new(index: &'a dyn SearchIndex, repo: &'a Repository, settings: IndexSettings) -> Self {
        Self { index, repo, settings }
    }

    /// Index registration entries modified after `since` (all of them when
    /// `None`).
    #[instrument(skip(self))]
    pub async fn index_entries(&self, since: Option<UtcDateTime>) -> Result<IndexStats> {
        let entries = self.repo.entries_modified_since(since).await.or_raise(|| ErrorKind::Store)?;
        let mut stats = IndexStats::default();
        let mut documents = Vec::with_capacity(entries.len());
        for cce in &entries {
            match cce_document(cce) {
                Ok(document) => documents.push(document),
                Err(e) => {
                    tracing::warn!(uuid = %cce.uuid, error = ?e, "Could not build document");
                    stats.failure += 1;
                },
            }
        }
        let stats = self.load(&self.settings.cce_collection, documents, stats).await?;
        tracing::info!(success = stats.success, failure = stats.failure, "Indexed registration entries");
        Ok(stats)
    }

    /// Index renewals modified after `since` (all of them when `None`).
    #[instrument(skip(self))]
    pub async fn index_renewals(&self, since: Option<UtcDateTime>) -> Result<IndexStats> {
        let renewals = self.repo.renewals_modified_since(since).await.or_raise(|| ErrorKind::Store)?;
        let mut stats = IndexStats::default();
        let mut documents = Vec::with_capacity(renewals.len());
        for renewal in &renewals {
            match renewal_document(renewal) {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {
                    tracing::debug!(uuid = %renewal.uuid, "Renewal has no renewal number");
                    stats.skipped += 1;
                },
                Err(e) => {
                    tracing::warn!(uuid = %renewal.uuid, error = ?e, "Could not build document");
                    stats.failure += 1;
                },
            }
        }
        let stats = self.load(&self.settings.ccr_collection, documents, stats).await?;
        tracing::info!(
            success = stats.success,
            failure = stats.failure,
            skipped = stats.skipped,
            "Indexed renewals"
        );
        Ok(stats)
    }

    async fn load(&self, collection: &str, documents: Vec<Document>, mut stats: IndexStats) -> Result<IndexStats> {
        let mut items = pin!(stream_bulk(self.index, collection, documents, self.settings.chunk_size));
        while let Some(item) = items.next().await {
            let item = item?;
            match item.ok {
                true => stats.success += 1,
                false => {
                    tracing::warn!(collection, id = %item.id, detail = item.detail.as_deref(), "Document refused");
                    stats.failure += 1;
                },
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockIndex;
    use cce_extract::models::DateValue;
    use cce_store::Database;
    use cce_store::models::{Cce, Registration, Renewal, Volume};

    async fn seed(db: &Database) {
        let mut session = db.begin().await.unwrap();
        let mut volume = Volume::new("xml/1950/1950.xml", Default::default());
        session.save_volume(&mut volume).await.unwrap();
        for uuid in ["e1", "e2", "e3"] {
            let mut cce = Cce::new(uuid, volume.id.unwrap());
            cce.title = format!("Title {uuid}");
            cce.registrations = vec![Registration::new(format!("A{uuid}"), "A", DateValue::default())];
            session.save_cce(&mut cce).await.unwrap();
        }
        for (uuid, number) in [("r1", "R1"), ("r2", "")] {
            let mut renewal = Renewal::new(uuid);
            renewal.renewal_num = number.to_string();
            session.save_renewal(&mut renewal).await.unwrap();
        }
        session.commit().await.unwrap();
    }

    fn settings() -> IndexSettings {
        IndexSettings {
            chunk_size: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_collections_created_once() {
        let index = MockIndex::default();
        settings().ensure_collections(&index).await.unwrap();
        settings().ensure_collections(&index).await.unwrap();
        assert_eq!(index.created(), 2);
        assert_eq!(index.mapping("cce").await, Some(cce_mapping()));
    }

    #[tokio::test]
    async fn test_index_entries_counts_refusals() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db).await;
        let repo = Repository::from(&db);
        let index = MockIndex::default().reject("e2");
        let indexer = Indexer::new(&index, &repo, settings());
        let stats = indexer.index_entries(None).await.unwrap();
        assert_eq!(stats, IndexStats {
            success: 2,
            failure: 1,
            skipped: 0,
        });
        let documents = index.documents("cce").await;
        assert_eq!(documents.keys().map(String::as_str).collect::<Vec<_>>(), vec!["e1", "e3"]);
        assert_eq!(documents["e1"]["registrations"][0]["regnum"], "Ae1");
    }

    #[tokio::test]
    async fn test_unbuildable_record_does_not_block_the_rest() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db).await;
        // Year -2: stored fine, but not representable as RFC 3339.
        for table in ["cce", "renewal"] {
            sqlx::query(&format!("UPDATE {table} SET date_created = -62200000000 WHERE uuid IN ('e2', 'r1')"))
                .execute(db.pool())
                .await
                .unwrap();
        }
        let repo = Repository::from(&db);
        let index = MockIndex::default();
        let indexer = Indexer::new(&index, &repo, settings());

        let stats = indexer.index_entries(None).await.unwrap();
        assert_eq!(stats, IndexStats {
            success: 2,
            failure: 1,
            skipped: 0,
        });
        let documents = index.documents("cce").await;
        assert_eq!(documents.keys().map(String::as_str).collect::<Vec<_>>(), vec!["e1", "e3"]);

        let stats = indexer.index_renewals(None).await.unwrap();
        assert_eq!(stats, IndexStats {
            success: 0,
            failure: 1,
            skipped: 1,
        });
    }

    #[tokio::test]
    async fn test_index_renewals_skips_incomplete() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db).await;
        let repo = Repository::from(&db);
        let index = MockIndex::default();
        let indexer = Indexer::new(&index, &repo, settings());
        let stats = indexer.index_renewals(None).await.unwrap();
        assert_eq!(stats.success, 1);
        assert_eq!(stats.skipped, 1);
        assert!(index.documents("ccr").await.contains_key("R1"));
    }

    #[tokio::test]
    async fn test_checkpoint_limits_documents() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db).await;
        let repo = Repository::from(&db);
        let index = MockIndex::default();
        let indexer = Indexer::new(&index, &repo, settings());
        let later = UtcDateTime::now() + time::Duration::hours(1);
        assert_eq!(indexer.index_entries(Some(later)).await.unwrap(), IndexStats::default());
        assert_eq!(index.requests(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db).await;
        let repo = Repository::from(&db);
        let index = MockIndex::default();
        index.fail_transport();
        let indexer = Indexer::new(&index, &repo, settings());
        let err = indexer.index_entries(None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Transport));
    }
}
