//! Read-only access for the search indexer.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::load;
use crate::models::{Cce, ErrorCce, ErrorCceRow, Renewal};
use exn::ResultExt;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};
use time::UtcDateTime;

/// Repository over committed data.
///
/// Never writes, so it can run alongside an import session on a file-backed
/// database (it only sees what that session has committed).
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    async fn connection(&self) -> Result<PoolConnection<Sqlite>> {
        self.pool.acquire().await.or_raise(|| ErrorKind::Database)
    }

    fn checkpoint(since: Option<UtcDateTime>) -> i64 {
        since.map_or(i64::MIN, UtcDateTime::unix_timestamp)
    }

    /// Entries modified strictly after `since`, or every entry if `None`.
    pub async fn entries_modified_since(&self, since: Option<UtcDateTime>) -> Result<Vec<Cce>> {
        let mut conn = self.connection().await?;
        load::cces_modified_since(&mut conn, Self::checkpoint(since)).await
    }

    /// Renewals modified strictly after `since`, or every renewal if `None`.
    pub async fn renewals_modified_since(&self, since: Option<UtcDateTime>) -> Result<Vec<Renewal>> {
        let mut conn = self.connection().await?;
        load::renewals_modified_since(&mut conn, Self::checkpoint(since)).await
    }

    pub async fn get_cce(&self, uuid: &str) -> Result<Option<Cce>> {
        let mut conn = self.connection().await?;
        load::cce_by_uuid(&mut conn, uuid).await
    }

    pub async fn get_renewal(&self, uuid: &str) -> Result<Option<Renewal>> {
        let mut conn = self.connection().await?;
        load::renewal_by_uuid(&mut conn, uuid).await
    }

    /// Every quarantined entry, oldest first.
    pub async fn error_entries(&self) -> Result<Vec<ErrorCce>> {
        let rows: Vec<ErrorCceRow> = sqlx::query_as(include_str!("../queries/list_error_cce.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(ErrorCce::try_from).collect()
    }
}
