//! SQLite pool for the registration and renewal store.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::migrate::Migrator;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::Session;
use crate::error::{ErrorKind, Result};

static SCHEMA: Migrator = sqlx::migrate!("./migrations");
// Imports are sequential; the extra connections serve the indexer's reads.
const POOL_SIZE: u32 = 4;

/// Handle on the store.
///
/// Writes go through a [`Session`] (one transaction per imported file),
/// reads for the indexer through a [`Repository`](crate::Repository).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the store file at `path` and bring its schema up to date.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = Self::options().filename(path.as_ref()).create_if_missing(true);
        Self::open(options, POOL_SIZE).await
    }

    /// Private, throwaway store. Not test-gated because downstream crates
    /// build their fixtures on it.
    ///
    /// Every connection to `:memory:` is its own database, so the pool holds
    /// exactly one. An open [`Session`] therefore has to finish before a
    /// [`Repository`](crate::Repository) can read.
    pub async fn connect_in_memory() -> Result<Self> {
        Self::open(Self::options().filename(":memory:"), 1).await
    }

    async fn open(options: SqliteConnectOptions, size: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(size)
            // Runs for each pooled connection, not just the first.
            .after_connect(|conn, meta| Box::pin(async move { Self::tune(conn, meta).await }))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    fn options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // A long import holds the write lock for a whole file.
            .busy_timeout(Duration::from_secs(5))
    }

    async fn tune(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query("PRAGMA wal_autocheckpoint = 1000; PRAGMA cache_size = -16384; PRAGMA temp_store = MEMORY;")
            .execute(conn)
            .await
            .map(drop)
    }

    #[instrument("migrating store schema", skip(self))]
    async fn migrate(&self) -> Result<()> {
        SCHEMA.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    /// Drop every table and migrate from scratch.
    ///
    /// Destroys all imported data.
    #[instrument(skip(self))]
    pub async fn reinitialize(&self) -> Result<()> {
        tracing::warn!("Dropping all imported data");
        sqlx::query(include_str!("../queries/reinitialize.sql"))
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        self.migrate().await
    }

    /// Start a transactional session for importing one file.
    pub async fn begin(&self) -> Result<Session> {
        Session::begin(self).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Refresh planner statistics, then wait for connections to drain and close them.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scalar(db: &Database, sql: &str) -> i64 {
        let (value,): (i64,) = sqlx::query_as(sql).fetch_one(db.pool()).await.unwrap();
        value
    }

    #[tokio::test]
    async fn test_open_and_close() {
        let db = Database::connect_in_memory().await.unwrap();
        assert!(!db.pool().is_closed());
        db.close().await;
        assert!(db.pool().is_closed());
    }

    #[tokio::test]
    async fn test_schema_migrates_twice() {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        assert_eq!(scalar(&db, "SELECT COUNT(*) FROM volume").await, 0);
    }

    #[tokio::test]
    async fn test_connection_tuning() {
        let db = Database::connect_in_memory().await.unwrap();
        assert_eq!(scalar(&db, "PRAGMA foreign_keys").await, 1);
        assert_eq!(scalar(&db, "PRAGMA wal_autocheckpoint").await, 1000);
        assert_eq!(scalar(&db, "PRAGMA cache_size").await, -16384);
    }

    #[tokio::test]
    async fn test_reinitialize_empties_tables() {
        let db = Database::connect_in_memory().await.unwrap();
        sqlx::query("INSERT INTO volume (source_path, date_created, date_modified) VALUES ('xml/1950/a.xml', 0, 0)")
            .execute(db.pool())
            .await
            .unwrap();
        db.reinitialize().await.unwrap();
        assert_eq!(scalar(&db, "SELECT COUNT(*) FROM volume").await, 0);
    }
}
