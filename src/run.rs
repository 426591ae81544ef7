//! One loader run: import, then index.

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use cce_config::{Config, SourceConfig, SourceKind};
use cce_index::backend::ElasticsearchIndex;
use cce_index::{IndexSettings, Indexer, SearchIndex};
use cce_ingest::{Context, ImportEvent, ImportStats, import_registrations, import_renewals};
use cce_source::SourceHandle;
use cce_source::backend::{GitHubSource, LocalSource};
use cce_store::{Database, Repository};
use exn::ResultExt;
use futures::{Stream, StreamExt};
use std::path::Path;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use time::UtcDateTime;

pub async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let ctx = Context {
        since: cli.lookback(UtcDateTime::now()),
        year: cli.year,
    };
    tracing::info!(since = ?ctx.since, year = ctx.year, exclude = ?cli.exclude, "Starting run");

    // An unreachable index or a collection that can't be created fails the
    // run before anything is imported.
    let index = ElasticsearchIndex::connect(&config.index.url, Duration::from_secs(config.index.timeout_secs))
        .await
        .or_raise(|| ErrorKind::Index)?;
    let settings = prepare_index(&index, &config).await?;

    let db = open_database(&config.database.path).await?;
    if cli.reinitialize {
        db.reinitialize().await.or_raise(|| ErrorKind::Database)?;
    }
    let result = pipeline(cli, &config, &db, &index, settings, &ctx).await;
    db.close().await;
    result
}

async fn prepare_index(index: &dyn SearchIndex, config: &Config) -> Result<IndexSettings> {
    let settings = IndexSettings {
        cce_collection: config.index.cce_index.clone(),
        ccr_collection: config.index.ccr_index.clone(),
        chunk_size: config.index.chunk_size,
    };
    settings.ensure_collections(index).await.or_raise(|| ErrorKind::Index)?;
    Ok(settings)
}

async fn open_database(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Database)?;
    }
    Database::connect(path).await.or_raise(|| ErrorKind::Database)
}

fn open_source(config: &SourceConfig, name: &str, location: &str) -> Result<SourceHandle> {
    let source: SourceHandle = match config.kind {
        SourceKind::Github => Arc::new(
            GitHubSource::new(name, &config.api_url, location, config.token.as_deref()).or_raise(|| ErrorKind::Source)?,
        ),
        SourceKind::Local => Arc::new(LocalSource::new(name, location).or_raise(|| ErrorKind::Source)?),
    };
    Ok(source)
}

async fn pipeline(
    cli: &Cli,
    config: &Config,
    db: &Database,
    index: &ElasticsearchIndex,
    settings: IndexSettings,
    ctx: &Context,
) -> Result<()> {
    if cli.registrations() {
        let source = open_source(&config.source, "cce", &config.source.registrations)?;
        drain("registrations", import_registrations(source.as_ref(), db, ctx)).await?;
    }
    if cli.renewals() {
        let source = open_source(&config.source, "ccr", &config.source.renewals)?;
        drain("renewals", import_renewals(source.as_ref(), db, ctx)).await?;
    }

    let repo = Repository::from(db);
    let indexer = Indexer::new(index, &repo, settings);
    let entries = indexer.index_entries(ctx.since).await.or_raise(|| ErrorKind::Index)?;
    let renewals = indexer.index_renewals(ctx.since).await.or_raise(|| ErrorKind::Index)?;
    tracing::info!(
        entries = entries.success,
        renewals = renewals.success,
        refused = entries.failure + renewals.failure,
        "Run complete"
    );
    Ok(())
}

/// Consume an import stream, logging progress, and return the run totals.
async fn drain(
    kind: &'static str,
    events: impl Stream<Item = cce_ingest::error::Result<ImportEvent>>,
) -> Result<ImportStats> {
    let mut events = pin!(events);
    let mut total = ImportStats::default();
    while let Some(event) = events.next().await {
        match event.or_raise(|| ErrorKind::Import(kind))? {
            ImportEvent::Started => tracing::debug!(kind, "Import started"),
            ImportEvent::DiscoveryComplete(files) => tracing::info!(kind, files, "Importing files"),
            ImportEvent::Imported { path, stats } => {
                tracing::debug!(kind, %path, inserted = stats.inserted, updated = stats.updated, "File done");
            },
            ImportEvent::Complete(stats) => total = stats,
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cce_index::backend::MockIndex;
    use futures::stream;

    #[tokio::test]
    async fn test_drain_returns_totals() {
        let stats = ImportStats {
            files: 1,
            inserted: 2,
            ..Default::default()
        };
        let events = stream::iter([
            Ok(ImportEvent::Started),
            Ok(ImportEvent::DiscoveryComplete(1)),
            Ok(ImportEvent::Imported {
                path: "data/1950.tsv".to_string(),
                stats,
            }),
            Ok(ImportEvent::Complete(stats)),
        ]);
        assert_eq!(drain("renewals", events).await.unwrap(), stats);
    }

    #[tokio::test]
    async fn test_drain_stops_on_error() {
        let events = stream::iter([
            Ok(ImportEvent::Started),
            Err(exn::Exn::from(cce_ingest::error::ErrorKind::Discovery)),
        ]);
        let err = drain("registrations", events).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Import("registrations")));
    }

    #[tokio::test]
    async fn test_prepare_index_creates_configured_collections() {
        let mut config = Config::default();
        config.index.cce_index = "registrations".to_string();
        config.index.ccr_index = "renewals".to_string();
        let index = MockIndex::default();
        let settings = prepare_index(&index, &config).await.unwrap();
        assert_eq!(settings.chunk_size, config.index.chunk_size);
        assert!(index.mapping("registrations").await.is_some());
        assert!(index.mapping("renewals").await.is_some());

        prepare_index(&index, &config).await.unwrap();
        assert_eq!(index.created(), 2);
    }

    #[test]
    fn test_local_source_requires_directory() {
        let config = SourceConfig {
            kind: SourceKind::Local,
            ..Default::default()
        };
        assert!(open_source(&config, "cce", "relative/checkout").is_err());
    }
}
