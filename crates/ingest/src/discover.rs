//! Finding the files a run has to import.
//!
//! Registration files live under `/xml/<year>/`, renewal files directly under
//! `/data`. A file is skipped when it last changed before the run's lookback
//! instant.

use crate::Context;
use crate::error::{ErrorKind, Result};
use cce_source::{SourceEntry, SourceFetcher};
use exn::ResultExt;
use regex::Regex;
use std::sync::LazyLock;
use tracing::instrument;

static YEAR_DIR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^19[0-9]{2}$").unwrap());
static RENEWAL_FILE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]{4}).*\.tsv$").unwrap());

/// Scanned page images and tables of contents sit beside the entries.
const SKIPPED_MARKERS: [&str; 2] = ["alto", "TOC"];

fn wants_year(ctx: &Context, year: &str) -> bool {
    ctx.year.is_none_or(|selected| selected.to_string() == year)
}

async fn changed_since(source: &dyn SourceFetcher, ctx: &Context, file: &SourceEntry) -> Result<bool> {
    let Some(since) = ctx.since else {
        return Ok(true);
    };
    let changed = source.latest_change_time(&file.path).await.or_raise(|| ErrorKind::Discovery)?;
    Ok(changed >= since)
}

/// Registration XML files, in year then name order.
#[instrument(skip_all, fields(source = source.name(), year = ctx.year))]
pub async fn registration_files(source: &dyn SourceFetcher, ctx: &Context) -> Result<Vec<SourceEntry>> {
    let mut files = Vec::new();
    for year in source.list_directory("/xml").await.or_raise(|| ErrorKind::Discovery)? {
        if !year.is_dir() || !YEAR_DIR_REGEX.is_match(&year.name) || !wants_year(ctx, &year.name) {
            continue;
        }
        for file in source.list_directory(&year.path).await.or_raise(|| ErrorKind::Discovery)? {
            if file.is_dir() || SKIPPED_MARKERS.iter().any(|m| file.name.contains(m)) {
                continue;
            }
            if !changed_since(source, ctx, &file).await? {
                tracing::debug!(path = %file.path, "Unchanged since lookback");
                continue;
            }
            files.push(file);
        }
    }
    tracing::info!(files = files.len(), "Discovered registration files");
    Ok(files)
}

/// Renewal TSV files, in name order.
#[instrument(skip_all, fields(source = source.name(), year = ctx.year))]
pub async fn renewal_files(source: &dyn SourceFetcher, ctx: &Context) -> Result<Vec<SourceEntry>> {
    let mut files = Vec::new();
    for file in source.list_directory("/data").await.or_raise(|| ErrorKind::Discovery)? {
        if file.is_dir() {
            continue;
        }
        let Some(year) = RENEWAL_FILE_REGEX.captures(&file.name).and_then(|c| c.get(1)) else {
            continue;
        };
        if !wants_year(ctx, year.as_str()) {
            continue;
        }
        if !changed_since(source, ctx, &file).await? {
            tracing::debug!(path = %file.path, "Unchanged since lookback");
            continue;
        }
        files.push(file);
    }
    tracing::info!(files = files.len(), "Discovered renewal files");
    Ok(files)
}
