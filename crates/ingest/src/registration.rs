//! Registration (CCE) import.

use crate::error::{ErrorKind, Result};
use crate::stats::ImportStats;
use crate::sync::reconcile;
use crate::{Context, ImportEvent, discover};
use async_stream::stream;
use cce_extract::models::{Locator, Outcome, ParsedEntry};
use cce_extract::{RegistrationDocument, parse_registrations};
use cce_source::{SourceEntry, SourceFetcher};
use cce_store::models::{Author, Cce, ErrorCce, Lccn, Publisher, Registration, Timestamps, Volume, XmlSource};
use cce_store::{Database, Session, saved_id};
use exn::ResultExt;
use futures::Stream;
use std::collections::HashSet;
use tracing::instrument;

/// Streams [`ImportEvent`]s while importing every registration file the
/// context selects.
pub fn import_registrations<'a>(
    source: &'a dyn SourceFetcher,
    db: &'a Database,
    ctx: &'a Context,
) -> impl Stream<Item = Result<ImportEvent>> + 'a {
    stream!({
        yield Ok(ImportEvent::Started);
        let files = match discover::registration_files(source, ctx).await {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(ImportEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(u64::MAX)));

        let mut total = ImportStats::default();
        for file in &files {
            match import_registration_file(source, db, file).await {
                Ok(stats) => {
                    total += stats;
                    yield Ok(ImportEvent::Imported { path: file.path.clone(), stats });
                },
                Err(e) => {
                    yield Err(e);
                    return;
                },
            }
        }
        tracing::info!(
            files = total.files,
            inserted = total.inserted,
            updated = total.updated,
            quarantined = total.quarantined,
            "Registration import complete"
        );
        yield Ok(ImportEvent::Complete(total));
    })
}

/// Import one registration file inside its own session.
///
/// Nothing from the file is kept unless every entry was either stored or
/// quarantined.
#[instrument(skip_all, fields(path = %file.path))]
pub async fn import_registration_file(
    source: &dyn SourceFetcher,
    db: &Database,
    file: &SourceEntry,
) -> Result<ImportStats> {
    let store = || ErrorKind::Store(file.path.clone());
    let bytes = source.get_blob(&file.revision).await.or_raise(|| ErrorKind::Fetch(file.path.clone()))?;
    let xml = String::from_utf8(bytes).or_raise(|| ErrorKind::Encoding(file.path.clone()))?;
    let document = parse_registrations(&xml).or_raise(|| ErrorKind::Parse(file.path.clone()))?;

    let mut session = db.begin().await.or_raise(store)?;
    match apply_document(&mut session, &file.path, document).await {
        Ok(stats) => {
            session.commit().await.or_raise(store)?;
            tracing::info!(
                inserted = stats.inserted,
                updated = stats.updated,
                quarantined = stats.quarantined,
                "Imported registration file"
            );
            Ok(stats)
        },
        Err(e) => {
            if let Err(rollback) = session.rollback().await {
                tracing::warn!(error = ?rollback, "Rollback failed");
            }
            Err(e).or_raise(store)
        },
    }
}

async fn apply_document(
    session: &mut Session,
    path: &str,
    document: RegistrationDocument,
) -> cce_store::error::Result<ImportStats> {
    tracing::debug!(entries = document.items.len(), rejected = document.rejected(), "Parsed registration file");
    let mut stats = ImportStats {
        files: 1,
        ..Default::default()
    };
    let mut volume = match session.find_volume_by_source(path).await? {
        Some(mut volume) => {
            volume.header = document.header;
            volume
        },
        None => Volume::new(path, document.header),
    };
    session.save_volume(&mut volume).await?;
    let volume_id = saved_id(volume.id, "volume")?;

    for item in document.items {
        match item.outcome {
            Outcome::Entry(entry) => match session.find_cce(&entry.uuid).await? {
                Some(mut cce) => {
                    update_cce(&mut cce, &entry, &item.locator, item.source);
                    session.save_cce(&mut cce).await?;
                    tracing::debug!(uuid = %cce.uuid, "Updated entry");
                    stats.updated += 1;
                },
                None => {
                    let mut cce = create_cce(volume_id, &entry, &item.locator, item.source);
                    session.save_cce(&mut cce).await?;
                    tracing::debug!(uuid = %cce.uuid, "Inserted entry");
                    stats.inserted += 1;
                },
            },
            Outcome::Rejected(error) => {
                let mut record = ErrorCce {
                    id: None,
                    uuid: item.uuid,
                    regnum: error.regnum(),
                    reason: error.reason().to_string(),
                    volume_id,
                    page: item.locator.page,
                    page_position: i64::from(item.locator.position),
                    source: item.source,
                    timestamps: Timestamps::now(),
                };
                session.add_error_cce(&mut record).await?;
                stats.quarantined += 1;
            },
        }
    }
    Ok(stats)
}

fn apply_scalars(cce: &mut Cce, entry: &ParsedEntry, locator: &Locator) {
    cce.page = locator.page.clone();
    cce.page_position = i64::from(locator.position);
    cce.title = entry.title.clone();
    cce.copies = entry.copies.clone();
    cce.description = entry.description.clone();
    cce.new_matter = entry.new_matter;
    cce.reg_date = entry.reg_date.clone();
    cce.copy_date = entry.copy_date.clone();
    cce.pub_date = entry.pub_date.clone();
    cce.aff_date = entry.aff_date.clone();
}

fn create_cce(volume_id: i64, entry: &ParsedEntry, locator: &Locator, source: String) -> Cce {
    let mut cce = Cce::new(&entry.uuid, volume_id);
    apply_scalars(&mut cce, entry, locator);
    cce.registrations = entry
        .registrations
        .iter()
        .map(|r| Registration::new(&r.regnum, &r.category, r.date.clone()))
        .collect();
    cce.authors = entry.authors.iter().map(|a| Author::new(&a.name, a.primary)).collect();
    cce.publishers = entry.publishers.iter().map(|p| Publisher::new(&p.name, p.claimant)).collect();
    cce.lccns = entry.lccns.iter().map(Lccn::new).collect();
    cce.xml_sources = vec![XmlSource::new(source)];
    cce
}

/// Overwrite an existing entry's fields and diff its collections in place.
///
/// Registrations are matched by number and refreshed from the incoming
/// values; the raw source snapshot is appended, never replaced. The entry
/// keeps the volume it was first imported with.
fn update_cce(cce: &mut Cce, entry: &ParsedEntry, locator: &Locator, source: String) {
    apply_scalars(cce, entry, locator);
    reconcile(
        &mut cce.lccns,
        entry.lccns.clone(),
        |l| l.lccn.clone(),
        |l| l.clone(),
        Lccn::new,
    );
    reconcile(
        &mut cce.authors,
        entry.authors.clone(),
        |a| (a.name.clone(), a.primary),
        |a| (a.name.clone(), a.primary),
        |a| Author::new(a.name, a.primary),
    );
    reconcile(
        &mut cce.publishers,
        entry.publishers.clone(),
        |p| (p.name.clone(), p.claimant),
        |p| (p.name.clone(), p.claimant),
        |p| Publisher::new(p.name, p.claimant),
    );

    cce.registrations.retain(|r| entry.registrations.iter().any(|p| p.regnum == r.regnum));
    for registration in &mut cce.registrations {
        if let Some(parsed) = entry.registrations.iter().find(|p| p.regnum == registration.regnum) {
            registration.category = parsed.category.clone();
            registration.date = parsed.date.clone();
        }
    }
    let kept = cce.registrations.iter().map(|r| r.regnum.clone()).collect::<HashSet<_>>();
    cce.registrations.extend(
        entry
            .registrations
            .iter()
            .filter(|p| !kept.contains(&p.regnum))
            .map(|p| Registration::new(&p.regnum, &p.category, p.date.clone())),
    );

    cce.xml_sources.push(XmlSource::new(source));
}
