//! Renewal (CCR) import.

use crate::error::{ErrorKind, Result};
use crate::stats::ImportStats;
use crate::sync::{extend_trail, reconcile};
use crate::{Context, ImportEvent, discover};
use async_stream::stream;
use cce_extract::models::RenewalRow;
use cce_extract::parse_renewals;
use cce_source::{SourceEntry, SourceFetcher};
use cce_store::models::{Claimant, Renewal};
use cce_store::{Database, Session, saved_id};
use exn::ResultExt;
use futures::Stream;
use tracing::instrument;

/// How a renewal's original registration was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Matched {
    /// The row has no original number and date to look for.
    Skipped,
    Unmatched,
    Linked,
    /// Linked to the first of several candidates; the rest went on the
    /// see-also trail.
    Ambiguous,
}

/// Streams [`ImportEvent`]s while importing every renewal file the context
/// selects.
pub fn import_renewals<'a>(
    source: &'a dyn SourceFetcher,
    db: &'a Database,
    ctx: &'a Context,
) -> impl Stream<Item = Result<ImportEvent>> + 'a {
    stream!({
        yield Ok(ImportEvent::Started);
        let files = match discover::renewal_files(source, ctx).await {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(ImportEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(u64::MAX)));

        let mut total = ImportStats::default();
        for file in &files {
            match import_renewal_file(source, db, file).await {
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
            linked = total.linked,
            ambiguous = total.ambiguous,
            orphaned = total.orphaned,
            "Renewal import complete"
        );
        yield Ok(ImportEvent::Complete(total));
    })
}

/// Import one renewal file inside its own session.
///
/// Rows have no quarantine path: a file missing a required column fails
/// before anything is written.
#[instrument(skip_all, fields(path = %file.path))]
pub async fn import_renewal_file(source: &dyn SourceFetcher, db: &Database, file: &SourceEntry) -> Result<ImportStats> {
    let store = || ErrorKind::Store(file.path.clone());
    let bytes = source.get_blob(&file.revision).await.or_raise(|| ErrorKind::Fetch(file.path.clone()))?;
    let rows = parse_renewals(&bytes).or_raise(|| ErrorKind::Parse(file.path.clone()))?;

    let mut session = db.begin().await.or_raise(store)?;
    match apply_rows(&mut session, rows).await {
        Ok(stats) => {
            session.commit().await.or_raise(store)?;
            tracing::info!(
                inserted = stats.inserted,
                updated = stats.updated,
                linked = stats.linked,
                orphaned = stats.orphaned,
                "Imported renewal file"
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

async fn apply_rows(session: &mut Session, rows: Vec<RenewalRow>) -> cce_store::error::Result<ImportStats> {
    let mut stats = ImportStats {
        files: 1,
        ..Default::default()
    };
    for row in rows {
        let (mut renewal, existing) = match session.find_renewal(&row.entry_id).await? {
            Some(renewal) => (renewal, true),
            None => (Renewal::new(&row.entry_id), false),
        };
        apply_row(&mut renewal, &row, existing);
        let matched = match_registration(session, &mut renewal, &row).await?;
        renewal.orphan = renewal.registrations.is_empty();
        reconcile(
            &mut renewal.claimants,
            row.claimants(),
            |c| c.name.clone(),
            |c| c.name.clone(),
            |c| Claimant::new(c.name, c.claimant_type),
        );
        session.save_renewal(&mut renewal).await?;

        match existing {
            true => stats.updated += 1,
            false => stats.inserted += 1,
        }
        match matched {
            Matched::Linked => stats.linked += 1,
            Matched::Ambiguous => {
                stats.linked += 1;
                stats.ambiguous += 1;
            },
            Matched::Skipped | Matched::Unmatched => {},
        }
        if renewal.orphan {
            stats.orphaned += 1;
        }
        tracing::debug!(uuid = %renewal.uuid, existing, ?matched, "Saved renewal");
    }
    Ok(stats)
}

/// Copy a row onto a renewal. On update, empty see-also cells keep the
/// stored trail.
fn apply_row(renewal: &mut Renewal, row: &RenewalRow, existing: bool) {
    renewal.title = row.title.clone();
    renewal.source = row.source.clone();
    renewal.author = row.author.clone();
    renewal.notes = row.notes.clone();
    renewal.reg_data = row.reg_data();
    renewal.renewal_num = row.renewal_num.clone();
    renewal.new_matter = row.new_matter.clone();
    renewal.renewal_date_text = row.renewal_date_text.clone();
    renewal.renewal_date = row.renewal_date();
    renewal.volume = row.volume.clone();
    renewal.part = row.part.clone();
    renewal.number = row.number.clone();
    renewal.page = row.page.clone();
    if !existing || !row.see_also_reg.is_empty() {
        renewal.see_also_regs = row.see_also_reg.clone();
    }
    if !existing || !row.see_also_ren.is_empty() {
        renewal.see_also_rens = row.see_also_ren.clone();
    }
}

/// Link the renewal to the registration its row names.
///
/// Candidates share number and date; when several exist the first is linked
/// and the others are recorded on the see-also trail. Links already present
/// are kept.
async fn match_registration(
    session: &mut Session,
    renewal: &mut Renewal,
    row: &RenewalRow,
) -> cce_store::error::Result<Matched> {
    if !row.has_original() {
        return Ok(Matched::Skipped);
    }
    let candidates = session.find_registrations(&row.oreg, row.original_date()).await?;
    let Some((first, rest)) = candidates.split_first() else {
        tracing::warn!(uuid = %renewal.uuid, regnum = %row.oreg, date = %row.odat, "Matching registration not found");
        return Ok(Matched::Unmatched);
    };
    let id = saved_id(first.id, "registration")?;
    if !renewal.registrations.contains(&id) {
        renewal.registrations.push(id);
    }
    if rest.is_empty() {
        return Ok(Matched::Linked);
    }
    extend_trail(&mut renewal.see_also_regs, rest.iter().map(|r| r.regnum.as_str()));
    tracing::warn!(uuid = %renewal.uuid, regnum = %row.oreg, candidates = candidates.len(), "Ambiguous registration match");
    Ok(Matched::Ambiguous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cce_extract::models::DateValue;
    use cce_source::backend::MockSource;
    use cce_store::Repository;
    use cce_store::models::{Cce, Registration, Volume};
    use futures::StreamExt;
    use time::{Date, Month, UtcDateTime};

    const HEADER: &str = "entry_id\tvolume\tpart\tnumber\tpage\tauthor\ttitle\toreg\todat\tid\trdat\tclaimants\tnew_matter\tsee_also_ren\tsee_also_reg\tnotes\tsource\n";
    const PATH: &str = "data/1977.tsv";

    fn tsv(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    /// Store registrations under one entry per number.
    async fn seed(db: &Database, registrations: &[(&str, &str, Option<Date>)]) {
        let mut session = db.begin().await.unwrap();
        let mut volume = Volume::new("xml/1950/1950.xml", Default::default());
        session.save_volume(&mut volume).await.unwrap();
        for (uuid, regnum, date) in registrations {
            let mut cce = Cce::new(*uuid, volume.id.unwrap());
            cce.registrations = vec![Registration::new(*regnum, "A", DateValue::new(*date, None))];
            session.save_cce(&mut cce).await.unwrap();
        }
        session.commit().await.unwrap();
    }

    async fn import(source: &MockSource, db: &Database) -> ImportStats {
        let files = discover::renewal_files(source, &Context::default()).await.unwrap();
        import_renewal_file(source, db, &files[0]).await.unwrap()
    }

    fn march_first() -> Option<Date> {
        Date::from_calendar_date(1950, Month::March, 1).ok()
    }

    #[tokio::test]
    async fn test_single_match_links() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db, &[("e1", "A12345", march_first())]).await;
        let source = MockSource::with_files([(
            PATH,
            tsv(&["r1\t31\t1\t\t4\tDOE, JANE\tSome Book\tA12345\t1950-03-01\tR600001\t1977-01-03\tJane Doe|A\t\t\t\t\tfull text"]),
        )]);
        let stats = import(&source, &db).await;
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.linked, 1);
        assert_eq!(stats.orphaned, 0);

        let repo = Repository::from(&db);
        let renewal = repo.get_renewal("r1").await.unwrap().unwrap();
        let cce = repo.get_cce("e1").await.unwrap().unwrap();
        assert_eq!(renewal.registrations, vec![cce.registrations[0].id.unwrap()]);
        assert!(!renewal.orphan);
        assert_eq!(renewal.reg_data, "A12345|1950-03-01");
        assert_eq!(renewal.renewal_num, "R600001");
        assert_eq!(renewal.renewal_date, Date::from_calendar_date(1977, Month::January, 3).ok());
        assert_eq!(renewal.volume.as_deref(), Some("31"));
        assert_eq!(renewal.number, None);
        assert_eq!(renewal.claimants, vec![Claimant {
            id: renewal.claimants[0].id,
            name: "Jane Doe".to_string(),
            claimant_type: Some("A".to_string()),
        }]);
    }

    #[tokio::test]
    async fn test_ambiguous_match_records_trail() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db, &[("e1", "A12345", march_first()), ("e2", "A12345", march_first())]).await;
        let source = MockSource::with_files([(
            PATH,
            tsv(&["r1\t\t\t\t\tDOE\tBook\tA12345\t1950-03-01\tR1\t1977-01-03\t\t\t\tA999\t\t"]),
        )]);
        let stats = import(&source, &db).await;
        assert_eq!(stats.ambiguous, 1);

        let repo = Repository::from(&db);
        let renewal = repo.get_renewal("r1").await.unwrap().unwrap();
        let first = repo.get_cce("e1").await.unwrap().unwrap();
        assert_eq!(renewal.registrations, vec![first.registrations[0].id.unwrap()]);
        assert_eq!(renewal.see_also_regs, "A999|A12345");

        import(&source, &db).await;
        let again = repo.get_renewal("r1").await.unwrap().unwrap();
        assert_eq!(again.registrations, renewal.registrations);
        assert_eq!(again.see_also_regs, "A999|A12345");
    }

    #[tokio::test]
    async fn test_unmatched_is_orphan() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db, &[("e1", "A12345", march_first())]).await;
        let source = MockSource::with_files([(
            PATH,
            tsv(&[
                "r1\t\t\t\t\tDOE\tBook\tA12345\t1950-03-02\tR1\t1977-01-03\t\t\t\t\t\t",
                "r2\t\t\t\t\tDOE\tBook\tA12345\t\tR2\t1977-01-03\t\t\t\t\t\t",
            ]),
        )]);
        let stats = import(&source, &db).await;
        assert_eq!(stats.linked, 0);
        assert_eq!(stats.orphaned, 2);
        let renewal = Repository::from(&db).get_renewal("r1").await.unwrap().unwrap();
        assert!(renewal.orphan);
        assert!(renewal.registrations.is_empty());
    }

    #[tokio::test]
    async fn test_renewal_becomes_orphan_when_entry_drops_its_registration() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db, &[("e1", "A12345", march_first())]).await;
        let source = MockSource::with_files([(
            PATH,
            tsv(&["r1\t\t\t\t\tDOE\tBook\tA12345\t1950-03-01\tR1\t1977-01-03\t\t\t\t\t\t"]),
        )]);
        import(&source, &db).await;
        let repo = Repository::from(&db);
        let linked = repo.get_renewal("r1").await.unwrap().unwrap();
        assert_eq!(linked.registrations.len(), 1);
        assert!(!linked.orphan);

        let mut session = db.begin().await.unwrap();
        let mut cce = session.find_cce("e1").await.unwrap().unwrap();
        cce.registrations = vec![Registration::new("A99999", "A", DateValue::new(march_first(), None))];
        session.save_cce(&mut cce).await.unwrap();
        session.commit().await.unwrap();

        let after = repo.get_renewal("r1").await.unwrap().unwrap();
        assert!(after.registrations.is_empty());
        assert!(after.orphan);
        assert!(after.timestamps.modified >= linked.timestamps.modified);
    }

    #[tokio::test]
    async fn test_unparseable_date_matches_undated_registration() {
        let db = Database::connect_in_memory().await.unwrap();
        seed(&db, &[("e1", "A1", None)]).await;
        let source = MockSource::with_files([(
            PATH,
            tsv(&["r1\t\t\t\t\tDOE\tBook\tA1\t3Jan50\tR1\t1977-01-03\t\t\t\t\t\t"]),
        )]);
        let stats = import(&source, &db).await;
        assert_eq!(stats.linked, 1);
    }

    #[tokio::test]
    async fn test_update_reconciles_claimants_and_keeps_trail() {
        let db = Database::connect_in_memory().await.unwrap();
        let source = MockSource::with_files([(
            PATH,
            tsv(&["r1\t\t\t\t\tDOE\tBook\t\t\tR1\t1977-01-03\tA|ind||B|org\t\t\tA7\tnote\t"]),
        )]);
        import(&source, &db).await;
        let repo = Repository::from(&db);
        let before = repo.get_renewal("r1").await.unwrap().unwrap();

        source
            .put(
                PATH,
                tsv(&["r1\t\t\t\t\tDOE\tBook, revised\t\t\tR1\tsoon\tA|ind||C|org\t\t\t\tnote\t"]),
                UtcDateTime::now(),
            )
            .await;
        let stats = import(&source, &db).await;
        assert_eq!(stats.updated, 1);

        let after = repo.get_renewal("r1").await.unwrap().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.title, "Book, revised");
        assert_eq!(after.renewal_date, None);
        assert_eq!(after.renewal_date_text, "soon");
        assert_eq!(after.see_also_regs, "A7");
        let claimants = after
            .claimants
            .iter()
            .map(|c| (c.name.as_str(), c.claimant_type.as_deref()))
            .collect::<Vec<_>>();
        assert_eq!(claimants, vec![("A", Some("ind")), ("C", Some("org"))]);
        assert_eq!(after.claimants[0].id, before.claimants[0].id);
    }

    #[tokio::test]
    async fn test_missing_column_fails_file() {
        let db = Database::connect_in_memory().await.unwrap();
        let source = MockSource::with_files([(PATH, "entry_id\toreg\nr1\tA1\n")]);
        let files = discover::renewal_files(&source, &Context::default()).await.unwrap();
        let err = import_renewal_file(&source, &db, &files[0]).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Parse(_)));
    }

    #[tokio::test]
    async fn test_stream_imports_every_file() {
        let db = Database::connect_in_memory().await.unwrap();
        let source = MockSource::with_files([
            ("data/1977-A.tsv", tsv(&["r1\t\t\t\t\tDOE\tBook\t\t\tR1\t\t\t\t\t\t\t"])),
            ("data/1977-B.tsv", tsv(&["r2\t\t\t\t\tROE\tBook\t\t\tR2\t\t\t\t\t\t\t"])),
        ]);
        let ctx = Context::default();
        let events = import_renewals(&source, &db, &ctx).collect::<Vec<_>>().await;
        let Some(Ok(ImportEvent::Complete(total))) = events.last() else {
            panic!("stream did not complete");
        };
        assert_eq!(total.files, 2);
        assert_eq!(total.inserted, 2);
    }
}
