//! Reads shared between import sessions and the read-only repository.

use crate::error::{ErrorKind, Result};
use crate::models::{
    AuthorRow, Cce, CceRow, Claimant, ClaimantRow, LccnRow, PublisherRow, Registration, RegistrationRow, Renewal,
    RenewalRow, Volume, VolumeRow, XmlSource, XmlSourceRow,
};
use exn::ResultExt;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection};
use std::collections::HashMap;

pub(crate) async fn volume_by_source(conn: &mut SqliteConnection, source_path: &str) -> Result<Option<Volume>> {
    let row: Option<VolumeRow> = sqlx::query_as(include_str!("../queries/find_volume_by_source.sql"))
        .bind(source_path)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    row.map(Volume::try_from).transpose()
}

pub(crate) async fn cce_registrations(conn: &mut SqliteConnection, cce_id: i64) -> Result<Vec<Registration>> {
    let rows: Vec<RegistrationRow> = sqlx::query_as(include_str!("../queries/list_registrations_for_cce.sql"))
        .bind(cce_id)
        .fetch_all(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    rows.into_iter().map(Registration::try_from).collect()
}

async fn load_cce_children(conn: &mut SqliteConnection, cce: &mut Cce) -> Result<()> {
    let Some(id) = cce.id else {
        return Ok(());
    };
    cce.registrations = cce_registrations(conn, id).await?;
    let authors: Vec<AuthorRow> = sqlx::query_as(include_str!("../queries/list_authors_for_cce.sql"))
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    cce.authors = authors.into_iter().map(Into::into).collect();
    let publishers: Vec<PublisherRow> = sqlx::query_as(include_str!("../queries/list_publishers_for_cce.sql"))
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    cce.publishers = publishers.into_iter().map(Into::into).collect();
    let lccns: Vec<LccnRow> = sqlx::query_as(include_str!("../queries/list_lccns_for_cce.sql"))
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    cce.lccns = lccns.into_iter().map(Into::into).collect();
    let sources: Vec<XmlSourceRow> = sqlx::query_as(include_str!("../queries/list_xml_sources_for_cce.sql"))
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    cce.xml_sources = sources.into_iter().map(XmlSource::try_from).collect::<Result<_>>()?;
    Ok(())
}

pub(crate) async fn renewal_claimants(conn: &mut SqliteConnection, renewal_id: i64) -> Result<Vec<Claimant>> {
    let rows: Vec<ClaimantRow> = sqlx::query_as(include_str!("../queries/list_claimants_for_renewal.sql"))
        .bind(renewal_id)
        .fetch_all(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub(crate) async fn renewal_links(conn: &mut SqliteConnection, renewal_id: i64) -> Result<Vec<i64>> {
    sqlx::query_scalar::<_, i64>(include_str!("../queries/list_links_for_renewal.sql"))
        .bind(renewal_id)
        .fetch_all(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)
}

async fn load_renewal_children(conn: &mut SqliteConnection, renewal: &mut Renewal) -> Result<()> {
    let Some(id) = renewal.id else {
        return Ok(());
    };
    renewal.claimants = renewal_claimants(conn, id).await?;
    renewal.registrations = renewal_links(conn, id).await?;
    Ok(())
}

pub(crate) async fn cce_by_uuid(conn: &mut SqliteConnection, uuid: &str) -> Result<Option<Cce>> {
    let row: Option<CceRow> = sqlx::query_as(include_str!("../queries/find_cce_by_uuid.sql"))
        .bind(uuid)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut cce = Cce::try_from(row)?;
    load_cce_children(conn, &mut cce).await?;
    Ok(Some(cce))
}

/// Entries modified after `since`, children fetched one table at a time.
///
/// Raw source snapshots are left out; nothing downstream of the index reads
/// them and they only ever grow.
pub(crate) async fn cces_modified_since(conn: &mut SqliteConnection, since: i64) -> Result<Vec<Cce>> {
    let rows: Vec<CceRow> = fetch_since(conn, include_str!("../queries/list_cce_modified_since.sql"), since).await?;
    let registrations: Vec<RegistrationRow> =
        fetch_since(conn, include_str!("../queries/list_registrations_modified_since.sql"), since).await?;
    let authors: Vec<AuthorRow> =
        fetch_since(conn, include_str!("../queries/list_authors_modified_since.sql"), since).await?;
    let publishers: Vec<PublisherRow> =
        fetch_since(conn, include_str!("../queries/list_publishers_modified_since.sql"), since).await?;
    let lccns: Vec<LccnRow> = fetch_since(conn, include_str!("../queries/list_lccns_modified_since.sql"), since).await?;

    let mut registrations = by_owner(registrations, |r| r.cce_id);
    let mut authors = by_owner(authors, |a| a.cce_id);
    let mut publishers = by_owner(publishers, |p| p.cce_id);
    let mut lccns = by_owner(lccns, |l| l.cce_id);
    rows.into_iter()
        .map(|row| {
            let id = row.id;
            let mut cce = Cce::try_from(row)?;
            cce.registrations = registrations
                .remove(&id)
                .unwrap_or_default()
                .into_iter()
                .map(Registration::try_from)
                .collect::<Result<_>>()?;
            cce.authors = authors.remove(&id).unwrap_or_default().into_iter().map(Into::into).collect();
            cce.publishers = publishers.remove(&id).unwrap_or_default().into_iter().map(Into::into).collect();
            cce.lccns = lccns.remove(&id).unwrap_or_default().into_iter().map(Into::into).collect();
            Ok(cce)
        })
        .collect()
}

pub(crate) async fn renewal_by_uuid(conn: &mut SqliteConnection, uuid: &str) -> Result<Option<Renewal>> {
    let row: Option<RenewalRow> = sqlx::query_as(include_str!("../queries/find_renewal_by_uuid.sql"))
        .bind(uuid)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut renewal = Renewal::try_from(row)?;
    load_renewal_children(conn, &mut renewal).await?;
    Ok(Some(renewal))
}

pub(crate) async fn renewals_modified_since(conn: &mut SqliteConnection, since: i64) -> Result<Vec<Renewal>> {
    let rows: Vec<RenewalRow> =
        fetch_since(conn, include_str!("../queries/list_renewals_modified_since.sql"), since).await?;
    let claimants: Vec<ClaimantRow> =
        fetch_since(conn, include_str!("../queries/list_claimants_modified_since.sql"), since).await?;
    let links: Vec<(i64, i64)> = fetch_since(conn, include_str!("../queries/list_links_modified_since.sql"), since).await?;

    let mut claimants = by_owner(claimants, |c| c.renewal_id);
    let mut links = by_owner(links, |(renewal_id, _)| *renewal_id);
    rows.into_iter()
        .map(|row| {
            let id = row.id;
            let mut renewal = Renewal::try_from(row)?;
            renewal.claimants = claimants.remove(&id).unwrap_or_default().into_iter().map(Into::into).collect();
            renewal.registrations = links.remove(&id).unwrap_or_default().into_iter().map(|(_, r)| r).collect();
            Ok(renewal)
        })
        .collect()
}

async fn fetch_since<R>(conn: &mut SqliteConnection, query: &'static str, since: i64) -> Result<Vec<R>>
where
    R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    sqlx::query_as(query)
        .bind(since)
        .fetch_all(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)
}

fn by_owner<R>(rows: Vec<R>, owner: impl Fn(&R) -> i64) -> HashMap<i64, Vec<R>> {
    let mut grouped: HashMap<i64, Vec<R>> = HashMap::new();
    for row in rows {
        grouped.entry(owner(&row)).or_default().push(row);
    }
    grouped
}
