//! Transactional import session.
//!
//! One session covers exactly one imported file: everything read and written
//! through it happens inside a single transaction, committed once the whole
//! file went through. Dropping a session without committing rolls it back.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::load;
use crate::models::{
    AuthorRow, Cce, ErrorCce, LccnRow, PublisherRow, Registration, RegistrationRow, Renewal, Volume, date_to_row,
};
use exn::{OptionExt, ResultExt};
use sqlx::{Sqlite, Transaction};
use std::collections::{BTreeSet, HashSet};
use time::Date;
use tracing::instrument;

pub struct Session {
    tx: Transaction<'static, Sqlite>,
}

impl Session {
    pub(crate) async fn begin(db: &Database) -> Result<Self> {
        let tx = db.pool().begin().await.or_raise(|| ErrorKind::Database)?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Volumes
    // =========================================================================

    pub async fn find_volume_by_source(&mut self, source_path: &str) -> Result<Option<Volume>> {
        load::volume_by_source(&mut self.tx, source_path).await
    }

    /// Insert a new volume or refresh a stored one from its header.
    pub async fn save_volume(&mut self, volume: &mut Volume) -> Result<()> {
        let header = &volume.header;
        match volume.id {
            Some(id) => {
                volume.timestamps.touch();
                sqlx::query(include_str!("../queries/update_volume.sql"))
                    .bind(header.source_url.as_deref())
                    .bind(header.status.as_deref())
                    .bind(header.series.as_deref())
                    .bind(header.volume.as_deref())
                    .bind(header.year.as_deref())
                    .bind(header.part.as_deref())
                    .bind(header.group.as_deref())
                    .bind(header.material.as_deref())
                    .bind(header.start_number.as_deref())
                    .bind(header.end_number.as_deref())
                    .bind(header.number())
                    .bind(volume.timestamps.modified.unix_timestamp())
                    .bind(id)
                    .execute(&mut *self.tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
            },
            None => {
                let id: i64 = sqlx::query_scalar(include_str!("../queries/insert_volume.sql"))
                    .bind(&volume.source_path)
                    .bind(header.source_url.as_deref())
                    .bind(header.status.as_deref())
                    .bind(header.series.as_deref())
                    .bind(header.volume.as_deref())
                    .bind(header.year.as_deref())
                    .bind(header.part.as_deref())
                    .bind(header.group.as_deref())
                    .bind(header.material.as_deref())
                    .bind(header.start_number.as_deref())
                    .bind(header.end_number.as_deref())
                    .bind(header.number())
                    .bind(volume.timestamps.created.unix_timestamp())
                    .bind(volume.timestamps.modified.unix_timestamp())
                    .fetch_one(&mut *self.tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                volume.id = Some(id);
            },
        }
        Ok(())
    }

    // =========================================================================
    // Entries
    // =========================================================================

    pub async fn find_cce(&mut self, uuid: &str) -> Result<Option<Cce>> {
        load::cce_by_uuid(&mut self.tx, uuid).await
    }

    /// Insert or update an entry and synchronize all of its collections.
    #[instrument(skip_all, fields(uuid = %cce.uuid))]
    pub async fn save_cce(&mut self, cce: &mut Cce) -> Result<()> {
        let id = match cce.id {
            Some(id) => {
                cce.timestamps.touch();
                sqlx::query(include_str!("../queries/update_cce.sql"))
                    .bind(cce.volume_id)
                    .bind(cce.page.as_deref())
                    .bind(cce.page_position)
                    .bind(&cce.title)
                    .bind(cce.copies.as_deref())
                    .bind(cce.description.as_deref())
                    .bind(cce.new_matter)
                    .bind(date_to_row(cce.reg_date.parsed))
                    .bind(cce.reg_date.text.as_deref())
                    .bind(date_to_row(cce.copy_date.parsed))
                    .bind(cce.copy_date.text.as_deref())
                    .bind(date_to_row(cce.pub_date.parsed))
                    .bind(cce.pub_date.text.as_deref())
                    .bind(date_to_row(cce.aff_date.parsed))
                    .bind(cce.aff_date.text.as_deref())
                    .bind(cce.timestamps.modified.unix_timestamp())
                    .bind(id)
                    .execute(&mut *self.tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                id
            },
            None => sqlx::query_scalar(include_str!("../queries/insert_cce.sql"))
                .bind(&cce.uuid)
                .bind(cce.volume_id)
                .bind(cce.page.as_deref())
                .bind(cce.page_position)
                .bind(&cce.title)
                .bind(cce.copies.as_deref())
                .bind(cce.description.as_deref())
                .bind(cce.new_matter)
                .bind(date_to_row(cce.reg_date.parsed))
                .bind(cce.reg_date.text.as_deref())
                .bind(date_to_row(cce.copy_date.parsed))
                .bind(cce.copy_date.text.as_deref())
                .bind(date_to_row(cce.pub_date.parsed))
                .bind(cce.pub_date.text.as_deref())
                .bind(date_to_row(cce.aff_date.parsed))
                .bind(cce.aff_date.text.as_deref())
                .bind(cce.timestamps.created.unix_timestamp())
                .bind(cce.timestamps.modified.unix_timestamp())
                .fetch_one(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?,
        };
        cce.id = Some(id);
        let modified = cce.timestamps.modified.unix_timestamp();
        self.sync_registrations(id, &mut cce.registrations, modified).await?;
        self.sync_authors(id, cce).await?;
        self.sync_publishers(id, cce).await?;
        self.sync_lccns(id, cce).await?;
        for source in cce.xml_sources.iter_mut().filter(|s| s.id.is_none()) {
            let source_id: i64 = sqlx::query_scalar(include_str!("../queries/insert_xml_source.sql"))
                .bind(id)
                .bind(&source.xml)
                .bind(source.created.unix_timestamp())
                .fetch_one(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            source.id = Some(source_id);
        }
        Ok(())
    }

    /// Delete every stored id that is no longer part of the collection.
    async fn delete_missing(
        &mut self,
        stored: impl IntoIterator<Item = i64>,
        current: impl IntoIterator<Item = Option<i64>>,
        query: &'static str,
    ) -> Result<()> {
        let current = current.into_iter().flatten().collect::<HashSet<_>>();
        for stale in stored.into_iter().filter(|id| !current.contains(id)) {
            sqlx::query(query)
                .bind(stale)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }

    async fn sync_registrations(
        &mut self,
        cce_id: i64,
        registrations: &mut [Registration],
        modified: i64,
    ) -> Result<()> {
        let stored: Vec<RegistrationRow> = sqlx::query_as(include_str!("../queries/list_registrations_for_cce.sql"))
            .bind(cce_id)
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let current = registrations.iter().filter_map(|r| r.id).collect::<HashSet<_>>();
        let mut affected = BTreeSet::new();
        for stale in stored.iter().map(|r| r.id).filter(|id| !current.contains(id)) {
            let renewals: Vec<i64> = sqlx::query_scalar(include_str!("../queries/list_renewals_for_registration.sql"))
                .bind(stale)
                .fetch_all(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            affected.extend(renewals);
            sqlx::query(include_str!("../queries/delete_registration.sql"))
                .bind(stale)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        // Links cascade away with the registration; renewals on the other end
        // re-derive their orphan flag.
        for renewal_id in affected {
            tracing::debug!(renewal_id, "Registration removed from under a linked renewal");
            sqlx::query(include_str!("../queries/refresh_orphan.sql"))
                .bind(modified)
                .bind(renewal_id)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for registration in registrations.iter_mut() {
            match registration.id {
                Some(id) => {
                    sqlx::query(include_str!("../queries/update_registration.sql"))
                        .bind(&registration.regnum)
                        .bind(&registration.category)
                        .bind(date_to_row(registration.date.parsed))
                        .bind(registration.date.text.as_deref())
                        .bind(id)
                        .execute(&mut *self.tx)
                        .await
                        .or_raise(|| ErrorKind::Database)?;
                },
                None => {
                    let id: i64 = sqlx::query_scalar(include_str!("../queries/insert_registration.sql"))
                        .bind(cce_id)
                        .bind(&registration.regnum)
                        .bind(&registration.category)
                        .bind(date_to_row(registration.date.parsed))
                        .bind(registration.date.text.as_deref())
                        .fetch_one(&mut *self.tx)
                        .await
                        .or_raise(|| ErrorKind::Database)?;
                    registration.id = Some(id);
                },
            }
            registration.cce_id = Some(cce_id);
        }
        Ok(())
    }

    async fn sync_authors(&mut self, cce_id: i64, cce: &mut Cce) -> Result<()> {
        let stored: Vec<AuthorRow> = sqlx::query_as(include_str!("../queries/list_authors_for_cce.sql"))
            .bind(cce_id)
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        self.delete_missing(
            stored.iter().map(|r| r.id),
            cce.authors.iter().map(|a| a.id),
            include_str!("../queries/delete_author.sql"),
        )
        .await?;
        for author in cce.authors.iter_mut().filter(|a| a.id.is_none()) {
            let id: i64 = sqlx::query_scalar(include_str!("../queries/insert_author.sql"))
                .bind(cce_id)
                .bind(&author.name)
                .bind(author.primary)
                .fetch_one(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            author.id = Some(id);
        }
        Ok(())
    }

    async fn sync_publishers(&mut self, cce_id: i64, cce: &mut Cce) -> Result<()> {
        let stored: Vec<PublisherRow> = sqlx::query_as(include_str!("../queries/list_publishers_for_cce.sql"))
            .bind(cce_id)
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        self.delete_missing(
            stored.iter().map(|r| r.id),
            cce.publishers.iter().map(|p| p.id),
            include_str!("../queries/delete_publisher.sql"),
        )
        .await?;
        for publisher in cce.publishers.iter_mut().filter(|p| p.id.is_none()) {
            let id: i64 = sqlx::query_scalar(include_str!("../queries/insert_publisher.sql"))
                .bind(cce_id)
                .bind(&publisher.name)
                .bind(publisher.claimant)
                .fetch_one(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            publisher.id = Some(id);
        }
        Ok(())
    }

    async fn sync_lccns(&mut self, cce_id: i64, cce: &mut Cce) -> Result<()> {
        let stored: Vec<LccnRow> = sqlx::query_as(include_str!("../queries/list_lccns_for_cce.sql"))
            .bind(cce_id)
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        self.delete_missing(
            stored.iter().map(|r| r.id),
            cce.lccns.iter().map(|l| l.id),
            include_str!("../queries/delete_lccn.sql"),
        )
        .await?;
        for lccn in cce.lccns.iter_mut().filter(|l| l.id.is_none()) {
            let id: i64 = sqlx::query_scalar(include_str!("../queries/insert_lccn.sql"))
                .bind(cce_id)
                .bind(&lccn.lccn)
                .fetch_one(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            lccn.id = Some(id);
        }
        Ok(())
    }

    /// Quarantine an entry that could not be parsed.
    pub async fn add_error_cce(&mut self, error: &mut ErrorCce) -> Result<()> {
        let id: i64 = sqlx::query_scalar(include_str!("../queries/insert_error_cce.sql"))
            .bind(&error.uuid)
            .bind(error.regnum.as_deref())
            .bind(&error.reason)
            .bind(error.volume_id)
            .bind(error.page.as_deref())
            .bind(error.page_position)
            .bind(&error.source)
            .bind(error.timestamps.created.unix_timestamp())
            .bind(error.timestamps.modified.unix_timestamp())
            .fetch_one(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        error.id = Some(id);
        Ok(())
    }

    /// Stored registrations with exactly this number and date, oldest first.
    ///
    /// A `None` date only matches registrations stored without a date.
    pub async fn find_registrations(&mut self, regnum: &str, date: Option<Date>) -> Result<Vec<Registration>> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(include_str!("../queries/find_registrations.sql"))
            .bind(regnum)
            .bind(date_to_row(date))
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Registration::try_from).collect()
    }

    // =========================================================================
    // Renewals
    // =========================================================================

    pub async fn find_renewal(&mut self, uuid: &str) -> Result<Option<Renewal>> {
        load::renewal_by_uuid(&mut self.tx, uuid).await
    }

    /// Insert or update a renewal, its claimants and its registration links.
    #[instrument(skip_all, fields(uuid = %renewal.uuid))]
    pub async fn save_renewal(&mut self, renewal: &mut Renewal) -> Result<()> {
        let id = match renewal.id {
            Some(id) => {
                renewal.timestamps.touch();
                sqlx::query(include_str!("../queries/update_renewal.sql"))
                    .bind(renewal.volume.as_deref())
                    .bind(renewal.part.as_deref())
                    .bind(renewal.number.as_deref())
                    .bind(renewal.page.as_deref())
                    .bind(&renewal.author)
                    .bind(&renewal.title)
                    .bind(&renewal.reg_data)
                    .bind(&renewal.renewal_num)
                    .bind(date_to_row(renewal.renewal_date))
                    .bind(&renewal.renewal_date_text)
                    .bind(&renewal.new_matter)
                    .bind(&renewal.see_also_regs)
                    .bind(&renewal.see_also_rens)
                    .bind(&renewal.notes)
                    .bind(&renewal.source)
                    .bind(renewal.orphan)
                    .bind(renewal.timestamps.modified.unix_timestamp())
                    .bind(id)
                    .execute(&mut *self.tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                id
            },
            None => sqlx::query_scalar(include_str!("../queries/insert_renewal.sql"))
                .bind(&renewal.uuid)
                .bind(renewal.volume.as_deref())
                .bind(renewal.part.as_deref())
                .bind(renewal.number.as_deref())
                .bind(renewal.page.as_deref())
                .bind(&renewal.author)
                .bind(&renewal.title)
                .bind(&renewal.reg_data)
                .bind(&renewal.renewal_num)
                .bind(date_to_row(renewal.renewal_date))
                .bind(&renewal.renewal_date_text)
                .bind(&renewal.new_matter)
                .bind(&renewal.see_also_regs)
                .bind(&renewal.see_also_rens)
                .bind(&renewal.notes)
                .bind(&renewal.source)
                .bind(renewal.orphan)
                .bind(renewal.timestamps.created.unix_timestamp())
                .bind(renewal.timestamps.modified.unix_timestamp())
                .fetch_one(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?,
        };
        renewal.id = Some(id);

        let stored = load::renewal_claimants(&mut self.tx, id).await?;
        self.delete_missing(
            stored.iter().filter_map(|c| c.id),
            renewal.claimants.iter().map(|c| c.id),
            include_str!("../queries/delete_claimant.sql"),
        )
        .await?;
        for claimant in renewal.claimants.iter_mut().filter(|c| c.id.is_none()) {
            let claimant_id: i64 = sqlx::query_scalar(include_str!("../queries/insert_claimant.sql"))
                .bind(id)
                .bind(&claimant.name)
                .bind(claimant.claimant_type.as_deref())
                .fetch_one(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            claimant.id = Some(claimant_id);
        }

        let linked = load::renewal_links(&mut self.tx, id).await?;
        let current = renewal.registrations.iter().copied().collect::<HashSet<_>>();
        for stale in linked.into_iter().filter(|r| !current.contains(r)) {
            sqlx::query(include_str!("../queries/delete_link.sql"))
                .bind(id)
                .bind(stale)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for registration_id in &renewal.registrations {
            sqlx::query(include_str!("../queries/insert_link.sql"))
                .bind(id)
                .bind(*registration_id)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }
}

/// Require that a parent entity was saved before its children reference it.
pub fn saved_id(id: Option<i64>, entity: &'static str) -> Result<i64> {
    id.ok_or_raise(|| ErrorKind::Unsaved(entity))
}
