use crate::error::{Error, Result};
use crate::models::{Timestamps, date_from_row, timestamp_from_row};
use cce_extract::models::DateValue;
use time::UtcDateTime;

/// One registration number and date, owned by one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub id: Option<i64>,
    /// Owning entry; `None` until the entry is saved.
    pub cce_id: Option<i64>,
    pub regnum: String,
    pub category: String,
    pub date: DateValue,
}
impl Registration {
    pub fn new(regnum: impl Into<String>, category: impl Into<String>, date: DateValue) -> Self {
        Self {
            id: None,
            cce_id: None,
            regnum: regnum.into(),
            category: category.into(),
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: Option<i64>,
    pub name: String,
    pub primary: bool,
}
impl Author {
    pub fn new(name: impl Into<String>, primary: bool) -> Self {
        Self {
            id: None,
            name: name.into(),
            primary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publisher {
    pub id: Option<i64>,
    pub name: String,
    pub claimant: bool,
}
impl Publisher {
    pub fn new(name: impl Into<String>, claimant: bool) -> Self {
        Self {
            id: None,
            name: name.into(),
            claimant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lccn {
    pub id: Option<i64>,
    pub lccn: String,
}
impl Lccn {
    pub fn new(lccn: impl Into<String>) -> Self {
        Self { id: None, lccn: lccn.into() }
    }
}

/// Snapshot of the raw XML an entry was imported from. Append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlSource {
    pub id: Option<i64>,
    pub xml: String,
    pub created: UtcDateTime,
}
impl XmlSource {
    pub fn new(xml: impl Into<String>) -> Self {
        Self {
            id: None,
            xml: xml.into(),
            created: UtcDateTime::now(),
        }
    }
}

/// A registration entry (CCE), identified by the uuid assigned in the source
/// XML.
///
/// Saving an entry synchronizes its collections: members without an id are
/// inserted, stored members missing from the collection are deleted, and
/// stored registrations are refreshed in place. XML snapshots are only ever
/// added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cce {
    pub id: Option<i64>,
    pub uuid: String,
    pub volume_id: i64,
    pub page: Option<String>,
    pub page_position: i64,
    pub title: String,
    pub copies: Option<String>,
    pub description: Option<String>,
    pub new_matter: bool,
    pub reg_date: DateValue,
    pub copy_date: DateValue,
    pub pub_date: DateValue,
    pub aff_date: DateValue,
    pub registrations: Vec<Registration>,
    pub authors: Vec<Author>,
    pub publishers: Vec<Publisher>,
    pub lccns: Vec<Lccn>,
    pub xml_sources: Vec<XmlSource>,
    pub timestamps: Timestamps,
}
impl Cce {
    pub fn new(uuid: impl Into<String>, volume_id: i64) -> Self {
        Self {
            id: None,
            uuid: uuid.into(),
            volume_id,
            page: None,
            page_position: 0,
            title: String::new(),
            copies: None,
            description: None,
            new_matter: false,
            reg_date: DateValue::default(),
            copy_date: DateValue::default(),
            pub_date: DateValue::default(),
            aff_date: DateValue::default(),
            registrations: Vec::new(),
            authors: Vec::new(),
            publishers: Vec::new(),
            lccns: Vec::new(),
            xml_sources: Vec::new(),
            timestamps: Timestamps::now(),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CceRow {
    pub(crate) id: i64,
    pub(crate) uuid: String,
    pub(crate) volume_id: i64,
    pub(crate) page: Option<String>,
    pub(crate) page_position: i64,
    pub(crate) title: String,
    pub(crate) copies: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) new_matter: bool,
    pub(crate) reg_date: Option<i64>,
    pub(crate) reg_date_text: Option<String>,
    pub(crate) copy_date: Option<i64>,
    pub(crate) copy_date_text: Option<String>,
    pub(crate) pub_date: Option<i64>,
    pub(crate) pub_date_text: Option<String>,
    pub(crate) aff_date: Option<i64>,
    pub(crate) aff_date_text: Option<String>,
    pub(crate) date_created: i64,
    pub(crate) date_modified: i64,
}
impl TryFrom<CceRow> for Cce {
    type Error = Error;
    fn try_from(row: CceRow) -> Result<Self> {
        Ok(Self {
            id: Some(row.id),
            uuid: row.uuid,
            volume_id: row.volume_id,
            page: row.page,
            page_position: row.page_position,
            title: row.title,
            copies: row.copies,
            description: row.description,
            new_matter: row.new_matter,
            reg_date: DateValue::new(date_from_row(row.reg_date, "registration date")?, row.reg_date_text),
            copy_date: DateValue::new(date_from_row(row.copy_date, "copy date")?, row.copy_date_text),
            pub_date: DateValue::new(date_from_row(row.pub_date, "publication date")?, row.pub_date_text),
            aff_date: DateValue::new(date_from_row(row.aff_date, "affidavit date")?, row.aff_date_text),
            registrations: Vec::new(),
            authors: Vec::new(),
            publishers: Vec::new(),
            lccns: Vec::new(),
            xml_sources: Vec::new(),
            timestamps: Timestamps::from_row(row.date_created, row.date_modified)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RegistrationRow {
    pub(crate) id: i64,
    pub(crate) cce_id: i64,
    pub(crate) regnum: String,
    pub(crate) category: String,
    pub(crate) reg_date: Option<i64>,
    pub(crate) reg_date_text: Option<String>,
}
impl TryFrom<RegistrationRow> for Registration {
    type Error = Error;
    fn try_from(row: RegistrationRow) -> Result<Self> {
        Ok(Self {
            id: Some(row.id),
            cce_id: Some(row.cce_id),
            regnum: row.regnum,
            category: row.category,
            date: DateValue::new(date_from_row(row.reg_date, "registration date")?, row.reg_date_text),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AuthorRow {
    pub(crate) id: i64,
    pub(crate) cce_id: i64,
    pub(crate) name: String,
    pub(crate) primary: bool,
}
impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Self {
            id: Some(row.id),
            name: row.name,
            primary: row.primary,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PublisherRow {
    pub(crate) id: i64,
    pub(crate) cce_id: i64,
    pub(crate) name: String,
    pub(crate) claimant: bool,
}
impl From<PublisherRow> for Publisher {
    fn from(row: PublisherRow) -> Self {
        Self {
            id: Some(row.id),
            name: row.name,
            claimant: row.claimant,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct LccnRow {
    pub(crate) id: i64,
    pub(crate) cce_id: i64,
    pub(crate) lccn: String,
}
impl From<LccnRow> for Lccn {
    fn from(row: LccnRow) -> Self {
        Self {
            id: Some(row.id),
            lccn: row.lccn,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct XmlSourceRow {
    pub(crate) id: i64,
    pub(crate) xml: String,
    pub(crate) date_created: i64,
}
impl TryFrom<XmlSourceRow> for XmlSource {
    type Error = Error;
    fn try_from(row: XmlSourceRow) -> Result<Self> {
        Ok(Self {
            id: Some(row.id),
            xml: row.xml,
            created: timestamp_from_row(row.date_created, "date created")?,
        })
    }
}
