use crate::error::{Error, Result};
use crate::models::{Timestamps, date_from_row};
use time::Date;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claimant {
    pub id: Option<i64>,
    pub name: String,
    pub claimant_type: Option<String>,
}
impl Claimant {
    pub fn new(name: impl Into<String>, claimant_type: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            claimant_type,
        }
    }
}

/// A renewal filing (CCR), identified by the row id of its source file.
///
/// `registrations` holds the ids of the original registrations this renewal
/// was matched to. Saving synchronizes both the links and the claimants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renewal {
    pub id: Option<i64>,
    pub uuid: String,
    pub volume: Option<String>,
    pub part: Option<String>,
    pub number: Option<String>,
    pub page: Option<String>,
    pub author: String,
    pub title: String,
    pub reg_data: String,
    pub renewal_num: String,
    pub renewal_date: Option<Date>,
    pub renewal_date_text: String,
    pub new_matter: String,
    /// Pipe-delimited registration numbers this renewal may also refer to.
    pub see_also_regs: String,
    pub see_also_rens: String,
    pub notes: String,
    pub source: String,
    pub orphan: bool,
    pub claimants: Vec<Claimant>,
    pub registrations: Vec<i64>,
    pub timestamps: Timestamps,
}
impl Renewal {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            id: None,
            uuid: uuid.into(),
            volume: None,
            part: None,
            number: None,
            page: None,
            author: String::new(),
            title: String::new(),
            reg_data: String::new(),
            renewal_num: String::new(),
            renewal_date: None,
            renewal_date_text: String::new(),
            new_matter: String::new(),
            see_also_regs: String::new(),
            see_also_rens: String::new(),
            notes: String::new(),
            source: String::new(),
            orphan: false,
            claimants: Vec::new(),
            registrations: Vec::new(),
            timestamps: Timestamps::now(),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RenewalRow {
    pub(crate) id: i64,
    pub(crate) uuid: String,
    pub(crate) volume: Option<String>,
    pub(crate) part: Option<String>,
    pub(crate) number: Option<String>,
    pub(crate) page: Option<String>,
    pub(crate) author: String,
    pub(crate) title: String,
    pub(crate) reg_data: String,
    pub(crate) renewal_num: String,
    pub(crate) renewal_date: Option<i64>,
    pub(crate) renewal_date_text: String,
    pub(crate) new_matter: String,
    pub(crate) see_also_regs: String,
    pub(crate) see_also_rens: String,
    pub(crate) notes: String,
    pub(crate) source: String,
    pub(crate) orphan: bool,
    pub(crate) date_created: i64,
    pub(crate) date_modified: i64,
}
impl TryFrom<RenewalRow> for Renewal {
    type Error = Error;
    fn try_from(row: RenewalRow) -> Result<Self> {
        Ok(Self {
            id: Some(row.id),
            uuid: row.uuid,
            volume: row.volume,
            part: row.part,
            number: row.number,
            page: row.page,
            author: row.author,
            title: row.title,
            reg_data: row.reg_data,
            renewal_num: row.renewal_num,
            renewal_date: date_from_row(row.renewal_date, "renewal date")?,
            renewal_date_text: row.renewal_date_text,
            new_matter: row.new_matter,
            see_also_regs: row.see_also_regs,
            see_also_rens: row.see_also_rens,
            notes: row.notes,
            source: row.source,
            orphan: row.orphan,
            claimants: Vec::new(),
            registrations: Vec::new(),
            timestamps: Timestamps::from_row(row.date_created, row.date_modified)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ClaimantRow {
    pub(crate) id: i64,
    pub(crate) renewal_id: i64,
    pub(crate) name: String,
    pub(crate) claimant_type: Option<String>,
}
impl From<ClaimantRow> for Claimant {
    fn from(row: ClaimantRow) -> Self {
        Self {
            id: Some(row.id),
            name: row.name,
            claimant_type: row.claimant_type,
        }
    }
}
