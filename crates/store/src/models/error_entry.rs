use crate::error::{Error, Result};
use crate::models::Timestamps;

/// A quarantined registration entry.
///
/// Written once when an entry fails to parse and never touched again. Not
/// indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCce {
    pub id: Option<i64>,
    pub uuid: String,
    pub regnum: Option<String>,
    pub reason: String,
    pub volume_id: i64,
    pub page: Option<String>,
    pub page_position: i64,
    /// Raw XML of the rejected element.
    pub source: String,
    pub timestamps: Timestamps,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ErrorCceRow {
    pub(crate) id: i64,
    pub(crate) uuid: String,
    pub(crate) regnum: Option<String>,
    pub(crate) reason: String,
    pub(crate) volume_id: i64,
    pub(crate) page: Option<String>,
    pub(crate) page_position: i64,
    pub(crate) source: String,
    pub(crate) date_created: i64,
    pub(crate) date_modified: i64,
}
impl TryFrom<ErrorCceRow> for ErrorCce {
    type Error = Error;
    fn try_from(row: ErrorCceRow) -> Result<Self> {
        Ok(Self {
            id: Some(row.id),
            uuid: row.uuid,
            regnum: row.regnum,
            reason: row.reason,
            volume_id: row.volume_id,
            page: row.page,
            page_position: row.page_position,
            source: row.source,
            timestamps: Timestamps::from_row(row.date_created, row.date_modified)?,
        })
    }
}
