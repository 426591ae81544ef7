use crate::error::{Error, Result};
use crate::models::Timestamps;
use cce_extract::models::VolumeHeader;

/// The header of one registration file.
///
/// Identified by the file's path in the source repository, so re-importing a
/// file refreshes its volume instead of adding another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: Option<i64>,
    pub source_path: String,
    pub header: VolumeHeader,
    pub timestamps: Timestamps,
}
impl Volume {
    pub fn new(source_path: impl Into<String>, header: VolumeHeader) -> Self {
        Self {
            id: None,
            source_path: source_path.into(),
            header,
            timestamps: Timestamps::now(),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct VolumeRow {
    pub(crate) id: i64,
    pub(crate) source_path: String,
    pub(crate) source_url: Option<String>,
    pub(crate) status: Option<String>,
    pub(crate) series: Option<String>,
    pub(crate) volume: Option<String>,
    pub(crate) year: Option<String>,
    pub(crate) part: Option<String>,
    pub(crate) group: Option<String>,
    pub(crate) material: Option<String>,
    pub(crate) start_number: Option<String>,
    pub(crate) end_number: Option<String>,
    pub(crate) date_created: i64,
    pub(crate) date_modified: i64,
}
impl TryFrom<VolumeRow> for Volume {
    type Error = Error;
    fn try_from(row: VolumeRow) -> Result<Self> {
        Ok(Self {
            id: Some(row.id),
            source_path: row.source_path,
            header: VolumeHeader {
                source_url: row.source_url,
                status: row.status,
                series: row.series,
                volume: row.volume,
                year: row.year,
                part: row.part,
                group: row.group,
                material: row.material,
                start_number: row.start_number,
                end_number: row.end_number,
            },
            timestamps: Timestamps::from_row(row.date_created, row.date_modified)?,
        })
    }
}
