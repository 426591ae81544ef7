mod entry;
mod error_entry;
mod renewal;
mod volume;

pub use self::entry::{Author, Cce, Lccn, Publisher, Registration, XmlSource};
pub(crate) use self::entry::{AuthorRow, CceRow, LccnRow, PublisherRow, RegistrationRow, XmlSourceRow};
pub use self::error_entry::ErrorCce;
pub(crate) use self::error_entry::ErrorCceRow;
pub use self::renewal::{Claimant, Renewal};
pub(crate) use self::renewal::{ClaimantRow, RenewalRow};
pub use self::volume::Volume;
pub(crate) use self::volume::VolumeRow;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::{Date, UtcDateTime};

/// Creation and last modification time, shared by every top-level entity.
///
/// The search indexer picks up whatever was modified after its checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub created: UtcDateTime,
    pub modified: UtcDateTime,
}
impl Timestamps {
    pub fn now() -> Self {
        let now = UtcDateTime::now();
        Self {
            created: now,
            modified: now,
        }
    }

    pub fn touch(&mut self) {
        self.modified = UtcDateTime::now();
    }

    pub(crate) fn from_row(created: i64, modified: i64) -> Result<Self> {
        Ok(Self {
            created: timestamp_from_row(created, "date created")?,
            modified: timestamp_from_row(modified, "date modified")?,
        })
    }
}
impl Default for Timestamps {
    fn default() -> Self {
        Self::now()
    }
}

pub(crate) fn timestamp_from_row(value: i64, field: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(value).or_raise(|| ErrorKind::InvalidData(field))
}

pub(crate) fn date_to_row(date: Option<Date>) -> Option<i64> {
    date.map(|d| d.midnight().as_utc().unix_timestamp())
}

pub(crate) fn date_from_row(value: Option<i64>, field: &'static str) -> Result<Option<Date>> {
    value
        .map(|v| timestamp_from_row(v, field).map(|t| t.date()))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::Month;

    #[rstest]
    #[case(1923, Month::December, 31)]
    #[case(1970, Month::January, 1)]
    #[case(1899, Month::February, 28)]
    fn test_date_round_trip(#[case] year: i32, #[case] month: Month, #[case] day: u8) {
        let date = Date::from_calendar_date(year, month, day).unwrap();
        let stored = date_to_row(Some(date));
        assert_eq!(date_from_row(stored, "date").unwrap(), Some(date));
    }

    #[test]
    fn test_missing_date_stays_missing() {
        assert_eq!(date_to_row(None), None);
        assert_eq!(date_from_row(None, "date").unwrap(), None);
    }

    #[test]
    fn test_touch_only_moves_modified() {
        let mut timestamps = Timestamps {
            created: UtcDateTime::UNIX_EPOCH,
            modified: UtcDateTime::UNIX_EPOCH,
        };
        timestamps.touch();
        assert_eq!(timestamps.created, UtcDateTime::UNIX_EPOCH);
        assert!(timestamps.modified > UtcDateTime::UNIX_EPOCH);
    }
}
