use crate::date::parse_strict;
use time::Date;

/// One claimant decoded from a renewal's `claimants` cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClaimant {
    pub name: String,
    pub claimant_type: Option<String>,
}

/// One row of a renewal file with every column already resolved to its
/// preferred or legacy name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenewalRow {
    pub entry_id: String,
    pub oreg: String,
    pub odat: String,
    pub renewal_num: String,
    pub title: String,
    pub renewal_date_text: String,
    pub source: String,
    pub author: String,
    pub notes: String,
    pub new_matter: String,
    pub see_also_reg: String,
    pub see_also_ren: String,
    pub volume: Option<String>,
    pub part: Option<String>,
    pub number: Option<String>,
    pub page: Option<String>,
    pub claimants: String,
}
impl RenewalRow {
    pub fn renewal_date(&self) -> Option<Date> {
        parse_strict(&self.renewal_date_text)
    }

    /// The original registration date, used to find the registration.
    pub fn original_date(&self) -> Option<Date> {
        parse_strict(&self.odat)
    }

    /// Original registration number and date as printed, `oreg|odat`.
    pub fn reg_data(&self) -> String {
        format!("{}|{}", self.oreg, self.odat)
    }

    /// Whether the row names an original registration worth looking up.
    pub fn has_original(&self) -> bool {
        !self.oreg.trim().is_empty() && !self.odat.trim().is_empty()
    }

    pub fn claimants(&self) -> Vec<ParsedClaimant> {
        crate::claimant::parse(&self.claimants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn test_row_helpers() {
        let row = RenewalRow {
            oreg: "A12345".to_string(),
            odat: "1950-03-01".to_string(),
            renewal_date_text: "1977-13-01".to_string(),
            ..Default::default()
        };
        assert_eq!(row.reg_data(), "A12345|1950-03-01");
        assert!(row.has_original());
        assert_eq!(row.original_date(), Date::from_calendar_date(1950, Month::March, 1).ok());
        assert_eq!(row.renewal_date(), None);
    }

    #[test]
    fn test_blank_original() {
        let row = RenewalRow {
            oreg: " ".to_string(),
            odat: "1950-03-01".to_string(),
            ..Default::default()
        };
        assert!(!row.has_original());
        assert_eq!(row.reg_data(), " |1950-03-01");
    }
}
