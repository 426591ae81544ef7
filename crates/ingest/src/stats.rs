use derive_more::{Add, AddAssign};

/// Counters for one imported file, or summed over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Add, AddAssign)]
pub struct ImportStats {
    pub files: u64,
    pub inserted: u64,
    pub updated: u64,
    /// Registration entries stored as error records instead.
    pub quarantined: u64,
    /// Renewals linked to a stored registration during this import.
    pub linked: u64,
    /// Renewals whose original registration matched more than one row.
    pub ambiguous: u64,
    pub orphaned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum() {
        let mut total = ImportStats::default();
        total += ImportStats {
            files: 1,
            inserted: 3,
            ..Default::default()
        };
        total += ImportStats {
            files: 1,
            updated: 2,
            quarantined: 1,
            ..Default::default()
        };
        assert_eq!(total.files, 2);
        assert_eq!(total.inserted + total.updated, 5);
        assert_eq!(total.quarantined, 1);
    }
}
