/// Header metadata of one registration file, shared by every entry in it.
///
/// Every field is kept as the text printed in the header; volume and group
/// numbers are not always numeric in the scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeHeader {
    pub source_url: Option<String>,
    pub status: Option<String>,
    pub series: Option<String>,
    pub volume: Option<String>,
    pub year: Option<String>,
    pub part: Option<String>,
    pub group: Option<String>,
    pub material: Option<String>,
    pub start_number: Option<String>,
    pub end_number: Option<String>,
}
impl VolumeHeader {
    /// The issue number of a volume in the third material class.
    ///
    /// Those volumes are split into numbered issues rather than parts, so the
    /// header's number range identifies the file. A single-issue range
    /// collapses to one literal.
    pub fn number(&self) -> Option<String> {
        if !self.material.as_deref().is_some_and(|m| m.contains('3')) {
            return None;
        }
        match (self.start_number.as_deref(), self.end_number.as_deref()) {
            (Some(start), Some(end)) if start == end => Some(start.to_string()),
            (Some(start), Some(end)) => Some(format!("{start}-{end}")),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("Part 3"), Some("1"), Some("1"), Some("1"))]
    #[case(Some("Part 3"), Some("1"), Some("4"), Some("1-4"))]
    #[case(Some("Part 1"), Some("1"), Some("4"), None)]
    #[case(None, Some("1"), Some("4"), None)]
    #[case(Some("3"), None, None, None)]
    fn test_number(
        #[case] material: Option<&str>,
        #[case] start: Option<&str>,
        #[case] end: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let header = VolumeHeader {
            material: material.map(str::to_string),
            start_number: start.map(str::to_string),
            end_number: end.map(str::to_string),
            ..Default::default()
        };
        assert_eq!(header.number().as_deref(), expected);
    }
}
