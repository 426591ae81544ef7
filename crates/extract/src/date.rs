//! Catalog dates.
//!
//! Registration dates in the XML carry a machine-readable `date` attribute
//! that is as precise as the printed text: a full day, a month, or only a
//! year. Missing parts default to the first of the month/year. Renewal dates
//! in the TSV files are always full days.

use time::{Date, Month};

fn component(s: &str, min: usize, max: usize) -> Option<u16> {
    if s.len() < min || s.len() > max || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn build(year: &str, month: Option<&str>, day: Option<&str>) -> Option<Date> {
    let year = i32::from(component(year, 4, 4)?);
    let month = match month {
        Some(m) => Month::try_from(u8::try_from(component(m, 1, 2)?).ok()?).ok()?,
        None => Month::January,
    };
    let day = match day {
        Some(d) => u8::try_from(component(d, 1, 2)?).ok()?,
        None => 1,
    };
    Date::from_calendar_date(year, month, day).ok()
}

/// Parse `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
pub fn parse_partial(value: &str) -> Option<Date> {
    let parts = value.trim().split('-').collect::<Vec<_>>();
    match parts.as_slice() {
        [year] => build(year, None, None),
        [year, month] => build(year, Some(month), None),
        [year, month, day] => build(year, Some(month), Some(day)),
        _ => None,
    }
}

/// Parse `YYYY-MM-DD` only.
pub fn parse_strict(value: &str) -> Option<Date> {
    match value.trim().split('-').collect::<Vec<_>>().as_slice() {
        [year, month, day] => build(year, Some(month), Some(day)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: Month, d: u8) -> Option<Date> {
        Date::from_calendar_date(y, m, d).ok()
    }

    #[rstest]
    #[case("1950-03-14", date(1950, Month::March, 14))]
    #[case("1950-3-4", date(1950, Month::March, 4))]
    #[case("1950-03", date(1950, Month::March, 1))]
    #[case("1950", date(1950, Month::January, 1))]
    #[case("1950-02-30", None)]
    #[case("1950-13", None)]
    #[case("50", None)]
    #[case("", None)]
    #[case("1950-03-14-01", None)]
    #[case("circa 1950", None)]
    fn test_parse_partial(#[case] input: &str, #[case] expected: Option<Date>) {
        assert_eq!(parse_partial(input), expected);
    }

    #[rstest]
    #[case("1977-01-03", date(1977, Month::January, 3))]
    #[case("1977-01", None)]
    #[case("1977", None)]
    #[case("03Jan77", None)]
    fn test_parse_strict(#[case] input: &str, #[case] expected: Option<Date>) {
        assert_eq!(parse_strict(input), expected);
    }
}
