//! Registration number tokens.
//!
//! A `regnum` attribute holds whitespace-separated numbers such as
//! `A123456 AF7890`. Some tokens abbreviate a run of consecutive numbers as a
//! range (`A100-A105`, or `A100-105`), which expands end-exclusive under the
//! left side's letter prefix.

use crate::consts::{MAX_RANGE_SPAN, NON_RANGE_PREFIX, RANGE_CANDIDATE_REGEX, RANGE_PREFIX_REGEX, UNKNOWN_CATEGORY};
use crate::error::EntryError;
use std::num::IntErrorKind;

fn is_range_candidate(token: &str) -> bool {
    RANGE_CANDIDATE_REGEX.is_match(token)
        // A zero in third place means the hyphen belongs to the number.
        && token.chars().nth(2) != Some('0')
        && !token.starts_with(NON_RANGE_PREFIX)
}

/// Expand one token into the registration numbers it stands for.
///
/// Anything that isn't a range comes back unchanged, as does a range so wide
/// it can only be a typo.
pub fn expand(token: &str) -> Result<Vec<String>, EntryError> {
    if !is_range_candidate(token) {
        return Ok(vec![token.to_string()]);
    }
    expand_range(token)
}

/// Expand a `<prefix><start>-[<prefix>]<end>` range without first checking
/// whether the token should be treated as one.
pub fn expand_range(token: &str) -> Result<Vec<String>, EntryError> {
    let error = || EntryError::RangeParsing { token: token.to_string() };
    let mut sides = token.split('-');
    let (Some(left), Some(right)) = (sides.next(), sides.next()) else {
        return Err(error());
    };
    let prefix = RANGE_PREFIX_REGEX.find(left).map(|m| m.as_str()).ok_or_else(error)?;
    // Digits too long for any counter are kept as printed, like wide spans.
    let number = |digits: &str| match digits.parse::<u64>() {
        Ok(n) => Ok(Some(n)),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(None),
        Err(_) => Err(error()),
    };
    let start = number(&left[prefix.len()..])?;
    let end = number(right.strip_prefix(prefix).unwrap_or(right))?;
    match (start, end) {
        (Some(start), Some(end)) if end.saturating_sub(start) < MAX_RANGE_SPAN => {
            Ok((start..end).map(|n| format!("{prefix}{n}")).collect())
        },
        _ => Ok(vec![token.to_string()]),
    }
}

/// Expand every token of an entry, in order.
pub fn expand_all<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>, EntryError> {
    let mut numbers = Vec::new();
    for token in tokens {
        numbers.extend(expand(token)?);
    }
    Ok(numbers)
}

/// Registration class, the leading letter of the number.
pub fn category(regnum: &str) -> String {
    match regnum.chars().next() {
        Some(c) if c.is_ascii_uppercase() => c.to_string(),
        _ => UNKNOWN_CATEGORY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_range_expands_end_exclusive() {
        assert_eq!(expand_range("A100-A105").unwrap(), vec!["A100", "A101", "A102", "A103", "A104"]);
        assert_eq!(expand("A120-A123").unwrap(), vec!["A120", "A121", "A122"]);
    }

    #[test]
    fn test_zero_in_third_place_is_not_a_range() {
        assert_eq!(expand("A100-A105").unwrap(), vec!["A100-A105"]);
    }

    #[rstest]
    #[case("A120-125", 5)]
    #[case("AF2000-AF2999", 999)]
    #[case("A5-A5", 0)]
    #[case("A9-A5", 0)]
    fn test_count_is_span(#[case] token: &str, #[case] count: usize) {
        assert_eq!(expand(token).unwrap().len(), count);
    }

    #[rstest]
    #[case("A120-A1120")]
    #[case("A1-A999999")]
    #[case("A12-A99999999999999999999")]
    #[case("A99999999999999999999-A12")]
    fn test_wide_range_is_literal(#[case] token: &str) {
        assert_eq!(expand(token).unwrap(), vec![token.to_string()]);
    }

    #[rstest]
    #[case("A123456")]
    #[case("B5-12345")]
    #[case("AA0-1234")]
    #[case("A-B")]
    fn test_not_a_range(#[case] token: &str) {
        assert_eq!(expand(token).unwrap(), vec![token.to_string()]);
    }

    #[rstest]
    #[case("123-200")]
    #[case("A120-B200")]
    #[case("A120-A2X0")]
    fn test_unparseable_range(#[case] token: &str) {
        assert_eq!(expand(token), Err(EntryError::RangeParsing { token: token.to_string() }));
    }

    #[test]
    fn test_expand_all_keeps_order() {
        let numbers = expand_all(["AF1", "A21-A23", "B5-1"]).unwrap();
        assert_eq!(numbers, vec!["AF1", "A21", "A22", "B5-1"]);
    }

    #[rstest]
    #[case("A12345", "A")]
    #[case("AF12345", "A")]
    #[case("12345", "Unknown")]
    #[case("", "Unknown")]
    fn test_category(#[case] regnum: &str, #[case] expected: &str) {
        assert_eq!(category(regnum), expected);
    }
}
