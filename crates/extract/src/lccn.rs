//! Library of Congress Control Number normalization.
//!
//! Follows the LC normalization rules: drop all blanks, cut everything from
//! the first `/`, and if a hyphen remains, remove it and left-pad the serial
//! part after it with zeros to six digits.

use crate::consts::DIGITS_REGEX;

pub fn normalize(raw: &str) -> Option<String> {
    let compact = raw.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    let compact = match compact.split_once('/') {
        Some((head, _)) => head.to_string(),
        None => compact,
    };
    let normalized = match compact.split_once('-') {
        Some((prefix, serial)) if DIGITS_REGEX.is_match(serial) && serial.len() <= 6 => {
            format!("{prefix}{serial:0>6}")
        },
        _ => compact,
    };
    match normalized.is_empty() {
        true => None,
        false => Some(normalized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("n78-890351", Some("n78890351"))]
    #[case("n78-89035", Some("n78089035"))]
    #[case("n 78890351 ", Some("n78890351"))]
    #[case(" 85000002 ", Some("85000002"))]
    #[case("85-2 ", Some("85000002"))]
    #[case("2001-000002", Some("2001000002"))]
    #[case("75-425165//r75", Some("75425165"))]
    #[case(" 79-139101 /AC/r932", Some("79139101"))]
    #[case("   ", None)]
    fn test_normalize(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize(input).as_deref(), expected);
    }
}
