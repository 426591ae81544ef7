use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// A token only counts as a registration range if it contains a hyphenated pair.
regex!(RANGE_CANDIDATE_REGEX, r"[0-9]+-[A-Z0-9]+");
regex!(RANGE_PREFIX_REGEX, r"^([A-Z]+)");
regex!(DIGITS_REGEX, r"^[0-9]+$");

/// Registration numbers starting with this prefix contain hyphens that are
/// part of the number itself, not a range.
pub(crate) const NON_RANGE_PREFIX: &str = "B5";
/// Ranges spanning this many numbers or more are typos, not ranges.
pub(crate) const MAX_RANGE_SPAN: u64 = 1000;
/// Category given to registration numbers without a letter class.
pub(crate) const UNKNOWN_CATEGORY: &str = "Unknown";
