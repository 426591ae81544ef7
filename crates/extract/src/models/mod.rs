mod entry;
mod renewal;
mod volume;

pub use self::entry::{
    Locator, Outcome, ParsedAuthor, ParsedEntry, ParsedItem, ParsedPublisher, ParsedRegistration,
};
pub use self::renewal::{ParsedClaimant, RenewalRow};
pub use self::volume::VolumeHeader;
use time::Date;

/// A date as it appears in the source: the structured value when it could be
/// parsed, and the literal text printed in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateValue {
    pub parsed: Option<Date>,
    pub text: Option<String>,
}
impl DateValue {
    pub fn new(parsed: Option<Date>, text: Option<String>) -> Self {
        Self { parsed, text }
    }
}
