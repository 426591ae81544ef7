use crate::error::EntryError;
use crate::models::DateValue;

/// One registration number with its date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRegistration {
    pub regnum: String,
    pub category: String,
    pub date: DateValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedAuthor {
    pub name: String,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedPublisher {
    pub name: String,
    pub claimant: bool,
}

/// A successfully parsed `copyrightEntry`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEntry {
    pub uuid: String,
    pub title: String,
    pub copies: Option<String>,
    pub description: Option<String>,
    pub new_matter: bool,
    pub reg_date: DateValue,
    pub copy_date: DateValue,
    pub pub_date: DateValue,
    pub aff_date: DateValue,
    pub registrations: Vec<ParsedRegistration>,
    pub authors: Vec<ParsedAuthor>,
    pub publishers: Vec<ParsedPublisher>,
    pub lccns: Vec<String>,
}

/// Where an entry sits in the printed volume.
///
/// The page comes from the last `page` marker; the position counts sibling
/// elements since that marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    pub page: Option<String>,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Entry(Box<ParsedEntry>),
    Rejected(EntryError),
}

/// One `copyrightEntry` from a document, parsed or quarantined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub uuid: String,
    pub locator: Locator,
    /// Raw XML of the element, exactly as it appears in the file.
    pub source: String,
    pub outcome: Outcome,
}
impl ParsedItem {
    pub fn entry(&self) -> Option<&ParsedEntry> {
        match &self.outcome {
            Outcome::Entry(entry) => Some(entry.as_ref()),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&EntryError> {
        match &self.outcome {
            Outcome::Entry(_) => None,
            Outcome::Rejected(error) => Some(error),
        }
    }
}
