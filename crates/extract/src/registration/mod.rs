//! Registration XML documents.
//!
//! A document is one file of one year's catalog: a `header` describing the
//! printed volume, followed by `page` markers, `copyrightEntry` elements,
//! `entryGroup` elements bundling entries that share fields, and `crossRef`
//! elements which carry nothing worth importing.

mod element;
mod entry;
mod header;

use self::element::ElementKind;
use self::entry::parse_entry;
use self::header::parse_header;
use crate::error::{ErrorKind, Result};
use crate::models::{Locator, Outcome, ParsedItem, VolumeHeader};
use roxmltree::{Document, Node, ParsingOptions};
use tracing::instrument;

/// Everything parsed out of one registration file.
#[derive(Debug, Clone)]
pub struct RegistrationDocument {
    pub header: VolumeHeader,
    pub items: Vec<ParsedItem>,
}
impl RegistrationDocument {
    pub fn rejected(&self) -> usize {
        self.items.iter().filter(|i| i.rejection().is_some()).count()
    }
}

struct Walker<'x> {
    xml: &'x str,
    locator: Locator,
    items: Vec<ParsedItem>,
}
impl<'x> Walker<'x> {
    fn page(&mut self, page: Node<'_, '_>) {
        self.locator.page = page.attribute("pgnum").map(str::to_string);
        self.locator.position = 0;
    }

    fn entry<'a, 'input>(&mut self, entry: Node<'a, 'input>, shared: &[Node<'a, 'input>]) -> Result<()> {
        let uuid = entry.attribute("id").ok_or_else(|| {
            exn::Exn::from(ErrorKind::MissingAttribute {
                element: "copyrightEntry",
                attribute: "id",
            })
        })?;
        let outcome = match parse_entry(uuid, entry, shared) {
            Ok(parsed) => Outcome::Entry(Box::new(parsed)),
            Err(error) => {
                tracing::warn!(
                    uuid,
                    page = self.locator.page.as_deref(),
                    position = self.locator.position,
                    reason = error.reason(),
                    "Quarantining entry"
                );
                Outcome::Rejected(error)
            },
        };
        self.items.push(ParsedItem {
            uuid: uuid.to_string(),
            locator: self.locator.clone(),
            source: self.xml.get(entry.range()).unwrap_or_default().to_string(),
            outcome,
        });
        Ok(())
    }

    fn group(&mut self, group: Node<'_, '_>) -> Result<()> {
        let mut entries = Vec::new();
        let mut shared = Vec::new();
        for child in group.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "page" => self.page(child),
                "copyrightEntry" => entries.push(child),
                _ => shared.push(child),
            }
        }
        for entry in entries {
            self.entry(entry, &shared)?;
        }
        Ok(())
    }
}

/// Parse a whole registration file.
///
/// Entries that fail to parse are returned as [`Outcome::Rejected`] items;
/// only problems with the file itself are errors.
#[instrument(skip(xml), fields(size = xml.len()))]
pub fn parse_registrations(xml: &str) -> Result<RegistrationDocument> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(xml, options).map_err(|e| ErrorKind::MalformedXml(e.to_string()))?;
    let header = parse_header(&document)?;
    let mut walker = Walker {
        xml,
        locator: Locator::default(),
        items: Vec::new(),
    };
    for child in document.root_element().children().filter(Node::is_element) {
        let kind = ElementKind::from_tag(child.tag_name().name())?;
        walker.locator.position += 1;
        match kind {
            ElementKind::Header | ElementKind::CrossRef => {
                tracing::trace!(tag = child.tag_name().name(), "Skipping element");
            },
            ElementKind::Page => walker.page(child),
            ElementKind::Entry => walker.entry(child, &[])?,
            ElementKind::Group => walker.group(child)?,
        }
    }
    Ok(RegistrationDocument {
        header,
        items: walker.items,
    })
}
