use crate::error::{ErrorKind, Result};

/// Every element allowed directly under a registration document's root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementKind {
    Header,
    Page,
    Entry,
    Group,
    CrossRef,
}
impl ElementKind {
    pub(crate) fn from_tag(tag: &str) -> Result<Self> {
        Ok(match tag {
            "header" => Self::Header,
            "page" => Self::Page,
            "copyrightEntry" => Self::Entry,
            "entryGroup" => Self::Group,
            "crossRef" => Self::CrossRef,
            other => exn::bail!(ErrorKind::UnknownElement(other.to_string())),
        })
    }
}
