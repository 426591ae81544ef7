use crate::error::{ErrorKind, Result};
use crate::models::VolumeHeader;
use roxmltree::{Document, Node};

/// Follow a `/`-separated path of child element names.
pub(crate) fn find_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    path.split('/').try_fold(node, |current, name| {
        current.children().find(|c| c.is_element() && c.has_tag_name(name))
    })
}

pub(crate) fn text_at(node: Node<'_, '_>, path: &str) -> Option<String> {
    find_path(node, path).and_then(|n| n.text()).map(str::to_string)
}

fn attribute_at(node: Node<'_, '_>, path: &str, attribute: &str) -> Option<String> {
    find_path(node, path).and_then(|n| n.attribute(attribute)).map(str::to_string)
}

/// Read the first `header` element anywhere in the document.
pub(crate) fn parse_header(document: &Document<'_>) -> Result<VolumeHeader> {
    let header = document
        .descendants()
        .find(|n| n.has_tag_name("header"))
        .ok_or_else(|| exn::Exn::from(ErrorKind::MissingHeader))?;

    let (start_number, end_number) = match find_path(header, "cite/division/numbers") {
        Some(numbers) => (
            numbers.attribute("start").map(str::to_string),
            numbers.attribute("end").map(str::to_string),
        ),
        None => {
            let number = text_at(header, "cite/division/number");
            (number.clone(), number)
        },
    };

    Ok(VolumeHeader {
        source_url: attribute_at(header, "source", "url"),
        status: text_at(header, "status"),
        series: attribute_at(header, "cite/series", "label"),
        volume: text_at(header, "cite/volume"),
        year: text_at(header, "cite/year"),
        part: text_at(header, "cite/division/part"),
        group: text_at(header, "cite/division/group"),
        material: text_at(header, "cite/division/material"),
        start_number,
        end_number,
    })
}
