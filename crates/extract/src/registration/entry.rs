use crate::date::parse_partial;
use crate::error::EntryError;
use crate::lccn;
use crate::models::{DateValue, ParsedAuthor, ParsedEntry, ParsedPublisher, ParsedRegistration};
use crate::regnum::{category, expand_all};
use roxmltree::Node;

#[derive(Debug, Default)]
struct EntryDates {
    reg: Vec<DateValue>,
    copy: Vec<DateValue>,
    publication: Vec<DateValue>,
    affidavit: Vec<DateValue>,
}
impl EntryDates {
    fn collect(entry: Node<'_, '_>) -> Self {
        let role = |name: &str| -> Vec<DateValue> {
            entry
                .descendants()
                .filter(|n| n.is_element() && n.has_tag_name(name) && n.attribute("ignore") != Some("yes"))
                .map(|n| DateValue::new(n.attribute("date").and_then(parse_partial), n.text().map(str::to_string)))
                .collect()
        };
        let mut dates = Self {
            reg: role("regDate"),
            copy: role("copyDate"),
            publication: role("pubDate"),
            affidavit: role("affDate"),
        };
        if dates.reg.is_empty() {
            if let Some(fallback) = dates.copy.first().or(dates.publication.first()).cloned() {
                dates.reg.push(fallback);
            }
        }
        dates
    }
}

fn first(values: &[DateValue]) -> DateValue {
    values.first().cloned().unwrap_or_default()
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|c| c.is_element() && c.has_tag_name(name))
        .and_then(|c| c.text())
        .map(str::to_string)
}

fn regnum_tokens<'a>(entry: Node<'a, '_>) -> Result<Vec<&'a str>, EntryError> {
    let own = entry.attribute("regnum").ok_or(EntryError::MissingRegnum)?;
    let additional = entry
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("additionalEntry"))
        .filter_map(|n| n.attribute("regnum"));
    Ok(own.split_whitespace().chain(additional.flat_map(str::split_whitespace)).collect())
}

fn pair_dates(numbers: Vec<String>, dates: &[DateValue]) -> Result<Vec<ParsedRegistration>, EntryError> {
    let dates = match (numbers.len() == dates.len(), dates) {
        (true, _) => dates.to_vec(),
        // One date printed for several numbers applies to all of them.
        (false, [only]) if !numbers.is_empty() => vec![only.clone(); numbers.len()],
        (false, _) => {
            return Err(EntryError::DateMismatch {
                regnums: numbers,
                dates: dates.len(),
            });
        },
    };
    Ok(numbers
        .into_iter()
        .zip(dates)
        .map(|(regnum, date)| ParsedRegistration {
            category: category(&regnum),
            regnum,
            date,
        })
        .collect())
}

fn title<'a, 'input>(entry: Node<'a, 'input>, shared: &[Node<'a, 'input>]) -> String {
    entry
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("title"))
        .chain(shared.iter().copied().filter(|n| n.has_tag_name("title")))
        .filter_map(|n| n.text())
        .collect::<Vec<_>>()
        .join("; ")
}

fn authors<'a, 'input>(entry: Node<'a, 'input>, shared: &[Node<'a, 'input>]) -> Vec<ParsedAuthor> {
    let names = entry
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("authorName"))
        .collect::<Vec<_>>();
    let mut found = names
        .iter()
        .filter(|n| n.prev_siblings().any(|s| s.has_tag_name("role")))
        .map(|n| n.text())
        .collect::<Vec<_>>();
    if found.is_empty() {
        found.extend(names.first().map(|n| n.text()));
    }
    found.extend(shared.iter().filter(|n| n.has_tag_name("authorName")).map(|n| n.text()));
    found
        .into_iter()
        .enumerate()
        .filter_map(|(i, name)| {
            name.map(|name| ParsedAuthor {
                name: name.to_string(),
                primary: i == 0,
            })
        })
        .collect()
}

fn publishers(entry: Node<'_, '_>) -> Vec<ParsedPublisher> {
    entry
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("pubName"))
        .filter_map(|n| {
            n.text().map(|name| ParsedPublisher {
                name: name.to_string(),
                claimant: n.attribute("claimant") == Some("yes"),
            })
        })
        .collect()
}

fn lccns(entry: Node<'_, '_>) -> Vec<String> {
    entry
        .children()
        .filter(|n| n.is_element() && n.has_tag_name("lccn"))
        .filter_map(|n| n.text())
        .filter_map(lccn::normalize)
        .collect()
}

/// Parse one `copyrightEntry`, with any fields shared by its group.
pub(crate) fn parse_entry<'a, 'input>(
    uuid: &str,
    entry: Node<'a, 'input>,
    shared: &[Node<'a, 'input>],
) -> Result<ParsedEntry, EntryError> {
    let numbers = expand_all(regnum_tokens(entry)?)?;
    let dates = EntryDates::collect(entry);
    let registrations = pair_dates(numbers, &dates.reg)?;
    Ok(ParsedEntry {
        uuid: uuid.to_string(),
        title: title(entry, shared),
        copies: child_text(entry, "copies"),
        description: child_text(entry, "desc"),
        new_matter: entry.children().any(|c| c.has_tag_name("newMatterClaimed")),
        reg_date: first(&dates.reg),
        copy_date: first(&dates.copy),
        pub_date: first(&dates.publication),
        aff_date: first(&dates.affidavit),
        registrations,
        authors: authors(entry, shared),
        publishers: publishers(entry),
        lccns: lccns(entry),
    })
}
