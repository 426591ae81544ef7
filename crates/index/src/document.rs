//! Index documents built from stored records.

use crate::Document;
use crate::error::{ErrorKind, Result};
use cce_store::models::{Cce, Renewal, Timestamps};
use exn::ResultExt;
use serde::Serialize;
use time::{Date, UtcDateTime};
use time::format_description::well_known::Rfc3339;

#[derive(Serialize)]
struct RegistrationBody<'a> {
    regnum: &'a str,
    regdate: Option<String>,
}

#[derive(Serialize)]
struct CceBody<'a> {
    uuid: &'a str,
    title: &'a str,
    authors: Vec<&'a str>,
    publishers: Vec<&'a str>,
    lccns: Vec<&'a str>,
    registrations: Vec<RegistrationBody<'a>>,
    date_created: String,
    date_modified: String,
}

#[derive(Serialize)]
struct ClaimantBody<'a> {
    name: &'a str,
    claim_type: Option<&'a str>,
}

#[derive(Serialize)]
struct RenewalBody<'a> {
    uuid: &'a str,
    rennum: &'a str,
    rendate: Option<String>,
    title: &'a str,
    authors: &'a str,
    claimants: Vec<ClaimantBody<'a>>,
    date_created: String,
    date_modified: String,
}

/// `YYYY-MM-DD`, which the index reads as a date.
fn day(date: Option<Date>) -> Option<String> {
    date.map(|d| d.to_string())
}

fn stamps(uuid: &str, timestamps: &Timestamps) -> Result<(String, String)> {
    let render = |t: UtcDateTime| t.format(&Rfc3339).or_raise(|| ErrorKind::Serialize(uuid.to_string()));
    Ok((render(timestamps.created)?, render(timestamps.modified)?))
}

/// Registration document, addressed by the entry's uuid.
pub fn cce_document(cce: &Cce) -> Result<Document> {
    let (date_created, date_modified) = stamps(&cce.uuid, &cce.timestamps)?;
    let body = CceBody {
        uuid: &cce.uuid,
        title: &cce.title,
        authors: cce.authors.iter().map(|a| a.name.as_str()).collect(),
        publishers: cce.publishers.iter().map(|p| p.name.as_str()).collect(),
        lccns: cce.lccns.iter().map(|l| l.lccn.as_str()).collect(),
        registrations: cce
            .registrations
            .iter()
            .map(|r| RegistrationBody {
                regnum: &r.regnum,
                regdate: day(r.date.parsed),
            })
            .collect(),
        date_created,
        date_modified,
    };
    let body = serde_json::to_value(body).or_raise(|| ErrorKind::Serialize(cce.uuid.clone()))?;
    Ok(Document {
        id: cce.uuid.clone(),
        body,
    })
}

/// Renewal document, addressed by the renewal number.
///
/// Rows without a renewal number are incomplete and produce no document.
pub fn renewal_document(renewal: &Renewal) -> Result<Option<Document>> {
    if renewal.renewal_num.is_empty() {
        return Ok(None);
    }
    let (date_created, date_modified) = stamps(&renewal.uuid, &renewal.timestamps)?;
    let body = RenewalBody {
        uuid: &renewal.uuid,
        rennum: &renewal.renewal_num,
        rendate: day(renewal.renewal_date),
        title: &renewal.title,
        authors: &renewal.author,
        claimants: renewal
            .claimants
            .iter()
            .map(|c| ClaimantBody {
                name: &c.name,
                claim_type: c.claimant_type.as_deref(),
            })
            .collect(),
        date_created,
        date_modified,
    };
    let body = serde_json::to_value(body).or_raise(|| ErrorKind::Serialize(renewal.uuid.clone()))?;
    Ok(Some(Document {
        id: renewal.renewal_num.clone(),
        body,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cce_extract::models::DateValue;
    use cce_store::models::{Author, Claimant, Lccn, Publisher, Registration};
    use time::Month;

    fn timestamps() -> Timestamps {
        Timestamps {
            created: UtcDateTime::UNIX_EPOCH,
            modified: UtcDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_cce_document() {
        let mut cce = Cce::new("e1", 1);
        cce.title = "The Book".to_string();
        cce.timestamps = timestamps();
        cce.authors = vec![Author::new("SMITH, JOHN", true), Author::new("DOE, JANE", false)];
        cce.publishers = vec![Publisher::new("Acme", true)];
        cce.lccns = vec![Lccn::new("50001234")];
        cce.registrations = vec![
            Registration::new(
                "A1",
                "A",
                DateValue::new(Date::from_calendar_date(1950, Month::January, 5).ok(), Some("5Jan50".to_string())),
            ),
            Registration::new("A2", "A", DateValue::default()),
        ];
        let document = cce_document(&cce).unwrap();
        assert_eq!(document.id, "e1");
        assert_eq!(
            document.body,
            serde_json::json!({
                "uuid": "e1",
                "title": "The Book",
                "authors": ["SMITH, JOHN", "DOE, JANE"],
                "publishers": ["Acme"],
                "lccns": ["50001234"],
                "registrations": [
                    {"regnum": "A1", "regdate": "1950-01-05"},
                    {"regnum": "A2", "regdate": null}
                ],
                "date_created": "1970-01-01T00:00:00Z",
                "date_modified": "1970-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn test_renewal_document() {
        let mut renewal = Renewal::new("r1");
        renewal.renewal_num = "R600001".to_string();
        renewal.renewal_date = Date::from_calendar_date(1977, Month::January, 3).ok();
        renewal.author = "DOE, JANE".to_string();
        renewal.timestamps = timestamps();
        renewal.claimants = vec![Claimant::new("Jane Doe", Some("A".to_string())), Claimant::new("Acme", None)];
        let document = renewal_document(&renewal).unwrap().unwrap();
        assert_eq!(document.id, "R600001");
        assert_eq!(document.body["uuid"], "r1");
        assert_eq!(document.body["rendate"], "1977-01-03");
        assert_eq!(document.body["authors"], "DOE, JANE");
        assert_eq!(document.body["claimants"][0]["claim_type"], "A");
        assert!(document.body["claimants"][1]["claim_type"].is_null());
    }

    #[test]
    fn test_renewal_without_number_is_skipped() {
        assert_eq!(renewal_document(&Renewal::new("r1")).unwrap(), None);
    }
}
