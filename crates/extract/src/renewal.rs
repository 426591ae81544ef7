//! Renewal TSV files.
//!
//! One row per renewal, tab separated, with a header row. Older files use
//! different names for a handful of columns; those are resolved once from the
//! header so every row reads the same positions. A file missing a column
//! under all of its names cannot be imported at all.

use crate::error::{ErrorKind, Result};
use crate::models::RenewalRow;
use csv::{ReaderBuilder, StringRecord};
use tracing::instrument;

/// Column positions resolved from the header row.
struct Columns {
    entry_id: usize,
    oreg: usize,
    odat: usize,
    id: usize,
    title: usize,
    renewal_date: usize,
    source: usize,
    author: usize,
    notes: usize,
    new_matter: usize,
    see_also_reg: usize,
    see_also_ren: usize,
    volume: usize,
    part: usize,
    number: usize,
    page: usize,
    claimants: usize,
}
impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        // Preferred name first, legacy name second.
        let find = |names: &[&'static str]| -> Result<usize> {
            names
                .iter()
                .find_map(|name| headers.iter().position(|h| h.trim() == *name))
                .ok_or_else(|| exn::Exn::from(ErrorKind::MissingColumn(names[0])))
        };
        Ok(Self {
            entry_id: find(&["entry_id"])?,
            oreg: find(&["oreg"])?,
            odat: find(&["odat"])?,
            id: find(&["id"])?,
            title: find(&["title", "titl"])?,
            renewal_date: find(&["rdat", "dreg"])?,
            source: find(&["source", "full_text"])?,
            author: find(&["author", "auth"])?,
            notes: find(&["notes", "note"])?,
            new_matter: find(&["new_matter"])?,
            see_also_reg: find(&["see_also_reg"])?,
            see_also_ren: find(&["see_also_ren"])?,
            volume: find(&["volume"])?,
            part: find(&["part"])?,
            number: find(&["number"])?,
            page: find(&["page"])?,
            claimants: find(&["claimants"])?,
        })
    }

    fn read(&self, record: &StringRecord) -> RenewalRow {
        let cell = |i: usize| record.get(i).unwrap_or_default().to_string();
        let optional = |i: usize| Some(cell(i)).filter(|v| !v.is_empty());
        RenewalRow {
            entry_id: cell(self.entry_id),
            oreg: cell(self.oreg),
            odat: cell(self.odat),
            renewal_num: cell(self.id),
            title: cell(self.title),
            renewal_date_text: cell(self.renewal_date),
            source: cell(self.source),
            author: cell(self.author),
            notes: cell(self.notes),
            new_matter: cell(self.new_matter),
            see_also_reg: cell(self.see_also_reg),
            see_also_ren: cell(self.see_also_ren),
            volume: optional(self.volume),
            part: optional(self.part),
            number: optional(self.number),
            page: optional(self.page),
            claimants: cell(self.claimants),
        }
    }
}

/// Parse a whole renewal file.
#[instrument(skip(data), fields(size = data.len()))]
pub fn parse_renewals(data: &[u8]) -> Result<Vec<RenewalRow>> {
    let mut reader = ReaderBuilder::new().delimiter(b'\t').flexible(true).from_reader(data);
    let headers = reader.headers().map_err(|e| ErrorKind::MalformedTsv(e.to_string()))?.clone();
    let columns = Columns::resolve(&headers)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ErrorKind::MalformedTsv(e.to_string()))?;
        rows.push(columns.read(&record));
    }
    tracing::debug!(rows = rows.len(), "Parsed renewal file");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MODERN: &str = "entry_id\tvolume\tpart\tnumber\tpage\tauthor\ttitle\toreg\todat\tid\trdat\tclaimants\tnew_matter\tsee_also_ren\tsee_also_reg\tnotes\tsource\n\
        a1b2\t31\t1\t\t4\tDOE, JANE\tSome Book\tA12345\t1950-03-01\tR600001\t1977-01-03\tJane Doe|A||Acme|PWH\t\t\t\t\tfull text\n";

    const LEGACY: &str = "entry_id\tvolume\tpart\tnumber\tpage\tauth\ttitl\toreg\todat\tid\tdreg\tclaimants\tnew_matter\tsee_also_ren\tsee_also_reg\tnote\tfull_text\n\
        c3d4\t\t\t\t\tROE, RICHARD\tOld Book\tA1\t1930-05-05\tR1\t03Jan57\tRichard Roe|A\t\t\t\tlegacy note\tsome text\n";

    #[test]
    fn test_modern_columns() {
        let rows = parse_renewals(MODERN.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.entry_id, "a1b2");
        assert_eq!(row.renewal_num, "R600001");
        assert_eq!(row.title, "Some Book");
        assert_eq!(row.author, "DOE, JANE");
        assert_eq!(row.volume.as_deref(), Some("31"));
        assert_eq!(row.number, None);
        assert_eq!(row.source, "full text");
        assert!(row.renewal_date().is_some());
        assert_eq!(row.claimants().len(), 2);
    }

    #[test]
    fn test_legacy_columns() {
        let rows = parse_renewals(LEGACY.as_bytes()).unwrap();
        let row = &rows[0];
        assert_eq!(row.title, "Old Book");
        assert_eq!(row.author, "ROE, RICHARD");
        assert_eq!(row.notes, "legacy note");
        assert_eq!(row.source, "some text");
        assert_eq!(row.renewal_date_text, "03Jan57");
        assert_eq!(row.renewal_date(), None);
        assert_eq!(row.volume, None);
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let data = format!("{}z9\t1\n", MODERN);
        let rows = parse_renewals(data.as_bytes()).unwrap();
        assert_eq!(rows[1].entry_id, "z9");
        assert_eq!(rows[1].volume.as_deref(), Some("1"));
        assert_eq!(rows[1].claimants, "");
    }

    #[rstest]
    #[case("title", "claimants")]
    #[case("titl", "claimants")]
    fn test_missing_column_is_fatal(#[case] drop_a: &str, #[case] drop_b: &str) {
        let header = MODERN.lines().next().unwrap();
        let kept = header.split('\t').filter(|c| *c != drop_a && *c != drop_b).collect::<Vec<_>>();
        let err = parse_renewals(kept.join("\t").as_bytes()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingColumn(_)));
    }

    #[test]
    fn test_missing_legacy_and_modern_names() {
        let header = MODERN.lines().next().unwrap().replace("\ttitle\t", "\theadline\t");
        let err = parse_renewals(header.as_bytes()).unwrap_err();
        assert_eq!(&*err, &ErrorKind::MissingColumn("title"));
    }
}
