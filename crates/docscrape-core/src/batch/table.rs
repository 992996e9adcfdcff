//! CSV case tables.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, ScrapeError};
use crate::models::case::CaseId;

/// A CSV table kept as strings, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Rows sharing one case id, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRows {
    pub case: CaseId,
    pub rows: Vec<usize>,
}

impl CaseTable {
    /// Build a rectangular table. Short rows are padded with empty cells; rows
    /// longer than the header get unnamed columns so no cell is lost.
    pub fn new(mut headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let longest = rows.iter().map(Vec::len).max().unwrap_or(0);
        if longest > headers.len() {
            warn!(
                "Table rows have up to {} cells but only {} headers, adding unnamed columns",
                longest,
                headers.len()
            );
            headers.resize(longest, String::new());
        }
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let table = Self::from_reader(std::fs::File::open(path)?)?;
        debug!("Read {} rows from {}", table.len(), path.display());
        Ok(table)
    }

    /// Read a headed CSV with ragged rows, see [`new`](Self::new).
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;
        Ok(Self::new(headers, rows))
    }

    pub fn write_path(&self, path: &Path) -> Result<()> {
        self.write_to(std::fs::File::create(path)?)?;
        debug!("Wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }

    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| ScrapeError::Config(format!("input table has no '{}' column", name)))
    }

    /// Index of `name`, appending an empty column when missing.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    pub fn set(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.into();
        }
    }

    /// Distinct non-empty case ids in order of first appearance.
    pub fn case_ids(&self, case_column: usize) -> Vec<CaseId> {
        self.group_by_case(case_column)
            .into_iter()
            .map(|group| group.case)
            .collect()
    }

    /// Rows of every non-empty case id, grouped in one pass. Groups are in
    /// order of first appearance.
    pub fn group_by_case(&self, case_column: usize) -> Vec<CaseRows> {
        let mut groups: Vec<CaseRows> = Vec::new();
        let mut index: HashMap<CaseId, usize> = HashMap::new();
        for (row_index, row) in self.rows.iter().enumerate() {
            let Some(raw) = row.get(case_column) else {
                continue;
            };
            if raw.trim().is_empty() {
                continue;
            }
            let id = CaseId::new(raw.as_str());
            match index.get(&id) {
                Some(&group) => groups[group].rows.push(row_index),
                None => {
                    index.insert(id.clone(), groups.len());
                    groups.push(CaseRows {
                        case: id,
                        rows: vec![row_index],
                    });
                }
            }
        }
        groups
    }

    /// The subset of `rows` whose document column equals `label`.
    pub fn rows_labelled(&self, rows: &[usize], document_column: usize, label: &str) -> Vec<usize> {
        rows.iter()
            .copied()
            .filter(|&row| self.get(row, document_column).is_some_and(|d| d.trim() == label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INPUT: &str = "case_number,Document,Notes\n\
CGC1,Civil Case Cover Sheet,\n\
CGC1,Complaint,first\n\
CGC2,Complaint\n\
cgc1,Summons,\n";

    #[test]
    fn test_read_pads_short_rows() {
        let table = CaseTable::from_reader(INPUT.as_bytes()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(2, 2), Some(""));
        assert_eq!(table.get(1, 2), Some("first"));
    }

    #[test]
    fn test_case_ids_are_unique_in_first_appearance_order() {
        let table = CaseTable::from_reader(INPUT.as_bytes()).unwrap();
        let ids: Vec<String> = table
            .case_ids(0)
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["CGC1".to_string(), "CGC2".to_string()]);
    }

    #[test]
    fn test_rows_are_grouped_by_case_then_filtered_by_label() {
        let table = CaseTable::from_reader(INPUT.as_bytes()).unwrap();
        let groups = table.group_by_case(0);

        assert_eq!(
            groups,
            vec![
                CaseRows {
                    case: CaseId::new("CGC1"),
                    rows: vec![0, 1, 3],
                },
                CaseRows {
                    case: CaseId::new("CGC2"),
                    rows: vec![2],
                },
            ]
        );
        assert_eq!(table.rows_labelled(&groups[0].rows, 1, "Complaint"), vec![1]);
        assert_eq!(
            table.rows_labelled(&groups[0].rows, 1, "Civil Case Cover Sheet"),
            vec![0]
        );
        assert!(table.rows_labelled(&groups[1].rows, 1, "Civil Case Cover Sheet").is_empty());
    }

    #[test]
    fn test_long_rows_keep_their_extra_cells() {
        let mut table =
            CaseTable::from_reader("case_number,Document\nA1,Complaint,extra-note\nB2,Complaint\n".as_bytes())
                .unwrap();
        assert_eq!(table.headers(), &["case_number", "Document", ""]);
        assert_eq!(table.get(0, 2), Some("extra-note"));
        assert_eq!(table.get(1, 2), Some(""));

        let status = table.ensure_column("automated initial demand");
        table.set(0, status, "passed");

        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "case_number,Document,,automated initial demand\n\
A1,Complaint,extra-note,passed\n\
B2,Complaint,,\n"
        );
    }

    #[test]
    fn test_ensure_column_and_write_round_trip() {
        let mut table = CaseTable::from_reader(INPUT.as_bytes()).unwrap();
        let status = table.ensure_column("automated address");
        assert_eq!(status, 3);
        assert_eq!(table.ensure_column("automated address"), 3);
        table.set(0, status, "passed");

        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        let reread = CaseTable::from_reader(out.as_slice()).unwrap();
        assert_eq!(reread, table);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let table = CaseTable::from_reader(INPUT.as_bytes()).unwrap();
        assert!(table.require_column("case_number").is_ok());
        assert!(matches!(
            table.require_column("address"),
            Err(ScrapeError::Config(_))
        ));
    }
}
