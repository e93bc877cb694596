//! Table-versus-CSV comparison.
//!
//! The expected side is CSV text whose first record is a header row. Quoted
//! fields follow RFC 4180: `""` inside quotes is a literal quote and quoted
//! fields may contain commas and newlines. Cells compare after trimming.

use crate::result::{ScannerError, ScannerResult};
use serde::{Deserialize, Serialize};

/// One differing cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMismatch {
    /// 0-based data row (header excluded)
    pub row: usize,
    /// Column name from the CSV header, or the index if the header is short
    pub column: String,
    /// Value from the CSV
    pub expected: String,
    /// Value from the page
    pub actual: String,
}

/// Result of comparing rendered rows against CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableComparison {
    /// Header record of the CSV
    pub header: Vec<String>,
    /// Data rows in the CSV
    pub expected_rows: usize,
    /// Rows rendered on the page
    pub actual_rows: usize,
    /// Cells that differ, in row-major order
    pub mismatches: Vec<CellMismatch>,
}

impl TableComparison {
    /// Compare rendered `rows` against `csv` (header line first)
    pub fn compare(rows: &[Vec<String>], csv: &str) -> ScannerResult<Self> {
        let mut records = parse_csv(csv)?.into_iter();
        let header = records.next().unwrap_or_default();
        let expected: Vec<Vec<String>> = records.collect();

        let mut mismatches = Vec::new();
        for (row, (want, got)) in expected.iter().zip(rows).enumerate() {
            let width = want.len().max(got.len());
            for col in 0..width {
                let expected = want.get(col).map_or("", |s| s.trim());
                let actual = got.get(col).map_or("", |s| s.trim());
                if expected != actual {
                    mismatches.push(CellMismatch {
                        row,
                        column: header.get(col).cloned().unwrap_or_else(|| col.to_string()),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            header,
            expected_rows: expected.len(),
            actual_rows: rows.len(),
            mismatches,
        })
    }

    /// Row counts agree and no cell differs
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.expected_rows == self.actual_rows && self.mismatches.is_empty()
    }
}

/// Parse CSV text into records
pub fn parse_csv(input: &str) -> ScannerResult<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 1;
    let mut record_quoted = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
                record_quoted = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                line += 1;
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record), record_quoted);
                record_quoted = false;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ScannerError::Csv {
            line: quote_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !record.is_empty() || record_quoted {
        record.push(field);
        push_record(&mut records, record, record_quoted);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>, quoted: bool) {
    // Blank lines carry no data; `""` is an empty value
    if !quoted && record.len() == 1 && record[0].trim().is_empty() {
        return;
    }
    records.push(record);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|s| (*s).to_string()).collect())
            .collect()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_simple() {
            let records = parse_csv("a,b\n1,2\n").unwrap();
            assert_eq!(records, rows(&[&["a", "b"], &["1", "2"]]));
        }

        #[test]
        fn test_quoted_comma_and_escaped_quote() {
            let records = parse_csv("name,note\n\"Doe, Jane\",\"say \"\"hi\"\"\"\n").unwrap();
            assert_eq!(records[1], vec!["Doe, Jane", "say \"hi\""]);
        }

        #[test]
        fn test_crlf_and_no_trailing_newline() {
            let records = parse_csv("a,b\r\n1,2").unwrap();
            assert_eq!(records, rows(&[&["a", "b"], &["1", "2"]]));
        }

        #[test]
        fn test_blank_lines_skipped() {
            let records = parse_csv("a\n\n1\n\n").unwrap();
            assert_eq!(records.len(), 2);
        }

        #[test]
        fn test_quoted_empty_value_is_a_record() {
            let records = parse_csv("Note\n\"\"\nx\n\"\"").unwrap();
            assert_eq!(records, rows(&[&["Note"], &[""], &["x"], &[""]]));
        }

        #[test]
        fn test_empty_trailing_field() {
            let records = parse_csv("a,b\n1,\n").unwrap();
            assert_eq!(records[1], vec!["1", ""]);
        }

        #[test]
        fn test_unterminated_quote() {
            let err = parse_csv("a\n\"open\n").unwrap_err();
            assert!(matches!(err, ScannerError::Csv { line: 2, .. }));
        }
    }

    mod compare_tests {
        use super::*;

        const USERS: &str = "Name,Role\nAlice,admin\nBob,viewer\n";

        #[test]
        fn test_identical() {
            let table = rows(&[&["Alice", "admin"], &[" Bob ", "viewer"]]);
            let cmp = TableComparison::compare(&table, USERS).unwrap();
            assert!(cmp.is_match());
            assert_eq!(cmp.header, vec!["Name", "Role"]);
        }

        #[test]
        fn test_cell_mismatch_reports_column_name() {
            let table = rows(&[&["Alice", "admin"], &["Bob", "editor"]]);
            let cmp = TableComparison::compare(&table, USERS).unwrap();
            assert!(!cmp.is_match());
            assert_eq!(
                cmp.mismatches,
                vec![CellMismatch {
                    row: 1,
                    column: "Role".to_string(),
                    expected: "viewer".to_string(),
                    actual: "editor".to_string(),
                }]
            );
        }

        #[test]
        fn test_row_count_mismatch() {
            let table = rows(&[&["Alice", "admin"]]);
            let cmp = TableComparison::compare(&table, USERS).unwrap();
            assert!(cmp.mismatches.is_empty());
            assert_eq!(cmp.expected_rows, 2);
            assert_eq!(cmp.actual_rows, 1);
            assert!(!cmp.is_match());
        }

        #[test]
        fn test_single_column_with_empty_cell() {
            let table = rows(&[&["ok"], &[""], &["late"]]);
            let cmp = TableComparison::compare(&table, "Status\nok\n\"\"\nlate\n").unwrap();
            assert!(cmp.is_match(), "{:?}", cmp);
        }

        #[test]
        fn test_extra_column_uses_index() {
            let table = rows(&[&["Alice", "admin", "x"], &["Bob", "viewer"]]);
            let cmp = TableComparison::compare(&table, USERS).unwrap();
            assert_eq!(cmp.mismatches[0].column, "2");
        }
    }
}
