// src/services/normalizer.rs

//! Oracle output normalizer.
//!
//! Repairs the validation oracle's raw delimited report into a strict
//! one-record-per-line table:
//!
//! 1. line breaks that do not end a record are collapsed into a single space;
//! 2. comment rows are dropped;
//! 3. each row is re-split honoring quoted spans;
//! 4. repeated header rows are dropped and one header is synthesized on top.
//!
//! A break ends a record when no quoted span is open and either the line ends
//! with one of the configured terminator marks or, unless
//! `full_row_ends_record` is switched off, the pending row already holds a
//! full set of fields.
//!
//! A quote that never closes does not swallow the rest of the report. The
//! pending row is given up as soon as a line that is a complete record on its
//! own or an annotation arrives, or after [`MAX_QUOTED_LINES`] lines.

use crate::error::{AppError, Result};
use crate::models::OracleConfig;
use crate::utils::delimited::{split_row, unclosed_quote, write_table};

/// Physical lines a quoted span may cover before its row is given up.
pub const MAX_QUOTED_LINES: usize = 16;

/// A repaired oracle report.
#[derive(Debug, Default)]
pub struct NormalizedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows that could not be split into the expected field count
    pub rejected: Vec<AppError>,
    /// Header occurrences dropped beyond the first
    pub duplicate_headers: usize,
}

impl NormalizedTable {
    /// Render with the given delimiter, header first.
    pub fn to_delimited(&self, delimiter: char) -> Result<String> {
        write_table(&self.header, &self.rows, delimiter)
    }
}

/// Service normalizing raw oracle reports.
pub struct OracleNormalizer {
    layout: OracleConfig,
    target: char,
}

impl OracleNormalizer {
    /// `target` is the delimiter of the normalized output.
    pub fn new(layout: &OracleConfig, target: char) -> Self {
        Self {
            layout: layout.clone(),
            target,
        }
    }

    /// Normalize a raw report. Unsplittable rows are skipped and recorded.
    pub fn normalize(&self, raw: &str) -> NormalizedTable {
        let delimiter = self.detect_delimiter(raw);
        let expected = self.layout.columns.len();

        let mut table = NormalizedTable {
            header: self.layout.columns.clone(),
            ..NormalizedTable::default()
        };
        let mut header_seen = false;

        for (line, row) in self.collapse_breaks(raw, delimiter) {
            if row.starts_with(self.layout.comment_marker) {
                continue;
            }

            let mut fields = match split_row(&row, delimiter) {
                Ok(fields) => fields,
                Err(message) => {
                    self.reject(&mut table, AppError::normalization(line, message));
                    continue;
                }
            };
            // A trailing delimiter after the last column yields one empty extra field.
            if fields.len() == expected + 1 && fields.last().is_some_and(String::is_empty) {
                fields.pop();
            }
            if fields.len() != expected {
                self.reject(
                    &mut table,
                    AppError::normalization(
                        line,
                        format!("expected {expected} fields, found {}", fields.len()),
                    ),
                );
                continue;
            }

            if self.is_header(&fields) {
                if header_seen {
                    table.duplicate_headers += 1;
                }
                header_seen = true;
                continue;
            }
            table.rows.push(fields);
        }

        if table.duplicate_headers > 0 {
            log::info!(
                "Dropped {} repeated oracle header rows",
                table.duplicate_headers
            );
        }
        table
    }

    /// Use the target delimiter when the input is already normalized output.
    fn detect_delimiter(&self, raw: &str) -> char {
        let first = raw
            .lines()
            .find(|l| !l.trim().is_empty() && !l.starts_with(self.layout.comment_marker));
        match first.map(|l| split_row(l, self.target)) {
            Some(Ok(fields)) if self.is_header(&fields) => self.target,
            _ => self.layout.delimiter,
        }
    }

    fn is_header(&self, fields: &[String]) -> bool {
        fields.len() == self.layout.columns.len()
            && fields
                .iter()
                .zip(&self.layout.columns)
                .all(|(f, c)| f.trim() == c)
    }

    /// Reassemble logical rows, tagged with the physical line they start on.
    fn collapse_breaks(&self, raw: &str, delimiter: char) -> Vec<(u64, String)> {
        let mut rows = Vec::new();
        let mut current = String::new();
        let mut start = 0;

        for (index, line) in raw.lines().enumerate() {
            let number = index as u64 + 1;
            let pending = !current.is_empty();
            let mut open = pending && unclosed_quote(&current, delimiter).is_some();

            if open && self.abandons_quote(line, number - start, delimiter) {
                rows.push((start, std::mem::take(&mut current)));
                open = false;
            }
            if !open && !current.is_empty() && self.starts_annotation(line) {
                rows.push((start, std::mem::take(&mut current)));
            }
            if !open && line.trim().is_empty() {
                if !current.is_empty() {
                    rows.push((start, std::mem::take(&mut current)));
                }
                continue;
            }

            if current.is_empty() {
                start = number;
                current.push_str(line);
            } else {
                current.push(' ');
                current.push_str(line);
            }

            if self.ends_record(&current, line, delimiter) {
                rows.push((start, std::mem::take(&mut current)));
            }
        }
        if !current.is_empty() {
            rows.push((start, current));
        }
        rows
    }

    fn starts_annotation(&self, line: &str) -> bool {
        line.starts_with(self.layout.comment_marker)
    }

    /// Whether a row left open by a quote should be closed off before `line`.
    fn abandons_quote(&self, line: &str, spanned: u64, delimiter: char) -> bool {
        spanned >= MAX_QUOTED_LINES as u64
            || self.starts_annotation(line)
            || (unclosed_quote(line, delimiter).is_none()
                && split_row(line, delimiter).is_ok_and(|f| f.len() >= self.layout.columns.len()))
    }

    fn ends_record(&self, pending: &str, line: &str, delimiter: char) -> bool {
        if unclosed_quote(pending, delimiter).is_some() {
            return false;
        }
        if pending.starts_with(self.layout.comment_marker) {
            return true;
        }
        if line
            .trim_end()
            .chars()
            .last()
            .is_some_and(|c| self.layout.record_terminators.contains(&c))
        {
            return true;
        }
        self.layout.full_row_ends_record
            && split_row(pending, delimiter).is_ok_and(|f| f.len() >= self.layout.columns.len())
    }

    fn reject(&self, table: &mut NormalizedTable, error: AppError) {
        log::warn!("Skipping oracle row: {}", error);
        table.rejected.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> OracleConfig {
        OracleConfig {
            columns: ["urlname", "parentname", "result", "warningstring", "infostring", "valid"]
                .into_iter()
                .map(String::from)
                .collect(),
            ..OracleConfig::default()
        }
    }

    const HEADER: &str = "urlname;parentname;result;warningstring;infostring;valid";

    #[test]
    fn test_collapses_wrapped_diagnostic() {
        let raw = format!(
            "{HEADER}\nhttp://x.test/a;;404 Not Found;URL has\nbeen moved permanently;info;False\n"
        );
        let table = OracleNormalizer::new(&layout(), ',').normalize(&raw);
        assert!(table.rejected.is_empty());
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][3], "URL has been moved permanently");
    }

    #[test]
    fn test_collapses_break_inside_quotes() {
        let raw = format!("{HEADER}\nhttp://x.test/a;;\"500;\nboom\";;;False\n");
        let table = OracleNormalizer::new(&layout(), ',').normalize(&raw);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][2], "500; boom");
    }

    #[test]
    fn test_drops_comment_rows() {
        let raw = format!(
            "# created by oracle\n{HEADER}\nhttp://x.test/a;;404;;;False\n# Stopped checking at 12:00\n"
        );
        let table = OracleNormalizer::new(&layout(), ',').normalize(&raw);
        assert_eq!(table.rows.len(), 1);
        assert!(table.rejected.is_empty());
    }

    #[test]
    fn test_repeated_headers_collapse_to_one() {
        let raw = format!(
            "{HEADER}\nhttp://x.test/a;;404;;;False\n# batch 2\n{HEADER}\nhttp://x.test/b;;500;;;False\n"
        );
        let table = OracleNormalizer::new(&layout(), ',').normalize(&raw);
        assert_eq!(table.duplicate_headers, 1);
        assert_eq!(table.rows.len(), 2);

        let out = table.to_delimited(',').unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "urlname,parentname,result,warningstring,infostring,valid");
        assert_eq!(lines.iter().filter(|l| l.starts_with("urlname")).count(), 1);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_short_row_is_rejected() {
        let raw = format!("{HEADER}\nhttp://x.test/a;;404;\n\nhttp://x.test/b;;500;;;False\n");
        let table = OracleNormalizer::new(&layout(), ',').normalize(&raw);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rejected.len(), 1);
        assert!(matches!(
            table.rejected[0],
            AppError::Normalization { line: 2, .. }
        ));
    }

    #[test]
    fn test_trailing_delimiter_is_tolerated() {
        let raw = format!("{HEADER}\nhttp://x.test/a;;404;;;False;\n");
        let table = OracleNormalizer::new(&layout(), ',').normalize(&raw);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][5], "False");
    }

    #[test]
    fn test_normalizing_twice_is_stable() {
        let raw = format!(
            "# header comment\n{HEADER}\nhttp://x.test/a;;404 Not\nFound;\"a, b\";;False\n{HEADER}\nhttp://x.test/b;http://x.test/;500;;;False\n"
        );
        let normalizer = OracleNormalizer::new(&layout(), ',');
        let once = normalizer.normalize(&raw).to_delimited(',').unwrap();
        let twice_table = normalizer.normalize(&once);
        assert_eq!(twice_table.duplicate_headers, 0);
        assert!(twice_table.rejected.is_empty());
        assert_eq!(twice_table.to_delimited(',').unwrap(), once);
    }

    #[test]
    fn test_quote_inside_warning_keeps_every_row() {
        let raw = format!(
            "{HEADER}\nhttp://x.test/a;;404;5\" disk missing;;False\n\
             http://x.test/b;;500;;;False\nhttp://x.test/c;;410;;;False\n"
        );
        let table = OracleNormalizer::new(&layout(), ',').normalize(&raw);
        assert!(table.rejected.is_empty());
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][3], "5\" disk missing");
    }

    #[test]
    fn test_unclosed_quote_rejects_only_its_row() {
        let raw = format!(
            "{HEADER}\nhttp://x.test/a;;404;\"5 disk missing;;False\n\
             http://x.test/b;;500;;;False\nhttp://x.test/c;;410;;;False\n"
        );
        let table = OracleNormalizer::new(&layout(), ',').normalize(&raw);
        assert_eq!(table.rejected.len(), 1);
        assert!(matches!(
            &table.rejected[0],
            AppError::Normalization { line: 2, message } if message.contains("unterminated")
        ));
        let urls: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(urls, vec!["http://x.test/b", "http://x.test/c"]);
    }

    #[test]
    fn test_unclosed_quote_stops_at_annotation() {
        let raw = format!(
            "{HEADER}\nhttp://x.test/a;;\"timed\nout;;;False\n# Stopped checking\n"
        );
        let table = OracleNormalizer::new(&layout(), ',').normalize(&raw);
        assert!(table.rows.is_empty());
        assert_eq!(table.rejected.len(), 1);
    }

    #[test]
    fn test_full_row_rule_can_be_switched_off() {
        let raw = format!("{HEADER};\nhttp://x.test/a;;404;;;wrapped\ntext;\n");

        let table = OracleNormalizer::new(&layout(), ',').normalize(&raw);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][5], "wrapped");
        assert_eq!(table.rejected.len(), 1);

        let strict = OracleConfig {
            full_row_ends_record: false,
            ..layout()
        };
        let table = OracleNormalizer::new(&strict, ',').normalize(&raw);
        assert!(table.rejected.is_empty());
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][5], "wrapped text");
    }

    #[test]
    fn test_header_synthesized_without_input_header() {
        let raw = "http://x.test/a;;404;;;False\n";
        let table = OracleNormalizer::new(&layout(), ',').normalize(raw);
        assert_eq!(table.header, layout().columns);
        assert_eq!(table.rows.len(), 1);
    }
}
