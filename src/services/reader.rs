// src/services/reader.rs

//! Tabular record reader.
//!
//! Parses a flat delimited export into content records. The first row is the
//! header and is stripped; every following row must carry the same number of
//! fields once quoted spans are honored.

use std::sync::Arc;

use csv::{Reader, ReaderBuilder};

use crate::error::AppError;
use crate::models::ContentRecord;
use crate::utils::delimited::unclosed_quote;

/// Result of reading one delimited table.
#[derive(Debug, Default)]
pub struct ParsedTable {
    pub header: Arc<[String]>,
    pub records: Vec<ContentRecord>,
    /// Rows that could not be parsed, as `MalformedRecord` errors
    pub rejected: Vec<AppError>,
}

/// Reader for delimited exports.
#[derive(Debug, Clone, Copy)]
pub struct TabularReader {
    delimiter: char,
}

impl TabularReader {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Parse raw delimited text into records, skipping malformed rows.
    ///
    /// A row whose quoted field never closes is rejected on its own; reading
    /// resumes on the line after the one holding the opening quote.
    pub fn parse(&self, text: &str) -> ParsedTable {
        let mut reader = self.builder(true).from_reader(text.as_bytes());

        let header: Arc<[String]> = match reader.headers() {
            Ok(h) => h.iter().map(str::to_string).collect::<Vec<_>>().into(),
            Err(e) => {
                return ParsedTable {
                    rejected: vec![AppError::malformed(1, format!("unreadable header: {e}"))],
                    ..ParsedTable::default()
                };
            }
        };

        let mut table = ParsedTable {
            header,
            ..ParsedTable::default()
        };
        let mut resume = self.read_rows(reader, text, 0, &mut table);
        while let Some((offset, lines_before)) = resume {
            let rest = &text[offset..];
            let reader = self.builder(false).from_reader(rest.as_bytes());
            resume = self
                .read_rows(reader, rest, lines_before, &mut table)
                .map(|(next, lines)| (offset + next, lines));
        }
        table
    }

    fn builder(&self, has_headers: bool) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(has_headers)
            .flexible(true)
            .delimiter(self.delimiter as u8);
        builder
    }

    /// Read the records of one segment into `table`.
    ///
    /// Returns where to resume when the segment's last row holds an unclosed
    /// quote: the byte offset within `segment` and the lines already consumed.
    fn read_rows(
        &self,
        mut reader: Reader<&[u8]>,
        segment: &str,
        lines_before: u64,
        table: &mut ParsedTable,
    ) -> Option<(usize, u64)> {
        let expected = table.header.len();
        let mut rows: Vec<Result<ContentRecord, AppError>> = Vec::new();
        let mut last_start = None;

        for result in reader.records() {
            match result {
                Ok(record) => {
                    let (byte, line) = record.position().map_or((0, 0), |p| (p.byte(), p.line()));
                    let line = lines_before + line;
                    last_start = Some((byte, line));
                    if record.len() != expected {
                        rows.push(Err(AppError::malformed(
                            line,
                            format!("expected {expected} fields, found {}", record.len()),
                        )));
                        continue;
                    }
                    let values = record.iter().map(str::to_string).collect();
                    rows.push(Ok(ContentRecord::new(line, Arc::clone(&table.header), values)));
                }
                Err(e) => {
                    let (byte, line) = e.position().map_or((0, 0), |p| (p.byte(), p.line()));
                    last_start = Some((byte, lines_before + line));
                    rows.push(Err(AppError::malformed(lines_before + line, e)));
                }
            }
        }

        // An unclosed quote swallows the rest of the segment into the last row.
        let mut resume = None;
        if let Some((byte, line)) = last_start {
            let byte = usize::try_from(byte).unwrap_or(segment.len());
            let raw = segment.get(byte..).unwrap_or_default();
            if let Some(quote) = unclosed_quote(raw, self.delimiter) {
                rows.pop();
                rows.push(Err(AppError::malformed(line, "unterminated quoted field")));
                resume = raw[quote..].find('\n').map(|end| {
                    let consumed = quote + end + 1;
                    let breaks = raw[..consumed].matches('\n').count() as u64;
                    (byte + consumed, line + breaks - 1)
                });
            }
        }

        for row in rows {
            match row {
                Ok(record) => table.records.push(record),
                Err(e) => {
                    log::warn!("Skipping row: {}", e);
                    table.rejected.push(e);
                }
            }
        }
        resume
    }
}
