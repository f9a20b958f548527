// src/utils/delimited.rs

//! Quote-aware splitting and joining of delimited rows.
//!
//! Quoting follows the usual double-quote convention: a quoted span may
//! contain the delimiter and line breaks, and `""` inside it is a literal quote.

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};

use crate::error::{AppError, Result};

const QUOTE: char = '"';

/// Byte offset of the quote opening a field that is still open at the end of `text`.
///
/// A quote only opens a field when it is the field's first character. Anywhere
/// else it is literal, as in `12" ruler`.
pub fn unclosed_quote(text: &str, delimiter: char) -> Option<usize> {
    let mut open = None;
    let mut field_start = true;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if open.is_some() {
            if c == QUOTE && chars.next_if(|&(_, n)| n == QUOTE).is_none() {
                open = None;
            }
        } else if field_start && c == QUOTE {
            open = Some(i);
            field_start = false;
        } else {
            field_start = c == delimiter || c == '\n' || c == '\r';
        }
    }
    open
}

/// Split one logical row into fields, honoring quoted spans.
///
/// Returns a description of the problem when quoting is unbalanced.
pub fn split_row(row: &str, delimiter: char) -> std::result::Result<Vec<String>, String> {
    if unclosed_quote(row, delimiter).is_some() {
        return Err("unterminated quoted field".to_string());
    }
    if row.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(row.as_bytes());

    let mut records = reader.records();
    let record = match records.next() {
        Some(record) => record.map_err(|e| e.to_string())?,
        None => return Ok(Vec::new()),
    };
    if records.next().is_some() {
        return Err("row contains an unquoted line break".to_string());
    }
    Ok(record.iter().map(str::to_string).collect())
}

/// Write rows as a delimited table, one record per line.
pub fn write_table<H, R, F>(header: &[H], rows: R, delimiter: char) -> Result<String>
where
    H: AsRef<str>,
    R: IntoIterator<Item = F>,
    F: IntoIterator,
    F::Item: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter as u8)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(header.iter().map(|h| h.as_ref().as_bytes()))?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::validation(format!("table is not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_quoted_delimiter() {
        assert_eq!(
            split_row(r#"a;"b;c";d"#, ';').unwrap(),
            vec!["a", "b;c", "d"]
        );
    }

    #[test]
    fn test_split_unescapes_doubled_quotes() {
        assert_eq!(
            split_row(r#""say ""hi""",x"#, ',').unwrap(),
            vec![r#"say "hi""#, "x"]
        );
    }

    #[test]
    fn test_split_rejects_unbalanced_quote() {
        assert!(split_row(r#"a,"b,c"#, ',').is_err());
    }

    #[test]
    fn test_split_keeps_empty_trailing_field() {
        assert_eq!(split_row("a;b;", ';').unwrap(), vec!["a", "b", ""]);
    }

    #[test]
    fn test_unclosed_quote_reports_opening_offset() {
        assert_eq!(unclosed_quote(r#"a,"b"#, ','), Some(2));
        assert_eq!(unclosed_quote(r#"a,"b""c""#, ','), None);
        assert_eq!(unclosed_quote("a,\"x\"\n\"y", ','), Some(6));
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        assert_eq!(unclosed_quote(r#"12" ruler,http://x.test/a"#, ','), None);
        assert_eq!(
            split_row(r#"http://x.test/a;;404;5" disk;;False"#, ';').unwrap(),
            vec!["http://x.test/a", "", "404", "5\" disk", "", "False"]
        );
    }

    #[test]
    fn test_write_table_quotes_only_when_needed() {
        let out = write_table(&["url", "title"], vec![vec!["http://x.test/a", "A, B"]], ',').unwrap();
        assert_eq!(out, "url,title\nhttp://x.test/a,\"A, B\"\n");
    }
}
