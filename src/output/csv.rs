//! CSV table of merged records
//!
//! Fields containing a comma, quote or line break are quoted, with inner
//! quotes doubled. The reader accepts what the writer produces plus CRLF line
//! endings and an optional UTF-8 BOM.

use crate::output::{OutputError, OutputResult};
use crate::record::{MergedRecord, COLUMNS};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::mem::take;
use std::path::Path;

const SEPARATOR: char = ',';

/// One table row keyed by column name
pub type Row = HashMap<String, String>;

/// Writes the header and one row per record to `path`
///
/// The file is created (or truncated) even when there are no records, so an
/// empty crawl still leaves a header-only table.
pub fn write_records(path: &Path, records: &[MergedRecord]) -> OutputResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_table(&mut writer, records)?;
    writer.flush()?;

    tracing::info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Writes the header and one row per record to any writer
pub fn write_table<W: Write>(mut writer: W, records: &[MergedRecord]) -> OutputResult<()> {
    write_row(&mut writer, &COLUMNS)?;
    for record in records {
        write_row(&mut writer, &record.values())?;
    }
    Ok(())
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(mut writer: W, row: &[&str]) -> std::io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(writer, "{}", SEPARATOR)?;
        }
        if needs_quotes(cell) {
            write!(writer, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(writer, "{}", cell)?;
        }
    }
    writeln!(writer)
}

/// Reads a table written by [`write_records`] into header-keyed rows
///
/// Short rows are padded with empty strings. The table must have a header
/// containing at least a `name` column.
pub fn read_table(path: &Path) -> OutputResult<Vec<Row>> {
    let text = std::fs::read_to_string(path)?;
    parse_table(&text)
}

/// Parses CSV text into header-keyed rows
pub fn parse_table(text: &str) -> OutputResult<Vec<Row>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = parse_rows(text).into_iter();

    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    if !header.iter().any(|h| h == "name") {
        return Err(OutputError::MissingColumn("name".to_string()));
    }

    Ok(rows
        .map(|row| {
            header
                .iter()
                .enumerate()
                .map(|(i, column)| (column.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect())
}

/// Splits CSV text into rows of fields, honouring quoted fields
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            c if c == SEPARATOR && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}
