//! Comma-separated import.

use crate::errors::CoreError;

use super::{Cell, Table};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read a header row and data rows from CSV bytes.
///
/// Rows may be shorter than the header; missing trailing cells read as empty.
pub fn read_table(bytes: &[u8]) -> Result<Table, CoreError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        // Header is line 1; the reader tracks the physical line of each record.
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 2);
        let cells = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        rows.push((line, cells));
    }

    Ok(Table { headers, rows })
}
