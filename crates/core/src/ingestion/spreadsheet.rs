//! Spreadsheet import (`.xls` / `.xlsx`). Only the first worksheet is read and
//! its first row is the header.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::errors::CoreError;

use super::{Cell, Table};

pub fn read_table(bytes: &[u8]) -> Result<Table, CoreError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CoreError::Spreadsheet("workbook has no worksheets".into()))??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => Vec::new(),
    };

    // Positions are relative to the used range, which may not start at A1.
    let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let rows = rows
        .enumerate()
        .map(|(idx, row)| (first_row + idx + 1, row.iter().map(to_cell).collect()))
        .collect();

    Ok(Table { headers, rows })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) | Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => Cell::DateTime(ts),
            None => Cell::Number(dt.as_f64()),
        },
        other => Cell::Text(other.to_string()),
    }
}
