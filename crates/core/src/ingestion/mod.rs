//! Turns uploaded tabular files into validated transactions.
//!
//! Parsing is all-or-nothing: a missing required column or a single bad row
//! rejects the whole batch, and nothing is returned for partial use.

pub mod csv;
pub mod spreadsheet;

use chrono::NaiveDateTime;

use crate::errors::CoreError;
use crate::models::transaction::{
    ensure_finite, format_timestamp, parse_amount, parse_timestamp, validate_category,
    Transaction,
};

pub const AMOUNT_COLUMN: &str = "amount";
pub const CATEGORY_COLUMN: &str = "category";
pub const DATE_COLUMN: &str = "date";
pub const DESCRIPTION_COLUMN: &str = "description";

/// File formats accepted for import, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Spreadsheet,
}

impl ImportFormat {
    /// Pick a format from a file name. Extensions are matched case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, CoreError> {
        let lower = filename.trim().to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(ImportFormat::Csv)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Ok(ImportFormat::Spreadsheet)
        } else {
            Err(CoreError::UnsupportedFormat(format!(
                "'{filename}' (expected .csv, .xls or .xlsx)"
            )))
        }
    }
}

/// A single cell value, independent of the source format.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Header plus data rows. Each row carries its 1-based position in the file.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<(usize, Vec<Cell>)>,
}

/// Column positions resolved from the header row.
struct Columns {
    amount: usize,
    category: usize,
    date: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn resolve(headers: &[String]) -> Result<Self, CoreError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let amount = find(AMOUNT_COLUMN);
        let category = find(CATEGORY_COLUMN);
        match (amount, category) {
            (Some(amount), Some(category)) => Ok(Self {
                amount,
                category,
                date: find(DATE_COLUMN),
                description: find(DESCRIPTION_COLUMN),
            }),
            _ => Err(CoreError::MissingColumns(vec![
                AMOUNT_COLUMN.to_string(),
                CATEGORY_COLUMN.to_string(),
            ])),
        }
    }
}

/// Parse an uploaded file into transactions.
///
/// `now` stamps every row whose date is absent.
pub fn parse(bytes: &[u8], filename: &str, now: NaiveDateTime) -> Result<Vec<Transaction>, CoreError> {
    let table = match ImportFormat::from_filename(filename)? {
        ImportFormat::Csv => csv::read_table(bytes)?,
        ImportFormat::Spreadsheet => spreadsheet::read_table(bytes)?,
    };
    let batch = build_batch(table, now)?;
    tracing::debug!(filename, rows = batch.len(), "parsed import batch");
    Ok(batch)
}

/// Validate every row of `table`. Blank rows are skipped.
pub fn build_batch(table: Table, now: NaiveDateTime) -> Result<Vec<Transaction>, CoreError> {
    let columns = Columns::resolve(&table.headers)?;

    let mut batch = Vec::with_capacity(table.rows.len());
    for (row, cells) in table.rows {
        if cells.iter().all(Cell::is_blank) {
            continue;
        }
        let cell = |idx: Option<usize>| idx.and_then(|i| cells.get(i)).unwrap_or(&EMPTY_CELL);
        let invalid = |message: String| CoreError::InvalidRow { row, message };

        let amount = amount_from(cell(Some(columns.amount))).map_err(|e| invalid(reason(e)))?;
        let category = validate_category(&text_from(cell(Some(columns.category))))
            .map_err(|e| invalid(reason(e)))?;
        let date = date_from(cell(columns.date), now).map_err(invalid)?;
        let description = text_from(cell(columns.description));

        batch.push(Transaction {
            amount,
            category,
            description,
            date: format_timestamp(date),
        });
    }

    if batch.is_empty() {
        return Err(CoreError::Validation("file contains no transactions".into()));
    }
    Ok(batch)
}

fn reason(error: CoreError) -> String {
    match error {
        CoreError::Validation(message) => message,
        other => other.to_string(),
    }
}

fn amount_from(cell: &Cell) -> Result<f64, CoreError> {
    match cell {
        Cell::Number(n) => ensure_finite(*n),
        Cell::Text(s) => parse_amount(s),
        Cell::Empty => Err(CoreError::Validation("amount is required".into())),
        Cell::DateTime(dt) => Err(CoreError::Validation(format!(
            "invalid amount value '{dt}'"
        ))),
    }
}

fn text_from(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) => n.to_string(),
        Cell::DateTime(dt) => format_timestamp(*dt),
    }
}

fn date_from(cell: &Cell, now: NaiveDateTime) -> Result<NaiveDateTime, String> {
    match cell {
        Cell::DateTime(dt) => Ok(*dt),
        c if c.is_blank() => Ok(now),
        Cell::Text(s) => parse_timestamp(s).ok_or_else(|| format!("invalid date '{}'", s.trim())),
        Cell::Number(n) => Err(format!("invalid date '{n}'")),
        Cell::Empty => Ok(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_dispatch() {
        assert_eq!(ImportFormat::from_filename("a.csv").unwrap(), ImportFormat::Csv);
        assert_eq!(ImportFormat::from_filename("A.CSV").unwrap(), ImportFormat::Csv);
        assert_eq!(
            ImportFormat::from_filename("book.xlsx").unwrap(),
            ImportFormat::Spreadsheet
        );
        assert_eq!(
            ImportFormat::from_filename("old.xls").unwrap(),
            ImportFormat::Spreadsheet
        );
        assert!(matches!(
            ImportFormat::from_filename("notes.txt"),
            Err(CoreError::UnsupportedFormat(_))
        ));
        assert!(ImportFormat::from_filename("csv").is_err());
    }

    #[test]
    fn header_match_ignores_case_and_padding() {
        let headers = vec![" Amount ".to_string(), "CATEGORY".to_string()];
        let cols = Columns::resolve(&headers).unwrap();
        assert_eq!(cols.amount, 0);
        assert_eq!(cols.category, 1);
        assert!(cols.date.is_none());
        assert!(cols.description.is_none());
    }
}
