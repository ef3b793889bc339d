//! Serializes transactions for download. Both formats use the columns
//! `date, amount, category, description` in that order.

use rust_xlsxwriter::{Format, Workbook};

use crate::errors::CoreError;
use crate::models::transaction::Transaction;

pub const EXPORT_COLUMNS: [&str; 4] = ["date", "amount", "category", "description"];

/// Output formats offered for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "transactions.csv",
            ExportFormat::Xlsx => "transactions.xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            other => Err(CoreError::UnsupportedFormat(format!(
                "'{other}' (expected csv or xlsx)"
            ))),
        }
    }
}

/// A rendered export, ready to be written or sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Render `transactions` in the chosen format. An empty set is rejected.
pub fn export(transactions: &[Transaction], format: ExportFormat) -> Result<ExportFile, CoreError> {
    if transactions.is_empty() {
        return Err(CoreError::EmptyExport);
    }
    let bytes = match format {
        ExportFormat::Csv => to_csv(transactions)?,
        ExportFormat::Xlsx => to_xlsx(transactions)?,
    };
    Ok(ExportFile {
        file_name: format.file_name().to_string(),
        content_type: format.content_type().to_string(),
        bytes,
    })
}

pub fn to_csv(transactions: &[Transaction]) -> Result<Vec<u8>, CoreError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_COLUMNS)
        .map_err(csv_write_error)?;
    for tx in transactions {
        let amount = tx.amount.to_string();
        writer
            .write_record([
                tx.date.as_str(),
                amount.as_str(),
                tx.category.as_str(),
                tx.description.as_str(),
            ])
            .map_err(csv_write_error)?;
    }
    writer
        .into_inner()
        .map_err(|e| CoreError::Serialization(format!("Failed to flush CSV export: {e}")))
}

/// Writer failures are ours, not the caller's input.
fn csv_write_error(e: ::csv::Error) -> CoreError {
    CoreError::Serialization(format!("CSV export failed: {e}"))
}

pub fn to_xlsx(transactions: &[Transaction]) -> Result<Vec<u8>, CoreError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Transactions")?;

    for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }
    for (idx, tx) in transactions.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_string(row, 0, tx.date.as_str())?;
        sheet.write_number(row, 1, tx.amount)?;
        sheet.write_string(row, 2, tx.category.as_str())?;
        sheet.write_string(row, 3, tx.description.as_str())?;
    }
    sheet.set_column_width(0, 20.0)?;
    sheet.set_column_width(3, 40.0)?;

    Ok(workbook.save_to_buffer()?)
}
