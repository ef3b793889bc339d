use thiserror::Error;

/// Unified error type for the entire expense-tracker-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Validation ──────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File must contain {} columns", quoted_list(.0))]
    MissingColumns(Vec<String>),

    #[error("Invalid value in row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("No transactions to export")]
    EmptyExport,

    // ── Persistence ─────────────────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Durable store error at {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Tabular formats ─────────────────────────────────────────────
    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}

impl CoreError {
    /// Malformed or missing caller input. The working set is never touched
    /// when one of these is returned.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_)
                | CoreError::UnsupportedFormat(_)
                | CoreError::MissingColumns(_)
                | CoreError::InvalidRow { .. }
                | CoreError::EmptyExport
                | CoreError::Csv(_)
                | CoreError::Spreadsheet(_)
        )
    }

    /// The durable store could not be read, quarantined or written.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            CoreError::FileIO(_)
                | CoreError::Persistence { .. }
                | CoreError::Serialization(_)
                | CoreError::Deserialization(_)
        )
    }
}

fn quoted_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(" and ")
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Csv(e.to_string())
    }
}

impl From<calamine::Error> for CoreError {
    fn from(e: calamine::Error) -> Self {
        CoreError::Spreadsheet(e.to_string())
    }
}

/// Only the exporter writes workbooks, so a writer failure is a
/// serialization fault rather than bad input.
impl From<rust_xlsxwriter::XlsxError> for CoreError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        CoreError::Serialization(format!("Spreadsheet export failed: {e}"))
    }
}
