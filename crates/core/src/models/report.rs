use crate::errors::CoreError;
use crate::export::ExportFile;

use super::transaction::Transaction;

/// How a user-triggered mutation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationStatus {
    /// One manual transaction was appended and saved.
    Added,
    /// A batch of this many transactions was appended and saved.
    Imported(usize),
    /// Nothing changed; the message explains why.
    Rejected(String),
}

impl MutationStatus {
    pub(crate) fn rejected_add(error: &CoreError) -> Self {
        let message = match error {
            CoreError::Validation(reason) => format!("Invalid transaction: {reason}."),
            other if other.is_persistence() => format!("Could not save transaction: {other}"),
            other => other.to_string(),
        };
        MutationStatus::Rejected(message)
    }

    pub(crate) fn rejected_import(error: &CoreError) -> Self {
        let message = match error {
            CoreError::MissingColumns(_) | CoreError::UnsupportedFormat(_) => format!("{error}."),
            other if other.is_persistence() => {
                format!("Could not save imported transactions: {other}")
            }
            other => format!("Error importing file: {other}"),
        };
        MutationStatus::Rejected(message)
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, MutationStatus::Rejected(_))
    }

    /// Human-readable status line for a toast or console.
    pub fn message(&self) -> String {
        match self {
            MutationStatus::Added => "Transaction added!".to_string(),
            MutationStatus::Imported(count) => format!("Imported {count} transactions."),
            MutationStatus::Rejected(message) => message.clone(),
        }
    }
}

/// The working set after a mutation, plus what happened.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationReport<'a> {
    pub transactions: &'a [Transaction],
    pub status: MutationStatus,
}

impl MutationReport<'_> {
    pub fn message(&self) -> String {
        self.status.message()
    }
}

/// Result of a user-triggered export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub file: Option<ExportFile>,
    pub message: String,
}
