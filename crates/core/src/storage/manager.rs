use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::models::settings::DEFAULT_QUARANTINE_SUFFIX;
use crate::models::transaction::Transaction;

use super::format;

/// Ending of the scratch file written next to the store during a save.
pub const TEMP_SUFFIX: &str = ".tmp";

/// What [`StorageManager::load_detailed`] found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub transactions: Vec<Transaction>,
    /// Set when the store was unreadable and has been moved aside.
    pub quarantined: Option<PathBuf>,
}

/// Reads and writes the durable JSON store.
///
/// A missing store is an empty store. A corrupt store is renamed out of the
/// way and also treated as empty, so it is never silently overwritten.
#[derive(Debug, Clone)]
pub struct StorageManager {
    path: PathBuf,
    quarantine_suffix: String,
}

impl StorageManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            quarantine_suffix: DEFAULT_QUARANTINE_SUFFIX.to_string(),
        }
    }

    pub fn with_quarantine_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.quarantine_suffix = suffix.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all transactions in stored order.
    pub fn load(&self) -> Result<Vec<Transaction>, CoreError> {
        self.load_detailed().map(|report| report.transactions)
    }

    /// Load all transactions and report whether the store had to be quarantined.
    ///
    /// Errors only when the file exists but cannot be read, or when a corrupt
    /// file cannot be moved aside.
    pub fn load_detailed(&self) -> Result<LoadReport, CoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "durable store absent, starting empty");
                return Ok(LoadReport {
                    transactions: Vec::new(),
                    quarantined: None,
                });
            }
            Err(e) => return Err(self.persistence_error(format!("failed to read store: {e}"))),
        };

        match format::read_store(&bytes) {
            Ok(transactions) => Ok(LoadReport {
                transactions,
                quarantined: None,
            }),
            Err(parse_error) => {
                let target = self.quarantine()?;
                tracing::warn!(
                    path = %self.path.display(),
                    quarantine = %target.display(),
                    "durable store is corrupt, moved aside: {parse_error}"
                );
                Ok(LoadReport {
                    transactions: Vec::new(),
                    quarantined: Some(target),
                })
            }
        }
    }

    /// Replace the store with `transactions`.
    ///
    /// The new content is written to a sibling temporary file and renamed over
    /// the store, so readers see either the old or the new collection.
    pub fn save(&self, transactions: &[Transaction]) -> Result<(), CoreError> {
        let bytes = format::write_store(transactions)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| self.persistence_error(format!("failed to create directory: {e}")))?;
        }

        let tmp = self.sibling(&format!(".{}{TEMP_SUFFIX}", std::process::id()));
        let written = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(self.persistence_error(format!("failed to write store: {e}")));
        }

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.persistence_error(format!("failed to replace store: {e}")));
        }

        tracing::debug!(path = %self.path.display(), count = transactions.len(), "saved durable store");
        Ok(())
    }

    /// Move the current store to the first free `<store><suffix>[.N]` path.
    fn quarantine(&self) -> Result<PathBuf, CoreError> {
        let mut target = self.sibling(&self.quarantine_suffix);
        let mut n = 1;
        while target.exists() {
            target = self.sibling(&format!("{}.{n}", self.quarantine_suffix));
            n += 1;
        }
        fs::rename(&self.path, &target).map_err(|e| {
            self.persistence_error(format!(
                "store is corrupt and could not be moved to {}: {e}",
                target.display()
            ))
        })?;
        Ok(target)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn persistence_error(&self, message: String) -> CoreError {
        CoreError::Persistence {
            path: self.path.display().to_string(),
            message,
        }
    }
}
