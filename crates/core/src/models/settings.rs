use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::storage::manager::TEMP_SUFFIX;

pub const DEFAULT_DATA_FILE: &str = "transactions.json";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const DEFAULT_QUARANTINE_SUFFIX: &str = ".bak";

pub const ENV_DATA_FILE: &str = "EXPENSE_TRACKER_DATA_FILE";
pub const ENV_REFRESH_SECS: &str = "EXPENSE_TRACKER_REFRESH_SECS";
pub const ENV_RECENT_LIMIT: &str = "EXPENSE_TRACKER_RECENT_LIMIT";

/// Runtime configuration for an [`ExpenseTracker`](crate::ExpenseTracker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path of the durable JSON store.
    pub data_file: PathBuf,

    /// Seconds between reconciliation passes against the durable store.
    pub refresh_interval_secs: u64,

    /// Rows shown in the recent-transactions view.
    pub recent_limit: usize,

    /// Appended to the store path when a corrupt file is set aside.
    pub quarantine_suffix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            recent_limit: DEFAULT_RECENT_LIMIT,
            quarantine_suffix: DEFAULT_QUARANTINE_SUFFIX.to_string(),
        }
    }
}

impl Settings {
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    /// Read settings from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Overlay values from `EXPENSE_TRACKER_*` environment variables.
    pub fn with_env_overrides(self) -> Result<Self, CoreError> {
        self.overlay(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup (the environment in production).
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATA_FILE) {
            self.data_file = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_REFRESH_SECS) {
            self.refresh_interval_secs = raw.trim().parse().map_err(|_| {
                CoreError::Validation(format!("{ENV_REFRESH_SECS} must be an integer, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup(ENV_RECENT_LIMIT) {
            self.recent_limit = raw.trim().parse().map_err(|_| {
                CoreError::Validation(format!("{ENV_RECENT_LIMIT} must be an integer, got '{raw}'"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.data_file.as_os_str().is_empty() {
            return Err(CoreError::Validation("data_file must not be empty".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(CoreError::Validation(
                "refresh_interval_secs must be at least 1".into(),
            ));
        }
        if self.recent_limit == 0 {
            return Err(CoreError::Validation("recent_limit must be at least 1".into()));
        }
        if self.quarantine_suffix.is_empty() {
            return Err(CoreError::Validation(
                "quarantine_suffix must not be empty".into(),
            ));
        }
        if self.quarantine_suffix.ends_with(TEMP_SUFFIX) {
            return Err(CoreError::Validation(format!(
                "quarantine_suffix must not end with '{TEMP_SUFFIX}'"
            )));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_secs)
    }
}
