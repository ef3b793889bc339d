use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Canonical, lexically sortable timestamp format used in the durable store.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats accepted when reading a timestamp back, most specific first.
const DATETIME_FORMATS: &[&str] = &[
    DATE_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_ONLY_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// The built-in categories offered to users.
///
/// Stored transactions keep their category as free text, so anything outside
/// this set is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Income,
    Food,
    Transport,
    Entertainment,
    Utilities,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Income,
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Utilities,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Income => "Income",
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Utilities => "Utilities",
            Category::Other => "Other",
        }
    }

    /// Look up a built-in category by its exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single income or expense record.
///
/// Amounts are signed: income positive, expenses negative. They are summed
/// as-is everywhere; no category implies a sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: f64,

    pub category: String,

    #[serde(default)]
    pub description: String,

    /// `YYYY-MM-DD HH:MM:SS`. Kept as text so an externally edited store
    /// round-trips unchanged; see [`Transaction::timestamp`].
    pub date: String,
}

impl Transaction {
    pub fn new(
        amount: f64,
        category: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDateTime,
    ) -> Self {
        Self {
            amount,
            category: category.into(),
            description: description.into(),
            date: format_timestamp(date),
        }
    }

    /// Parse the stored date into a comparable timestamp.
    /// Returns `None` when the text is not a recognisable date.
    #[must_use]
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.date)
    }
}

/// When a manually added transaction happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftDate {
    /// A calendar day; the time of day is taken from the clock at validation.
    Day(NaiveDate),
    /// A fully specified timestamp.
    Exact(NaiveDateTime),
}

/// An unvalidated transaction as submitted by a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub amount: String,
    pub category: String,
    pub description: Option<String>,
    pub date: Option<DraftDate>,
}

impl TransactionDraft {
    pub fn new(amount: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            category: category.into(),
            description: None,
            date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn on_day(mut self, day: NaiveDate) -> Self {
        self.date = Some(DraftDate::Day(day));
        self
    }

    pub fn at(mut self, timestamp: NaiveDateTime) -> Self {
        self.date = Some(DraftDate::Exact(timestamp));
        self
    }

    /// Check the draft and turn it into a [`Transaction`].
    ///
    /// `now` supplies the defaults for a missing date or a missing time of day.
    pub fn validate(self, now: NaiveDateTime) -> Result<Transaction, CoreError> {
        let amount = parse_amount(&self.amount)?;
        let category = validate_category(&self.category)?;
        let date = match self.date {
            None => now,
            Some(DraftDate::Day(day)) => day.and_time(now.time()),
            Some(DraftDate::Exact(ts)) => ts,
        };

        Ok(Transaction::new(
            amount,
            category,
            self.description.unwrap_or_default(),
            date,
        ))
    }
}

/// Parse a user-supplied amount. Rejects blanks, non-numbers, NaN and infinities.
pub fn parse_amount(raw: &str) -> Result<f64, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("amount is required".into()));
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| CoreError::Validation(format!("invalid amount value '{trimmed}'")))?;
    ensure_finite(value)
}

pub(crate) fn ensure_finite(value: f64) -> Result<f64, CoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::Validation(format!(
            "amount must be a finite number, got {value}"
        )))
    }
}

/// Categories are free text but never blank.
pub fn validate_category(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("category is required".into()));
    }
    Ok(trimmed.to_string())
}

#[must_use]
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(DATE_FORMAT).to_string()
}

/// Leniently parse a date or date-time string.
///
/// Date-only values resolve to midnight. RFC 3339 values keep their wall-clock
/// time and drop the offset.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_ONLY_FORMATS {
        if let Ok(day) = NaiveDate::parse_from_str(s, fmt) {
            return Some(day.and_time(NaiveTime::MIN));
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn parses_supported_shapes() {
        let expected = ts("2024-03-05 14:30:00");
        assert_eq!(parse_timestamp("2024-03-05 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 14:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("03/05/2024 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp(" 2024-03-05 "), Some(ts("2024-03-05 00:00:00")));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
    }

    #[test]
    fn category_lookup_is_exact() {
        assert_eq!(Category::from_name("Food"), Some(Category::Food));
        assert_eq!(Category::from_name("food"), None);
        assert_eq!(Category::ALL.len(), 6);
    }
}
