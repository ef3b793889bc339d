use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::transaction::Transaction;

/// Category value that disables the category filter.
pub const ALL_CATEGORIES: &str = "All";

/// Label of the placeholder slice rendered when nothing matches the filters.
pub const NO_DATA_LABEL: &str = "No data";

/// Category filter parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Interpret a raw filter value. Blank and `"All"` mean no filter.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(ALL_CATEGORIES) => CategoryFilter::All,
            Some(name) => CategoryFilter::Only(name.to_string()),
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(name) => name == category,
        }
    }
}

/// Filter parameters for a view query. Every field is optional and the
/// predicates are conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilter {
    /// Inclusive, from the start of this day.
    pub start_date: Option<NaiveDate>,
    /// Inclusive, through the end of this day.
    pub end_date: Option<NaiveDate>,
    pub category: CategoryFilter,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
}

impl ViewFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_date(mut self, day: NaiveDate) -> Self {
        self.start_date = Some(day);
        self
    }

    pub fn to_date(mut self, day: NaiveDate) -> Self {
        self.end_date = Some(day);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        let category: String = category.into();
        self.category = CategoryFilter::from_param(Some(category.as_str()));
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }
}

/// Sum of amounts for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Per-category totals, or a placeholder when the filtered set is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CategoryBreakdown {
    Totals(Vec<CategoryTotal>),
    NoData,
}

impl CategoryBreakdown {
    /// The real totals; empty for the placeholder.
    pub fn totals(&self) -> &[CategoryTotal] {
        match self {
            CategoryBreakdown::Totals(totals) => totals,
            CategoryBreakdown::NoData => &[],
        }
    }

    /// Sum across all categories. The placeholder contributes nothing.
    pub fn grand_total(&self) -> f64 {
        self.totals().iter().map(|t| t.total).sum()
    }

    /// Slices ready for a pie/donut chart. The placeholder renders as a single
    /// unit-sized slice labelled [`NO_DATA_LABEL`].
    pub fn slices(&self) -> Vec<(String, f64)> {
        match self {
            CategoryBreakdown::Totals(totals) => totals
                .iter()
                .map(|t| (t.category.clone(), t.total))
                .collect(),
            CategoryBreakdown::NoData => vec![(NO_DATA_LABEL.to_string(), 1.0)],
        }
    }
}

/// Sum of amounts for one (month, category) pair. `month` is the first day
/// of the calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCategoryTotal {
    pub month: NaiveDate,
    pub category: String,
    pub total: f64,
}

/// One step of the running total, keyed by exact timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub timestamp: NaiveDateTime,
    /// Sum of all amounts sharing this timestamp.
    pub amount: f64,
    /// Running sum up to and including this timestamp.
    pub cumulative: f64,
}

/// Headline numbers for the filtered set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSummary {
    pub count: usize,
    /// Sum of positive amounts.
    pub income: f64,
    /// Sum of negative amounts (zero or negative).
    pub expenses: f64,
    pub net: f64,
}

/// Everything the presentation layer needs to render one screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
    /// Newest first, at most the configured limit.
    pub recent: Vec<Transaction>,
    pub categories: CategoryBreakdown,
    /// Sorted by month, then category. Months without activity are absent.
    pub monthly: Vec<MonthlyCategoryTotal>,
    /// Ascending by timestamp.
    pub cumulative: Vec<CumulativePoint>,
    pub summary: ViewSummary,
    /// Records skipped because their date could not be parsed.
    pub excluded: usize,
}

impl ViewResult {
    pub fn empty(excluded: usize) -> Self {
        Self {
            recent: Vec::new(),
            categories: CategoryBreakdown::NoData,
            monthly: Vec::new(),
            cumulative: Vec::new(),
            summary: ViewSummary::default(),
            excluded,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.count == 0
    }
}
