use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

use crate::models::settings::DEFAULT_RECENT_LIMIT;
use crate::models::transaction::Transaction;
use crate::models::view::{
    CategoryBreakdown, CategoryTotal, CumulativePoint, MonthlyCategoryTotal, ViewFilter,
    ViewResult, ViewSummary,
};

/// Filters the working set and computes every aggregate a dashboard renders.
///
/// Pure business logic: the output depends only on the records and the filter.
pub struct ViewService {
    recent_limit: usize,
}

impl ViewService {
    pub fn new() -> Self {
        Self::with_recent_limit(DEFAULT_RECENT_LIMIT)
    }

    pub fn with_recent_limit(recent_limit: usize) -> Self {
        Self { recent_limit }
    }

    /// Apply `filter` to `records` and aggregate the survivors.
    ///
    /// Records whose date cannot be parsed are skipped and counted in
    /// [`ViewResult::excluded`]. An empty selection yields [`ViewResult::empty`].
    pub fn compute_view(&self, records: &[Transaction], filter: &ViewFilter) -> ViewResult {
        let (selected, excluded) = self.select(records, filter);
        if excluded > 0 {
            tracing::warn!(excluded, "skipped transactions with unparsable dates");
        }
        if selected.is_empty() {
            return ViewResult::empty(excluded);
        }

        ViewResult {
            recent: self.recent(&selected),
            categories: CategoryBreakdown::Totals(category_totals(&selected)),
            monthly: monthly_totals(&selected),
            cumulative: cumulative_series(&selected),
            summary: summarize(&selected),
            excluded,
        }
    }

    /// Records passing every predicate, paired with their parsed timestamp,
    /// in working-set order. Also returns how many had unparsable dates.
    pub fn select<'a>(
        &self,
        records: &'a [Transaction],
        filter: &ViewFilter,
    ) -> (Vec<(NaiveDateTime, &'a Transaction)>, usize) {
        let start = filter.start_date.map(|d| d.and_time(NaiveTime::MIN));
        let end = filter.end_date.map(end_of_day);
        let needle = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut excluded = 0;
        let mut selected = Vec::new();
        for tx in records {
            let Some(ts) = tx.timestamp() else {
                tracing::debug!(date = %tx.date, "unparsable transaction date");
                excluded += 1;
                continue;
            };
            if start.is_some_and(|s| ts < s) || end.is_some_and(|e| ts > e) {
                continue;
            }
            if !filter.category.matches(&tx.category) {
                continue;
            }
            if let Some(needle) = &needle {
                if !tx.description.to_lowercase().contains(needle.as_str()) {
                    continue;
                }
            }
            selected.push((ts, tx));
        }
        (selected, excluded)
    }

    /// Newest first; equal timestamps keep working-set order.
    fn recent(&self, selected: &[(NaiveDateTime, &Transaction)]) -> Vec<Transaction> {
        let mut rows: Vec<&(NaiveDateTime, &Transaction)> = selected.iter().collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.into_iter()
            .take(self.recent_limit)
            .map(|(_, tx)| (*tx).clone())
            .collect()
    }
}

impl Default for ViewService {
    fn default() -> Self {
        Self::new()
    }
}

fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    // 23:59:59 is always a valid time.
    day.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

fn month_start(ts: NaiveDateTime) -> NaiveDate {
    ts.date().with_day(1).unwrap_or(ts.date())
}

fn category_totals(selected: &[(NaiveDateTime, &Transaction)]) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for (_, tx) in selected {
        *totals.entry(tx.category.as_str()).or_insert(0.0) += tx.amount;
    }
    totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect()
}

fn monthly_totals(selected: &[(NaiveDateTime, &Transaction)]) -> Vec<MonthlyCategoryTotal> {
    let mut totals: BTreeMap<(NaiveDate, &str), f64> = BTreeMap::new();
    for (ts, tx) in selected {
        *totals
            .entry((month_start(*ts), tx.category.as_str()))
            .or_insert(0.0) += tx.amount;
    }
    totals
        .into_iter()
        .map(|((month, category), total)| MonthlyCategoryTotal {
            month,
            category: category.to_string(),
            total,
        })
        .collect()
}

/// Amounts sharing a timestamp are merged first, then summed in time order.
fn cumulative_series(selected: &[(NaiveDateTime, &Transaction)]) -> Vec<CumulativePoint> {
    let mut by_time: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();
    for (ts, tx) in selected {
        *by_time.entry(*ts).or_insert(0.0) += tx.amount;
    }

    let mut running = 0.0;
    by_time
        .into_iter()
        .map(|(timestamp, amount)| {
            running += amount;
            CumulativePoint {
                timestamp,
                amount,
                cumulative: running,
            }
        })
        .collect()
}

fn summarize(selected: &[(NaiveDateTime, &Transaction)]) -> ViewSummary {
    let mut summary = ViewSummary {
        count: selected.len(),
        ..ViewSummary::default()
    };
    for (_, tx) in selected {
        if tx.amount >= 0.0 {
            summary.income += tx.amount;
        } else {
            summary.expenses += tx.amount;
        }
        summary.net += tx.amount;
    }
    summary
}
