use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::{interval, MissedTickBehavior};

use crate::ExpenseTracker;

use super::RefreshOutcome;

/// Counters for a finished [`run_periodic`] loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    pub passes: usize,
    pub replaced: usize,
    pub failed: usize,
}

/// Refresh `tracker` every `period` until `shutdown` turns true or its sender
/// is dropped.
///
/// The first pass happens one full period after start. Each pass holds the
/// tracker lock for its whole duration, so it never overlaps a user mutation.
/// `on_outcome` sees every pass, including no-ops.
pub async fn run_periodic<F>(
    tracker: Arc<Mutex<ExpenseTracker>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut on_outcome: F,
) -> ScheduleStats
where
    F: FnMut(&RefreshOutcome) + Send,
{
    let mut stats = ScheduleStats::default();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Consume the immediate first tick.
    ticker.tick().await;

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let outcome = {
            let mut guard = tracker.lock().await;
            guard.refresh().await
        };
        stats.passes += 1;
        match &outcome {
            RefreshOutcome::Replaced { .. } => stats.replaced += 1,
            RefreshOutcome::Failed(_) => stats.failed += 1,
            RefreshOutcome::Unchanged => {}
        }
        on_outcome(&outcome);
    }

    tracing::debug!(?stats, "periodic reconciliation stopped");
    stats
}
