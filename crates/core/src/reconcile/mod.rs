//! Periodic re-synchronisation of the working set from the durable store.
//!
//! The whole ordered collection is compared for equality; when it differs the
//! store wins and replaces memory. This is last-writer-wins for the entire
//! collection: an in-memory addition that raced with an external edit of the
//! file can be discarded. Equality over the full collection is linear in its
//! size, which is fine for a personal ledger but not for large stores.

pub mod schedule;
pub mod source;

use crate::errors::CoreError;
use crate::models::transaction::Transaction;

use source::SnapshotSource;

/// Result of one comparison between memory and the authoritative source.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Memory already matches; nothing should be recomputed downstream.
    Unchanged,
    /// The source differs and its collection should replace memory.
    Diverged(Vec<Transaction>),
}

/// What a refresh did to the working set. Failures are reported here rather
/// than raised, since refreshes run without a user waiting on them.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Unchanged,
    Replaced { previous: usize, current: usize },
    Failed(String),
}

impl RefreshOutcome {
    /// True when downstream views need recomputing.
    pub fn is_update(&self) -> bool {
        matches!(self, RefreshOutcome::Replaced { .. })
    }
}

/// Compares the working set against a [`SnapshotSource`].
pub struct Reconciler {
    source: Box<dyn SnapshotSource>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("source", &self.source.name())
            .finish()
    }
}

impl Reconciler {
    pub fn new(source: Box<dyn SnapshotSource>) -> Self {
        Self { source }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub async fn reconcile(&self, working: &[Transaction]) -> Result<Reconciliation, CoreError> {
        let snapshot = self.source.fetch_snapshot().await?;
        if snapshot.as_slice() == working {
            Ok(Reconciliation::Unchanged)
        } else {
            Ok(Reconciliation::Diverged(snapshot))
        }
    }
}
