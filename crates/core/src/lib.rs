pub mod errors;
pub mod export;
pub mod ingestion;
pub mod models;
pub mod reconcile;
pub mod services;
pub mod storage;

use chrono::NaiveDateTime;
use export::{ExportFile, ExportFormat};
use models::{
    report::{ExportReport, MutationReport, MutationStatus},
    settings::Settings,
    transaction::{Transaction, TransactionDraft},
    view::{ViewFilter, ViewResult},
};
use reconcile::{
    source::{DiskSnapshotSource, SnapshotSource},
    Reconciler, Reconciliation, RefreshOutcome,
};
use services::view_service::ViewService;
use std::path::Path;
use storage::manager::StorageManager;

use errors::CoreError;

/// Main entry point for the Expense Tracker core library.
///
/// Owns the working set. Every read and mutation goes through this value;
/// callers get snapshots (`&[Transaction]`) and submit mutations through
/// `add`, `import` and `refresh`. Mutations are written through to the
/// durable store before they become visible in memory.
#[must_use]
pub struct ExpenseTracker {
    settings: Settings,
    storage: StorageManager,
    transactions: Vec<Transaction>,
    view_service: ViewService,
    reconciler: Reconciler,
}

impl std::fmt::Debug for ExpenseTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpenseTracker")
            .field("store", &self.storage.path())
            .field("transactions", &self.transactions.len())
            .field("reconciler", &self.reconciler)
            .finish()
    }
}

impl ExpenseTracker {
    /// Open the store named in `settings`, loading whatever it holds.
    ///
    /// A missing store opens empty; a corrupt one is quarantined and opens empty.
    pub fn open(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let storage = StorageManager::new(settings.data_file.clone())
            .with_quarantine_suffix(settings.quarantine_suffix.clone());
        let transactions = storage.load()?;
        tracing::info!(
            path = %storage.path().display(),
            count = transactions.len(),
            "opened transaction store"
        );

        let reconciler = Reconciler::new(Box::new(DiskSnapshotSource::new(storage.clone())));
        let view_service = ViewService::with_recent_limit(settings.recent_limit);

        Ok(Self {
            settings,
            storage,
            transactions,
            view_service,
            reconciler,
        })
    }

    /// Open a store at `path` with default settings otherwise.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        Self::open(Settings::default().with_data_file(path.as_ref()))
    }

    /// Replace the source consulted by [`refresh`](Self::refresh).
    pub fn with_snapshot_source(mut self, source: Box<dyn SnapshotSource>) -> Self {
        self.reconciler = Reconciler::new(source);
        self
    }

    // ── Working Set ─────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn storage_path(&self) -> &Path {
        self.storage.path()
    }

    /// Snapshot of the working set in insertion order.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Validate and append one transaction, stamping defaults with the current time.
    pub fn try_add(&mut self, draft: TransactionDraft) -> Result<&Transaction, CoreError> {
        self.try_add_at(draft, now())
    }

    /// Like [`try_add`](Self::try_add) with an explicit clock reading.
    pub fn try_add_at(
        &mut self,
        draft: TransactionDraft,
        now: NaiveDateTime,
    ) -> Result<&Transaction, CoreError> {
        let tx = draft.validate(now)?;
        tracing::info!(amount = tx.amount, category = %tx.category, "adding transaction");
        let start = self.commit(vec![tx])?;
        Ok(&self.transactions[start])
    }

    /// User-facing add: never fails, reports the outcome as a status message.
    pub fn add(&mut self, draft: TransactionDraft) -> MutationReport<'_> {
        let status = match self.try_add(draft) {
            Ok(_) => MutationStatus::Added,
            Err(e) => {
                tracing::warn!("add rejected: {e}");
                MutationStatus::rejected_add(&e)
            }
        };
        self.report(status)
    }

    /// Parse an uploaded file and append the whole batch, or nothing.
    /// Returns the number of transactions imported.
    pub fn try_import(&mut self, bytes: &[u8], filename: &str) -> Result<usize, CoreError> {
        self.try_import_at(bytes, filename, now())
    }

    /// Like [`try_import`](Self::try_import) with an explicit clock reading.
    pub fn try_import_at(
        &mut self,
        bytes: &[u8],
        filename: &str,
        now: NaiveDateTime,
    ) -> Result<usize, CoreError> {
        let batch = ingestion::parse(bytes, filename, now)?;
        let count = batch.len();
        self.commit(batch)?;
        tracing::info!(filename, count, "imported transactions");
        Ok(count)
    }

    /// User-facing import: never fails, reports the outcome as a status message.
    pub fn import(&mut self, bytes: &[u8], filename: &str) -> MutationReport<'_> {
        let status = match self.try_import(bytes, filename) {
            Ok(count) => MutationStatus::Imported(count),
            Err(e) => {
                tracing::warn!(filename, "import rejected: {e}");
                MutationStatus::rejected_import(&e)
            }
        };
        self.report(status)
    }

    // ── Reconciliation ──────────────────────────────────────────────

    /// Compare memory with the snapshot source and adopt the source on divergence.
    ///
    /// Failures are logged and reported as [`RefreshOutcome::Failed`]; the
    /// working set is left as it was.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        match self.reconciler.reconcile(&self.transactions).await {
            Ok(Reconciliation::Unchanged) => {
                tracing::debug!(source = self.reconciler.source_name(), "working set is current");
                RefreshOutcome::Unchanged
            }
            Ok(Reconciliation::Diverged(snapshot)) => {
                let previous = self.transactions.len();
                let current = snapshot.len();
                tracing::info!(
                    source = self.reconciler.source_name(),
                    previous,
                    current,
                    "store changed externally, replacing working set"
                );
                self.transactions = snapshot;
                RefreshOutcome::Replaced { previous, current }
            }
            Err(e) => {
                tracing::error!(source = self.reconciler.source_name(), "refresh failed: {e}");
                RefreshOutcome::Failed(e.to_string())
            }
        }
    }

    // ── Views ───────────────────────────────────────────────────────

    /// Filter the working set and compute all dashboard aggregates.
    #[must_use]
    pub fn view(&self, filter: &ViewFilter) -> ViewResult {
        self.view_service.compute_view(&self.transactions, filter)
    }

    // ── Export ──────────────────────────────────────────────────────

    /// Render the working set, or the subset passing `filter`.
    pub fn try_export(
        &self,
        format: ExportFormat,
        filter: Option<&ViewFilter>,
    ) -> Result<ExportFile, CoreError> {
        let file = match filter {
            None => export::export(&self.transactions, format)?,
            Some(filter) => {
                let (selected, _) = self.view_service.select(&self.transactions, filter);
                let subset: Vec<Transaction> =
                    selected.into_iter().map(|(_, tx)| tx.clone()).collect();
                export::export(&subset, format)?
            }
        };
        tracing::info!(file = %file.file_name, bytes = file.bytes.len(), "exported transactions");
        Ok(file)
    }

    /// User-facing export: never fails, reports the outcome as a status message.
    pub fn export(&self, format: ExportFormat, filter: Option<&ViewFilter>) -> ExportReport {
        match self.try_export(format, filter) {
            Ok(file) => ExportReport {
                message: format!("Exported {} transactions to {}.", self.export_count(filter), file.file_name),
                file: Some(file),
            },
            Err(e) => {
                tracing::warn!("export failed: {e}");
                ExportReport {
                    file: None,
                    message: format!("{e}."),
                }
            }
        }
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Save `additions` appended to the working set, then adopt the result.
    /// Returns the index of the first added record. On a failed save memory
    /// is left untouched.
    fn commit(&mut self, additions: Vec<Transaction>) -> Result<usize, CoreError> {
        let start = self.transactions.len();
        let mut next = Vec::with_capacity(self.transactions.len() + additions.len());
        next.extend_from_slice(&self.transactions);
        next.extend(additions);

        if let Err(e) = self.storage.save(&next) {
            tracing::error!("write-through failed, working set unchanged: {e}");
            return Err(e);
        }
        self.transactions = next;
        Ok(start)
    }

    fn report(&self, status: MutationStatus) -> MutationReport<'_> {
        MutationReport {
            transactions: &self.transactions,
            status,
        }
    }

    fn export_count(&self, filter: Option<&ViewFilter>) -> usize {
        match filter {
            None => self.transactions.len(),
            Some(filter) => self.view_service.select(&self.transactions, filter).0.len(),
        }
    }
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
