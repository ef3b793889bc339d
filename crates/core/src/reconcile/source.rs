use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::transaction::Transaction;
use crate::storage::manager::StorageManager;

/// Supplies the authoritative copy of the transaction collection.
///
/// Reconciliation only asks "what does the store hold now?". Polling the file
/// is one answer; a file watcher or a checksum-indexed store can implement
/// this trait instead without touching the view engine.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Human-readable name of this source (for logs).
    fn name(&self) -> &str;

    /// Fetch the full collection in stored order.
    async fn fetch_snapshot(&self) -> Result<Vec<Transaction>, CoreError>;
}

/// Re-reads the durable store on every poll.
#[derive(Debug, Clone)]
pub struct DiskSnapshotSource {
    storage: StorageManager,
}

impl DiskSnapshotSource {
    pub fn new(storage: StorageManager) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl SnapshotSource for DiskSnapshotSource {
    fn name(&self) -> &str {
        "disk"
    }

    async fn fetch_snapshot(&self) -> Result<Vec<Transaction>, CoreError> {
        self.storage.load()
    }
}
