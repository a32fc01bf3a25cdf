use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use logtally_types::{LogRecord, StoredRecord};

use crate::{LogStore, RecordFilter, StoreError};

/// Thread-safe in-memory record store
///
/// Clones share the same underlying records.
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Internal storage
    records: Arc<RwLock<Vec<StoredRecord>>>,

    /// Number of `insert_batch` calls seen, failed ones included
    batch_calls: Arc<AtomicU64>,

    /// 1-based batch call that should be rejected (0 = never)
    fail_on_batch: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `batch`-th call to `insert_batch` (1-based) and every call
    /// after it, leaving the stored records untouched
    pub fn fail_on_batch(&self, batch: u64) {
        self.fail_on_batch.store(batch, Ordering::SeqCst);
    }

    /// Number of `insert_batch` calls received so far
    pub fn batch_calls(&self) -> u64 {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Get all stored records (cloned)
    pub fn records(&self) -> Vec<StoredRecord> {
        self.records.read().clone()
    }

    /// Total record count
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl LogStore for MemoryStore {
    fn insert_batch(&self, records: &[LogRecord]) -> Result<u64, StoreError> {
        let call = self.batch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail_from = self.fail_on_batch.load(Ordering::SeqCst);
        if fail_from != 0 && call >= fail_from {
            return Err(StoreError::Injected { batch: call });
        }

        let mut stored = self.records.write();
        let first_id = stored.len() as u64;
        stored.extend(
            records
                .iter()
                .enumerate()
                .map(|(i, r)| StoredRecord::new(first_id + i as u64, r.clone())),
        );
        Ok(first_id)
    }

    fn scan(
        &self,
        filter: &RecordFilter,
        visit: &mut dyn FnMut(&StoredRecord),
    ) -> Result<(), StoreError> {
        let stored = self.records.read();
        for entry in stored.iter().filter(|e| filter.matches(&e.record)) {
            visit(entry);
        }
        Ok(())
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.len() as u64)
    }
}
