//! Record storage for logtally
//!
//! This crate provides the storage collaborator used by ingestion and
//! analytics: an append-only record collection with atomic batch inserts and
//! filtered scans.

mod error;
mod file;
mod filter;
mod memory;

use std::sync::Arc;

pub use error::StoreError;
pub use file::FileStore;
pub use filter::RecordFilter;
pub use memory::MemoryStore;

// Re-export types used in our public API
pub use logtally_types::{LogRecord, StoredRecord};

/// Append-only record storage
///
/// Implementations acquire whatever handle or lock they need inside each call
/// and release it before returning, on success and on failure alike.
pub trait LogStore: Send + Sync {
    /// Persist `records` as one atomic unit: either every record is stored or
    /// none is. Returns the id assigned to the first record.
    fn insert_batch(&self, records: &[LogRecord]) -> Result<u64, StoreError>;

    /// Visit every stored record matching `filter`, in insertion order
    fn scan(
        &self,
        filter: &RecordFilter,
        visit: &mut dyn FnMut(&StoredRecord),
    ) -> Result<(), StoreError>;

    /// Number of stored records
    fn count(&self) -> Result<u64, StoreError> {
        let mut total = 0u64;
        self.scan(&RecordFilter::all(), &mut |_| total += 1)?;
        Ok(total)
    }
}

impl<T: LogStore + ?Sized> LogStore for &T {
    fn insert_batch(&self, records: &[LogRecord]) -> Result<u64, StoreError> {
        (**self).insert_batch(records)
    }

    fn scan(
        &self,
        filter: &RecordFilter,
        visit: &mut dyn FnMut(&StoredRecord),
    ) -> Result<(), StoreError> {
        (**self).scan(filter, visit)
    }

    fn count(&self) -> Result<u64, StoreError> {
        (**self).count()
    }
}

impl<T: LogStore + ?Sized> LogStore for Arc<T> {
    fn insert_batch(&self, records: &[LogRecord]) -> Result<u64, StoreError> {
        (**self).insert_batch(records)
    }

    fn scan(
        &self,
        filter: &RecordFilter,
        visit: &mut dyn FnMut(&StoredRecord),
    ) -> Result<(), StoreError> {
        (**self).scan(filter, visit)
    }

    fn count(&self) -> Result<u64, StoreError> {
        (**self).count()
    }
}
