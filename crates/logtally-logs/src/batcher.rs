use logtally_store::{LogStore, StoreError};
use logtally_types::LogRecord;

/// Records per batch write
pub const BATCH_CAPACITY: usize = 1000;

/// Result of an ingestion run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Records durably written
    pub total_persisted: u64,
    /// Whether a batch write failed and stopped the run
    pub fatal: bool,
    /// Successful batch writes
    pub batches: u64,
}

/// Groups records into fixed-size batches and writes each with one
/// `insert_batch` call
///
/// The first failed write halts the batcher: pending and later records are
/// dropped and the store is not called again.
pub struct IngestBatcher<'a, S: LogStore + ?Sized> {
    store: &'a S,
    batch: Vec<LogRecord>,
    outcome: IngestOutcome,
    error: Option<StoreError>,
    progress: Option<Box<dyn FnMut(u64) + 'a>>,
}

impl<'a, S: LogStore + ?Sized> IngestBatcher<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            batch: Vec::with_capacity(BATCH_CAPACITY),
            outcome: IngestOutcome::default(),
            error: None,
            progress: None,
        }
    }

    /// Call `progress` with the running total after every successful flush
    pub fn with_progress(mut self, progress: impl FnMut(u64) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Whether a batch write has failed
    pub fn is_halted(&self) -> bool {
        self.outcome.fatal
    }

    /// Error from the failed batch write, if any
    pub fn error(&self) -> Option<&StoreError> {
        self.error.as_ref()
    }

    /// Add a record, flushing when the batch is full
    pub fn push(&mut self, record: LogRecord) {
        if self.outcome.fatal {
            return;
        }
        self.batch.push(record);
        if self.batch.len() >= BATCH_CAPACITY {
            self.flush();
        }
    }

    /// Flush the final partial batch and report the run
    pub fn finish(mut self) -> (IngestOutcome, Option<StoreError>) {
        if !self.batch.is_empty() {
            self.flush();
        }
        (self.outcome, self.error)
    }

    fn flush(&mut self) {
        if self.outcome.fatal {
            self.batch.clear();
            return;
        }

        match self.store.insert_batch(&self.batch) {
            Ok(_) => {
                self.outcome.total_persisted += self.batch.len() as u64;
                self.outcome.batches += 1;
                tracing::info!(
                    total = self.outcome.total_persisted,
                    "Processed {} log entries",
                    self.outcome.total_persisted
                );
                if let Some(progress) = self.progress.as_mut() {
                    progress(self.outcome.total_persisted);
                }
            }
            Err(e) => {
                tracing::error!(
                    batch = self.outcome.batches + 1,
                    size = self.batch.len(),
                    persisted = self.outcome.total_persisted,
                    error = %e,
                    "Error inserting batch, stopping"
                );
                self.outcome.fatal = true;
                self.error = Some(e);
            }
        }
        self.batch.clear();
    }
}

/// Feed every record through a fresh batcher
///
/// Consumption of `records` stops as soon as a batch write fails.
pub fn ingest<S, I>(store: &S, records: I) -> (IngestOutcome, Option<StoreError>)
where
    S: LogStore + ?Sized,
    I: IntoIterator<Item = LogRecord>,
{
    let mut batcher = IngestBatcher::new(store);
    for record in records {
        batcher.push(record);
        if batcher.is_halted() {
            break;
        }
    }
    batcher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use logtally_store::{MemoryStore, RecordFilter, StoredRecord};
    use std::cell::RefCell;

    fn records(n: usize) -> Vec<LogRecord> {
        let ts = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        (0..n)
            .map(|i| {
                LogRecord::new(
                    "10.0.0.1".to_string(),
                    ts,
                    "GET".to_string(),
                    format!("/item/{i}"),
                    200,
                    i as u64,
                )
            })
            .collect()
    }

    fn stored(store: &MemoryStore) -> Vec<StoredRecord> {
        let mut out = Vec::new();
        store
            .scan(&RecordFilter::all(), &mut |r| out.push(r.clone()))
            .unwrap();
        out
    }

    #[test]
    fn test_batches_in_order() {
        let store = MemoryStore::new();
        let input = records(2500);

        let (outcome, error) = ingest(&store, input.clone());
        assert!(error.is_none());
        assert_eq!(
            outcome,
            IngestOutcome {
                total_persisted: 2500,
                fatal: false,
                batches: 3,
            }
        );
        // ceil(2500 / 1000) writes
        assert_eq!(store.batch_calls(), 3);

        let persisted: Vec<LogRecord> = stored(&store).into_iter().map(|s| s.record).collect();
        assert_eq!(persisted, input);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let store = MemoryStore::new();
        let (outcome, _) = ingest(&store, records(2000));
        assert_eq!(outcome.total_persisted, 2000);
        assert_eq!(store.batch_calls(), 2);
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let store = MemoryStore::new();
        let (outcome, error) = ingest(&store, Vec::new());
        assert_eq!(outcome, IngestOutcome::default());
        assert!(error.is_none());
        assert_eq!(store.batch_calls(), 0);
    }

    #[test]
    fn test_failure_halts_run() {
        let store = MemoryStore::new();
        store.fail_on_batch(2);

        let (outcome, error) = ingest(&store, records(3500));
        assert!(outcome.fatal);
        assert_eq!(outcome.total_persisted, 1000);
        assert!(error.is_some());
        // No call after the failed second batch
        assert_eq!(store.batch_calls(), 2);
        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn test_failure_on_final_partial_batch() {
        let store = MemoryStore::new();
        store.fail_on_batch(3);

        let (outcome, _) = ingest(&store, records(2001));
        assert!(outcome.fatal);
        assert_eq!(outcome.total_persisted, 2000);
        assert_eq!(store.batch_calls(), 3);
    }

    #[test]
    fn test_push_after_halt_is_dropped() {
        let store = MemoryStore::new();
        store.fail_on_batch(1);

        let mut batcher = IngestBatcher::new(&store);
        for record in records(1500) {
            batcher.push(record);
        }
        assert!(batcher.is_halted());
        assert!(batcher.error().is_some());

        let (outcome, _) = batcher.finish();
        assert_eq!(outcome.total_persisted, 0);
        assert_eq!(store.batch_calls(), 1);
    }

    #[test]
    fn test_progress_reports_running_total() {
        let store = MemoryStore::new();
        let seen = RefCell::new(Vec::new());

        let mut batcher = IngestBatcher::new(&store).with_progress(|n| seen.borrow_mut().push(n));
        for record in records(2100) {
            batcher.push(record);
        }
        batcher.finish();

        assert_eq!(*seen.borrow(), vec![1000, 2000, 2100]);
    }
}
