//! Append-only JSON-lines record file
//!
//! Each line holds one [`StoredRecord`]. A batch is encoded into a single
//! buffer and appended with one write followed by `sync_data`; if anything
//! fails before the batch is committed the file is truncated back to its
//! previous length, so a batch is either fully present or absent.
//!
//! Appends hold an exclusive advisory lock on the file and scans a shared
//! one, so several handles (or processes) can use the same file. Each append
//! re-reads the tail under its lock before assigning ids.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;

use logtally_types::{LogRecord, StoredRecord};

use crate::{LogStore, RecordFilter, StoreError};

/// File-backed record store
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,

    /// Last known end of the committed records. Only trusted while the
    /// file lock is held; other writers may have appended since.
    tail: Mutex<Tail>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tail {
    len: u64,
    next_id: u64,
}

impl Tail {
    /// Catch up with whatever other writers committed and cut off a torn
    /// trailing line. The caller must hold the exclusive file lock.
    fn sync(&mut self, file: &File, path: &Path) -> Result<(), StoreError> {
        let file_len = file.metadata()?.len();
        if file_len == self.len {
            return Ok(());
        }

        // A shorter file was rewritten behind our back: count from scratch
        let base = if file_len > self.len { *self } else { Tail::default() };
        let (bytes, records) = complete_lines(file, base.len)?;
        let valid_len = base.len + bytes;

        if valid_len < file_len {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = file_len - valid_len,
                "Truncating incomplete trailing record"
            );
            file.set_len(valid_len)?;
            file.sync_data()?;
        }

        *self = Tail {
            len: valid_len,
            next_id: base.next_id + records,
        };
        Ok(())
    }
}

/// Borrowed form of [`StoredRecord`] for encoding without cloning
#[derive(Serialize)]
struct StoredRow<'a> {
    id: u64,
    #[serde(flatten)]
    record: &'a LogRecord,
}

impl FileStore {
    /// Open or create the record file at `path`
    ///
    /// An incomplete trailing line (left by an interrupted write) is cut off.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;
        FileExt::lock_exclusive(&file)?;

        let mut tail = Tail::default();
        tail.sync(&file, &path)?;
        tracing::debug!(path = %path.display(), records = tail.next_id, "Opened record file");

        Ok(Self {
            path,
            tail: Mutex::new(tail),
        })
    }

    /// Location of the record file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock the file for writing and bring the tail up to date
    ///
    /// The returned guard rolls back to the locked length unless committed.
    /// The file lock is released when the guard's handle closes.
    fn begin_append(&self) -> Result<(AppendGuard, MutexGuard<'_, Tail>), StoreError> {
        let mut tail = self.tail.lock();
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        FileExt::lock_exclusive(&file)?;
        tail.sync(&file, &self.path)?;
        Ok((AppendGuard::begin(file, tail.len), tail))
    }

    /// Open the file for reading under a shared lock
    fn open_shared(&self) -> Result<File, StoreError> {
        let file = File::open(&self.path)?;
        FileExt::lock_shared(&file)?;
        Ok(file)
    }
}

impl LogStore for FileStore {
    fn insert_batch(&self, records: &[LogRecord]) -> Result<u64, StoreError> {
        let (mut append, mut tail) = self.begin_append()?;
        let first_id = tail.next_id;
        if records.is_empty() {
            return Ok(first_id);
        }

        let mut buf = Vec::with_capacity(records.len() * 160);
        for (i, record) in records.iter().enumerate() {
            let row = StoredRow {
                id: first_id + i as u64,
                record,
            };
            serde_json::to_writer(&mut buf, &row).map_err(StoreError::Serialize)?;
            buf.push(b'\n');
        }

        append.write(&buf)?;
        append.commit();

        tail.len += buf.len() as u64;
        tail.next_id += records.len() as u64;
        Ok(first_id)
    }

    fn scan(
        &self,
        filter: &RecordFilter,
        visit: &mut dyn FnMut(&StoredRecord),
    ) -> Result<(), StoreError> {
        let file = self.open_shared()?;
        let mut reader = BufReader::new(&file);
        let mut line = Vec::new();
        let mut line_number = 0u64;

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            // Torn tail from a writer that died mid-append
            if line.last() != Some(&b'\n') {
                break;
            }
            line_number += 1;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let stored: StoredRecord = serde_json::from_slice(&line).map_err(|source| {
                StoreError::Corrupt {
                    line: line_number,
                    source,
                }
            })?;
            if filter.matches(&stored.record) {
                visit(&stored);
            }
        }

        Ok(())
    }

    fn count(&self) -> Result<u64, StoreError> {
        let file = self.open_shared()?;
        let (_, records) = complete_lines(&file, 0)?;
        Ok(records)
    }
}

/// An in-progress append that is rolled back unless committed
struct AppendGuard {
    file: File,
    start_len: u64,
    committed: bool,
}

impl AppendGuard {
    fn begin(file: File, start_len: u64) -> Self {
        Self {
            file,
            start_len,
            committed: false,
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StoreError> {
        self.file.write_all(buf)?;
        self.file.sync_data()?;
        Ok(())
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for AppendGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let restored = self
            .file
            .set_len(self.start_len)
            .and_then(|_| self.file.sync_data());
        if let Err(e) = restored {
            tracing::error!(error = %e, "Failed to roll back partial batch");
        }
    }
}

/// Bytes of complete lines from `from` onwards, and how many of those lines
/// hold a record
fn complete_lines(file: &File, from: u64) -> Result<(u64, u64), StoreError> {
    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(from))?;
    let mut line = Vec::new();
    let mut bytes = 0u64;
    let mut records = 0u64;

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 || line.last() != Some(&b'\n') {
            break;
        }
        bytes += n as u64;
        if !line.iter().all(u8::is_ascii_whitespace) {
            records += 1;
        }
    }

    Ok((bytes, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::tempdir;

    fn record(ip: &str, status: u16, size: u64) -> LogRecord {
        LogRecord::new(
            ip.to_string(),
            DateTime::parse_from_rfc3339("2024-01-01T10:00:00+02:00").unwrap(),
            "GET".to_string(),
            "/index.html?q=a b".to_string(),
            status,
            size,
        )
    }

    fn collect(store: &FileStore, filter: &RecordFilter) -> Vec<StoredRecord> {
        let mut out = Vec::new();
        store.scan(filter, &mut |r| out.push(r.clone())).unwrap();
        out
    }

    #[test]
    fn test_insert_and_scan_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("logs.jsonl")).unwrap();

        assert_eq!(store.insert_batch(&[record("a", 200, 1), record("b", 404, 0)]).unwrap(), 0);
        assert_eq!(store.insert_batch(&[record("c", 500, 3)]).unwrap(), 2);

        let all = collect(&store, &RecordFilter::all());
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].record, record("a", 200, 1));
        assert_eq!(all[2].id, 2);
        // Offset survives storage
        assert_eq!(all[0].record.timestamp().offset().local_minus_utc(), 7200);

        let errors = collect(&store, &RecordFilter::all().min_status(400));
        assert_eq!(errors.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_reopen_continues_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("logs.jsonl");
        {
            let store = FileStore::open(&path).unwrap();
            store.insert_batch(&[record("a", 200, 1), record("b", 200, 1)]).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.insert_batch(&[record("c", 200, 1)]).unwrap(), 2);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_open_truncates_torn_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.jsonl");
        {
            let store = FileStore::open(&path).unwrap();
            store.insert_batch(&[record("a", 200, 1)]).unwrap();
        }
        let clean_len = fs::metadata(&path).unwrap().len();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"id\":1,\"ip_addr").unwrap();
        drop(file);

        let store = FileStore::open(&path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), clean_len);
        assert_eq!(store.insert_batch(&[record("b", 200, 1)]).unwrap(), 1);
        assert_eq!(collect(&store, &RecordFilter::all()).len(), 2);
    }

    #[test]
    fn test_uncommitted_append_is_rolled_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.jsonl");
        let store = FileStore::open(&path).unwrap();
        store.insert_batch(&[record("a", 200, 1)]).unwrap();
        let before = fs::metadata(&path).unwrap().len();

        {
            let (mut append, _tail) = store.begin_append().unwrap();
            append.write(b"{\"id\":1}\n{\"id\":2}\n").unwrap();
            // dropped without commit
        }

        assert_eq!(fs::metadata(&path).unwrap().len(), before);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.insert_batch(&[record("b", 200, 1)]).unwrap(), 1);
    }

    #[test]
    fn test_two_handles_assign_distinct_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.jsonl");
        let first = FileStore::open(&path).unwrap();
        let second = FileStore::open(&path).unwrap();

        assert_eq!(first.insert_batch(&[record("a", 200, 1), record("b", 200, 1)]).unwrap(), 0);
        assert_eq!(second.insert_batch(&[record("c", 200, 1), record("d", 200, 1)]).unwrap(), 2);
        assert_eq!(first.insert_batch(&[record("e", 200, 1)]).unwrap(), 4);

        let ids: Vec<u64> = collect(&second, &RecordFilter::all())
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(first.count().unwrap(), 5);
    }

    #[test]
    fn test_rollback_keeps_batches_from_other_handles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.jsonl");
        let first = FileStore::open(&path).unwrap();
        let second = FileStore::open(&path).unwrap();

        // Committed after `first` last looked at the file
        second.insert_batch(&[record("a", 200, 1), record("b", 200, 1)]).unwrap();

        {
            let (mut append, tail) = first.begin_append().unwrap();
            assert_eq!(tail.next_id, 2);
            append.write(b"{\"id\":2,\"ip_addr").unwrap();
            // dropped without commit
        }

        assert_eq!(second.count().unwrap(), 2);
        assert_eq!(collect(&first, &RecordFilter::all()).len(), 2);
        assert_eq!(first.insert_batch(&[record("c", 200, 1)]).unwrap(), 2);
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.jsonl");
        fs::write(&path, "not json\n").unwrap();

        let store = FileStore::open(&path).unwrap();
        let err = store.scan(&RecordFilter::all(), &mut |_| {}).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 1, .. }));
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.jsonl");
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.insert_batch(&[]).unwrap(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }
}
