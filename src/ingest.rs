use std::io::Write;
use std::path::Path;

use anyhow::Context;

use logtally_logs::{IngestBatcher, IngestOutcome, LineSource, ParseStats};
use logtally_store::{LogStore, StoreError};

/// Result of one `logtally ingest` run
#[derive(Debug)]
pub struct IngestSummary {
    pub outcome: IngestOutcome,
    pub stats: ParseStats,
    pub error: Option<StoreError>,
}

impl IngestSummary {
    /// Every parsed record was stored and the file was read to the end
    pub fn is_success(&self) -> bool {
        !self.outcome.fatal && self.stats.read_error.is_none()
    }
}

/// Parse `path` and store its records in batches, printing a running count
///
/// Fails before any parsing when the file cannot be opened.
pub fn run<S, W>(store: &S, path: &Path, out: &mut W) -> anyhow::Result<IngestSummary>
where
    S: LogStore + ?Sized,
    W: Write,
{
    let mut source = LineSource::open(path)
        .with_context(|| format!("Cannot open log file {}", path.display()))?;

    writeln!(out, "Processing log file: {}", path.display())?;
    tracing::info!(path = %path.display(), "Starting ingestion");

    let (outcome, error) = {
        let mut progress_failed = false;
        let mut batcher = IngestBatcher::new(store).with_progress(|total| {
            // Progress is informational; keep storing records if it can't be shown
            if let Err(e) = writeln!(out, "Processed {} log entries...", total) {
                if !progress_failed {
                    tracing::warn!(error = %e, total, "Failed to write progress");
                    progress_failed = true;
                }
            }
        });
        for record in source.by_ref() {
            batcher.push(record);
            if batcher.is_halted() {
                break;
            }
        }
        batcher.finish()
    };
    let stats = source.into_stats();

    if outcome.fatal {
        writeln!(out, "Error inserting batch. Stopping.")?;
    } else if let Some(read_error) = &stats.read_error {
        writeln!(out, "Error reading log file: {}", read_error)?;
    } else {
        writeln!(
            out,
            "Successfully processed {} log entries.",
            outcome.total_persisted
        )?;
    }
    if stats.errors() > 0 {
        writeln!(out, "Skipped {} lines that could not be parsed.", stats.errors())?;
    }

    Ok(IngestSummary {
        outcome,
        stats,
        error,
    })
}
