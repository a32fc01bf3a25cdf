//! Log processing for logtally
//!
//! This crate provides access log parsing, line-level failure accounting and
//! batched ingestion into a [`logtally_store::LogStore`].

mod batcher;
mod parser;
mod source;

pub use batcher::{BATCH_CAPACITY, IngestBatcher, IngestOutcome, ingest};
pub use parser::{Field, LogParser, ParseFailure};
pub use source::{LineSource, ParseStats, VERBOSE_FAILURE_LIMIT};

// Re-export types used in our public API
pub use logtally_types::LogRecord;
