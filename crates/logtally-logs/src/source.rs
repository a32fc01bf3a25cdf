use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use logtally_types::LogRecord;

use crate::parser::{LogParser, ParseFailure};

/// Failures reported in full before switching to counting only
pub const VERBOSE_FAILURE_LIMIT: u64 = 10;

/// Longest line prefix quoted in failure logs
const EXCERPT_CHARS: usize = 100;

/// Per-run parse accounting
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines that produced a record
    pub parsed: u64,
    /// Lines that did not match the format
    pub malformed: u64,
    /// Lines that matched but had an unusable field
    pub field_invalid: u64,
    /// Empty or whitespace-only lines
    pub blank: u64,
    /// Read error that ended the run early, if any
    pub read_error: Option<String>,
}

impl ParseStats {
    /// Total parse failures of either kind
    pub fn errors(&self) -> u64 {
        self.malformed + self.field_invalid
    }

    fn record_failure(&mut self, failure: &ParseFailure) {
        match failure {
            ParseFailure::Malformed => self.malformed += 1,
            ParseFailure::FieldInvalid { .. } => self.field_invalid += 1,
        }
    }
}

/// Iterator of records parsed from a line-oriented source
///
/// Lines that fail to parse are skipped and counted; see [`LineSource::stats`].
pub struct LineSource<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: u64,
    stats: ParseStats,
    finished: bool,
}

impl LineSource<BufReader<File>> {
    /// Open a log file. Missing or unreadable files fail here, before any
    /// line is parsed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
            stats: ParseStats::default(),
            finished: false,
        }
    }

    /// Accounting for the lines consumed so far
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Consume the source and return its final accounting
    pub fn into_stats(self) -> ParseStats {
        self.stats
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        tracing::info!(
            parsed = self.stats.parsed,
            errors = self.stats.errors(),
            "Parsing complete"
        );
    }
}

impl<R: Read> LineSource<BufReader<R>> {
    /// Wrap any reader
    pub fn from_reader(reader: R) -> Self {
        Self::new(BufReader::new(reader))
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        if self.finished {
            return None;
        }

        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.finish();
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(
                        line = self.line_number + 1,
                        error = %e,
                        "Error reading log source"
                    );
                    self.stats.read_error = Some(e.to_string());
                    self.finish();
                    return None;
                }
            }
            self.line_number += 1;

            let line = String::from_utf8_lossy(&self.buf);
            let line = line.trim();
            if line.is_empty() {
                self.stats.blank += 1;
                continue;
            }

            match LogParser::parse(line) {
                Ok(record) => {
                    self.stats.parsed += 1;
                    return Some(record);
                }
                Err(failure) => {
                    self.stats.record_failure(&failure);
                    if self.stats.errors() <= VERBOSE_FAILURE_LIMIT {
                        let excerpt: String = line.chars().take(EXCERPT_CHARS).collect();
                        tracing::warn!(
                            line = self.line_number,
                            reason = failure.reason(),
                            detail = %failure,
                            "Failed to parse line: {}",
                            excerpt
                        );
                    }
                }
            }
        }
    }
}
