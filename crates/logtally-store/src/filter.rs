use chrono::NaiveDateTime;

use logtally_types::LogRecord;

/// Predicate applied by [`crate::LogStore::scan`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Lowest status code to include
    min_status: Option<u16>,

    /// Earliest local wall-clock time to include
    since: Option<NaiveDateTime>,
}

impl RecordFilter {
    /// Filter that matches every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Only records with `status_code >= status`
    pub fn min_status(mut self, status: u16) -> Self {
        self.min_status = Some(status);
        self
    }

    /// Only records logged at or after `since`, compared against the time as
    /// written in the log line (its own offset, not UTC)
    pub fn since(mut self, since: NaiveDateTime) -> Self {
        self.since = Some(since);
        self
    }

    /// Check if a record matches this filter
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(min) = self.min_status {
            if record.status_code() < min {
                return false;
            }
        }

        if let Some(since) = self.since {
            if record.timestamp().naive_local() < since {
                return false;
            }
        }

        true
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.min_status.is_none() && self.since.is_none()
    }
}
