use std::fmt;
use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use thiserror::Error;

use logtally_types::LogRecord;

/// `IP - - [TIMESTAMP] "METHOD RESOURCE" STATUS SIZE`, anchored at the start
/// only so trailing referer/user-agent fields are tolerated
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<ip>\d+\.\d+\.\d+\.\d+) - - \[(?P<timestamp>[^\]]+)\] "(?P<method>[^\s"]+) (?P<resource>[^"]*)" (?P<status>\d+) (?P<size>\d+|-)"#,
    )
    .expect("access log pattern is valid")
});

/// Timestamp layout inside the brackets, e.g. `10/Oct/2023:13:55:36 +0000`
const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Field that failed semantic parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    Status,
    Size,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Status => "status",
            Self::Size => "size",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a line did not produce a record
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// The line does not have the access log shape
    #[error("line does not match the access log format")]
    Malformed,

    /// The shape matched but a field could not be converted
    #[error("invalid {field}: {value:?}")]
    FieldInvalid { field: Field, value: String },
}

impl ParseFailure {
    /// Short machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::FieldInvalid { .. } => "field-invalid",
        }
    }

    fn invalid(field: Field, value: &str) -> Self {
        Self::FieldInvalid {
            field,
            value: value.to_string(),
        }
    }
}

/// Parser for access log lines
pub struct LogParser;

impl LogParser {
    /// Parse one raw line into a record
    ///
    /// Surrounding whitespace is ignored. Method, resource and status are
    /// taken as logged: no verb whitelist, no URL decoding, no range check.
    pub fn parse(line: &str) -> Result<LogRecord, ParseFailure> {
        let caps = LINE_PATTERN
            .captures(line.trim())
            .ok_or(ParseFailure::Malformed)?;

        let raw_timestamp = &caps["timestamp"];
        let timestamp = DateTime::parse_from_str(raw_timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| ParseFailure::invalid(Field::Timestamp, raw_timestamp))?;

        let raw_status = &caps["status"];
        let status_code = raw_status
            .parse::<u16>()
            .map_err(|_| ParseFailure::invalid(Field::Status, raw_status))?;

        let response_size = match &caps["size"] {
            "-" => 0,
            raw_size => raw_size
                .parse::<u64>()
                .map_err(|_| ParseFailure::invalid(Field::Size, raw_size))?,
        };

        Ok(LogRecord::new(
            caps["ip"].to_string(),
            timestamp,
            caps["method"].to_string(),
            caps["resource"].to_string(),
            status_code,
            response_size,
        ))
    }
}
