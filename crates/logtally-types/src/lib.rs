//! Shared types for logtally
//!
//! This crate contains the access log record and the result rows produced by
//! the analytics reports. Everything here is plain data.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Records
// ============================================================================

/// One HTTP access event parsed from a log line
///
/// Fields are private so a record cannot change after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    ip_address: String,
    timestamp: DateTime<FixedOffset>,
    method: String,
    resource: String,
    status_code: u16,
    response_size: u64,
}

impl LogRecord {
    pub fn new(
        ip_address: String,
        timestamp: DateTime<FixedOffset>,
        method: String,
        resource: String,
        status_code: u16,
        response_size: u64,
    ) -> Self {
        Self {
            ip_address,
            timestamp,
            method,
            resource,
            status_code,
            response_size,
        }
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    /// Event time, in the offset it was logged with
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Request time. The log format carries a single timestamp, so this is
    /// always equal to [`LogRecord::timestamp`].
    pub fn request_time(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request target exactly as logged, query string included
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Response size in bytes (`-` in the log is stored as 0)
    pub fn response_size(&self) -> u64 {
        self.response_size
    }

    /// Whether the status code is a client or server error (>= 400)
    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }
}

/// A record as held by a store, with its surrogate key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Store-assigned id, increasing in insertion order
    pub id: u64,

    #[serde(flatten)]
    pub record: LogRecord,
}

impl StoredRecord {
    pub fn new(id: u64, record: LogRecord) -> Self {
        Self { id, record }
    }
}

// ============================================================================
// Fixed-point values
// ============================================================================

/// Decimal with two fractional digits
///
/// Report percentages and averages are rounded half-up into this type so the
/// same input always produces the same digits.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed2(Decimal);

impl Fixed2 {
    pub const ZERO: Fixed2 = Fixed2(Decimal::ZERO);

    pub fn from_hundredths(hundredths: u64) -> Self {
        Self(Decimal::from_i128_with_scale(i128::from(hundredths), 2))
    }

    /// `numerator / denominator`, rounded half-up to two decimals.
    /// A zero denominator yields zero; overflow saturates.
    pub fn from_ratio(numerator: u128, denominator: u128) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        let quotient = Decimal::from_u128(numerator)
            .zip(Decimal::from_u128(denominator))
            .and_then(|(n, d)| n.checked_div(d))
            .unwrap_or(Decimal::MAX);
        Self(quotient.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Percentage `100 * part / whole`, rounded half-up
    pub fn percentage(part: u64, whole: u64) -> Self {
        Self::from_ratio(u128::from(part) * 100, u128::from(whole))
    }

    pub fn hundredths(&self) -> u64 {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|h| h.to_u64())
            .unwrap_or(u64::MAX)
    }
}

impl fmt::Display for Fixed2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{:.2}", self.0))
    }
}

// ============================================================================
// Report rows
// ============================================================================

/// Request count for one client address
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpCount {
    pub ip_address: String,
    pub request_count: u64,
}

/// Share of all requests answered with one status code
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusShare {
    pub status_code: u16,
    pub count: u64,
    pub percentage: Fixed2,
}

/// Requests within one hour of the day (0-23)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyCount {
    pub hour: u32,
    pub request_count: u64,
}

/// Requests on one calendar date
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub request_count: u64,
}

/// Popularity and average payload of one resource
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub resource: String,
    pub request_count: u64,
    pub avg_size: Fixed2,
}

/// Error responses grouped by status code
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorGroup {
    pub status_code: u16,
    pub error_count: u64,
    /// Up to three distinct resources that produced this status
    pub sample_resources: Vec<String>,
}

impl ErrorGroup {
    /// Sample resources joined for display
    pub fn samples(&self) -> String {
        self.sample_resources.join(",")
    }
}

/// Requests within one (day-of-week, hour) cell
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    /// 1 = Sunday .. 7 = Saturday
    pub day_of_week: u32,
    pub hour: u32,
    pub request_count: u64,
}

impl HeatmapCell {
    pub fn day_name(&self) -> &'static str {
        day_name(self.day_of_week)
    }
}

/// Whole-corpus statistics
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_records: u64,
    pub unique_ips: u64,
    pub earliest: Option<DateTime<FixedOffset>>,
    pub latest: Option<DateTime<FixedOffset>>,
}

impl CorpusStats {
    /// Time between the earliest and latest record
    pub fn span(&self) -> Option<Duration> {
        match (self.earliest, self.latest) {
            (Some(earliest), Some(latest)) => Some(latest - earliest),
            _ => None,
        }
    }

    /// Whole days elapsed from the earliest record until `now`
    pub fn days_analyzed(&self, now: DateTime<FixedOffset>) -> i64 {
        self.earliest
            .map(|earliest| (now - earliest).num_days().max(0))
            .unwrap_or(0)
    }

    /// Average requests per day, counting at least one day
    pub fn avg_requests_per_day(&self, now: DateTime<FixedOffset>) -> f64 {
        let days = self.days_analyzed(now).max(1);
        self.total_records as f64 / days as f64
    }
}

// ============================================================================
// Calendar helpers
// ============================================================================

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Name for a 1 = Sunday .. 7 = Saturday day number
pub fn day_name(day_of_week: u32) -> &'static str {
    match day_of_week {
        1..=7 => DAY_NAMES[(day_of_week - 1) as usize],
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, day, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_fixed2_rounds_half_up() {
        assert_eq!(Fixed2::percentage(1, 2).to_string(), "50.00");
        assert_eq!(Fixed2::percentage(1, 3).to_string(), "33.33");
        assert_eq!(Fixed2::percentage(2, 3).to_string(), "66.67");
        // 1/8 = 0.125 -> 0.13
        assert_eq!(Fixed2::from_ratio(1, 8).to_string(), "0.13");
        assert_eq!(Fixed2::from_ratio(500, 2).to_string(), "250.00");
        // 2.675 is not representable in binary floating point; stays exact here
        assert_eq!(Fixed2::from_ratio(2675, 1000).to_string(), "2.68");
        assert_eq!(Fixed2::from_ratio(2674, 1000).hundredths(), 267);
    }

    #[test]
    fn test_fixed2_zero_denominator() {
        assert_eq!(Fixed2::from_ratio(10, 0), Fixed2::ZERO);
        assert_eq!(Fixed2::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_fixed2_pads_in_tables() {
        assert_eq!(format!("{:<8}|", Fixed2::from_hundredths(5)), "0.05    |");
        assert_eq!(Fixed2::from_hundredths(25_000), Fixed2::from_ratio(500, 2));
    }

    #[test]
    fn test_day_name() {
        assert_eq!(day_name(1), "Sunday");
        assert_eq!(day_name(7), "Saturday");
        assert_eq!(day_name(0), "Unknown");
        assert_eq!(day_name(8), "Unknown");
    }

    #[test]
    fn test_request_time_matches_timestamp() {
        let record = LogRecord::new(
            "10.0.0.1".to_string(),
            at(1, 0),
            "GET".to_string(),
            "/a".to_string(),
            200,
            0,
        );
        assert_eq!(record.request_time(), record.timestamp());
        assert!(!record.is_error());
    }

    #[test]
    fn test_corpus_stats_per_day() {
        let stats = CorpusStats {
            total_records: 30,
            unique_ips: 3,
            earliest: Some(at(1, 0)),
            latest: Some(at(2, 0)),
        };
        assert_eq!(stats.span().map(|d| d.num_hours()), Some(24));
        assert_eq!(stats.days_analyzed(at(11, 0)), 10);
        assert_eq!(stats.avg_requests_per_day(at(11, 0)), 3.0);
        // Less than a day counts as one
        assert_eq!(stats.avg_requests_per_day(at(1, 5)), 30.0);
    }

    #[test]
    fn test_stored_record_flattens() {
        let stored = StoredRecord::new(
            7,
            LogRecord::new(
                "10.0.0.1".to_string(),
                at(1, 0),
                "GET".to_string(),
                "/a".to_string(),
                404,
                0,
            ),
        );
        let json = serde_json::to_string(&stored).unwrap();
        assert!(json.starts_with("{\"id\":7,\"ip_address\":\"10.0.0.1\""));
        let back: StoredRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stored);
    }
}
