//! Single-pass aggregators, one per report
//!
//! Each aggregator observes records one at a time and produces its ordered
//! result rows in `finish`. Count-descending reports break ties by ascending
//! key so output is stable across runs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use logtally_types::{
    CorpusStats, DailyCount, ErrorGroup, Fixed2, HeatmapCell, HourlyCount, IpCount, LogRecord,
    ResourceStats, StatusShare,
};

/// Distinct sample resources kept per error status
pub const ERROR_SAMPLE_LIMIT: usize = 3;

/// Incremental computation over a record set
pub trait Aggregate {
    type Output;

    fn observe(&mut self, record: &LogRecord);

    fn finish(self) -> Self::Output;
}

/// Run an aggregator over in-memory records
pub fn fold<'a, A, I>(records: I, mut aggregate: A) -> A::Output
where
    A: Aggregate,
    I: IntoIterator<Item = &'a LogRecord>,
{
    for record in records {
        aggregate.observe(record);
    }
    aggregate.finish()
}

/// Sort by count descending, then key ascending
fn rank_by_count<K: Ord, V>(groups: HashMap<K, V>, count: impl Fn(&V) -> u64) -> Vec<(K, V)> {
    let mut ranked: Vec<(K, V)> = groups.into_iter().collect();
    ranked.sort_by(|(ka, va), (kb, vb)| count(vb).cmp(&count(va)).then_with(|| ka.cmp(kb)));
    ranked
}

fn bump<K: Hash + Eq>(counts: &mut HashMap<K, u64>, key: K) {
    *counts.entry(key).or_insert(0) += 1;
}

/// Most active client addresses
#[derive(Debug)]
pub struct TopIps {
    limit: usize,
    counts: HashMap<String, u64>,
}

impl TopIps {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            counts: HashMap::new(),
        }
    }
}

impl Aggregate for TopIps {
    type Output = Vec<IpCount>;

    fn observe(&mut self, record: &LogRecord) {
        if let Some(count) = self.counts.get_mut(record.ip_address()) {
            *count += 1;
        } else {
            self.counts.insert(record.ip_address().to_string(), 1);
        }
    }

    fn finish(self) -> Vec<IpCount> {
        rank_by_count(self.counts, |c| *c)
            .into_iter()
            .take(self.limit)
            .map(|(ip_address, request_count)| IpCount {
                ip_address,
                request_count,
            })
            .collect()
    }
}

/// Status code counts with their share of all observed records
#[derive(Debug, Default)]
pub struct StatusDistribution {
    total: u64,
    counts: HashMap<u16, u64>,
}

impl StatusDistribution {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregate for StatusDistribution {
    type Output = Vec<StatusShare>;

    fn observe(&mut self, record: &LogRecord) {
        self.total += 1;
        bump(&mut self.counts, record.status_code());
    }

    fn finish(self) -> Vec<StatusShare> {
        let total = self.total;
        rank_by_count(self.counts, |c| *c)
            .into_iter()
            .map(|(status_code, count)| StatusShare {
                status_code,
                count,
                percentage: Fixed2::percentage(count, total),
            })
            .collect()
    }
}

/// Requests per hour of day, in the record's own offset
#[derive(Debug, Default)]
pub struct HourlyTraffic {
    counts: BTreeMap<u32, u64>,
}

impl HourlyTraffic {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregate for HourlyTraffic {
    type Output = Vec<HourlyCount>;

    fn observe(&mut self, record: &LogRecord) {
        *self.counts.entry(record.timestamp().hour()).or_insert(0) += 1;
    }

    fn finish(self) -> Vec<HourlyCount> {
        self.counts
            .into_iter()
            .map(|(hour, request_count)| HourlyCount {
                hour,
                request_count,
            })
            .collect()
    }
}

/// Requests per calendar date over a trailing window
#[derive(Debug)]
pub struct DailyTraffic {
    since: NaiveDateTime,
    counts: BTreeMap<NaiveDate, u64>,
}

impl DailyTraffic {
    /// Window starting at midnight `days` days before `today`
    pub fn new(days: u32, today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self {
            since: start.and_time(NaiveTime::MIN),
            counts: BTreeMap::new(),
        }
    }

    /// First local wall-clock instant inside the window
    pub fn since(&self) -> NaiveDateTime {
        self.since
    }
}

impl Aggregate for DailyTraffic {
    type Output = Vec<DailyCount>;

    fn observe(&mut self, record: &LogRecord) {
        let local = record.timestamp().naive_local();
        if local < self.since {
            return;
        }
        *self.counts.entry(local.date()).or_insert(0) += 1;
    }

    fn finish(self) -> Vec<DailyCount> {
        self.counts
            .into_iter()
            .map(|(date, request_count)| DailyCount {
                date,
                request_count,
            })
            .collect()
    }
}

/// Most requested resources with their average response size
#[derive(Debug)]
pub struct ResourceAnalysis {
    limit: usize,
    /// resource -> (count, summed size)
    groups: HashMap<String, (u64, u128)>,
}

impl ResourceAnalysis {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            groups: HashMap::new(),
        }
    }
}

impl Aggregate for ResourceAnalysis {
    type Output = Vec<ResourceStats>;

    fn observe(&mut self, record: &LogRecord) {
        let size = u128::from(record.response_size());
        if let Some((count, sum)) = self.groups.get_mut(record.resource()) {
            *count += 1;
            *sum += size;
        } else {
            self.groups.insert(record.resource().to_string(), (1, size));
        }
    }

    fn finish(self) -> Vec<ResourceStats> {
        rank_by_count(self.groups, |(count, _)| *count)
            .into_iter()
            .take(self.limit)
            .map(|(resource, (request_count, sum))| ResourceStats {
                resource,
                request_count,
                avg_size: Fixed2::from_ratio(sum, u128::from(request_count)),
            })
            .collect()
    }
}

/// Client and server errors grouped by status, with sample resources
#[derive(Debug, Default)]
pub struct ErrorAnalysis {
    groups: HashMap<u16, (u64, Vec<String>)>,
}

impl ErrorAnalysis {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregate for ErrorAnalysis {
    type Output = Vec<ErrorGroup>;

    fn observe(&mut self, record: &LogRecord) {
        if !record.is_error() {
            return;
        }
        let (count, samples) = self.groups.entry(record.status_code()).or_default();
        *count += 1;
        if samples.len() < ERROR_SAMPLE_LIMIT && !samples.iter().any(|s| s == record.resource()) {
            samples.push(record.resource().to_string());
        }
    }

    fn finish(self) -> Vec<ErrorGroup> {
        rank_by_count(self.groups, |(count, _)| *count)
            .into_iter()
            .map(|(status_code, (error_count, sample_resources))| ErrorGroup {
                status_code,
                error_count,
                sample_resources,
            })
            .collect()
    }
}

/// Requests per (day of week, hour) cell
#[derive(Debug, Default)]
pub struct TrafficHeatmap {
    counts: BTreeMap<(u32, u32), u64>,
}

impl TrafficHeatmap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregate for TrafficHeatmap {
    type Output = Vec<HeatmapCell>;

    fn observe(&mut self, record: &LogRecord) {
        let ts = record.timestamp();
        let key = (ts.weekday().number_from_sunday(), ts.hour());
        *self.counts.entry(key).or_insert(0) += 1;
    }

    fn finish(self) -> Vec<HeatmapCell> {
        self.counts
            .into_iter()
            .map(|((day_of_week, hour), request_count)| HeatmapCell {
                day_of_week,
                hour,
                request_count,
            })
            .collect()
    }
}

/// Totals, distinct addresses and time range
#[derive(Debug, Default)]
pub struct CorpusStatistics {
    total: u64,
    ips: HashSet<String>,
    earliest: Option<DateTime<FixedOffset>>,
    latest: Option<DateTime<FixedOffset>>,
}

impl CorpusStatistics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregate for CorpusStatistics {
    type Output = CorpusStats;

    fn observe(&mut self, record: &LogRecord) {
        self.total += 1;
        if !self.ips.contains(record.ip_address()) {
            self.ips.insert(record.ip_address().to_string());
        }
        let ts = record.timestamp();
        if self.earliest.is_none_or(|e| ts < e) {
            self.earliest = Some(ts);
        }
        if self.latest.is_none_or(|l| ts > l) {
            self.latest = Some(ts);
        }
    }

    fn finish(self) -> CorpusStats {
        CorpusStats {
            total_records: self.total,
            unique_ips: self.ips.len() as u64,
            earliest: self.earliest,
            latest: self.latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ip: &str, ts: &str, resource: &str, status: u16, size: u64) -> LogRecord {
        LogRecord::new(
            ip.to_string(),
            DateTime::parse_from_rfc3339(ts).unwrap(),
            "GET".to_string(),
            resource.to_string(),
            status,
            size,
        )
    }

    fn at(ts: &str) -> LogRecord {
        record("10.0.0.1", ts, "/", 200, 0)
    }

    #[test]
    fn test_empty_input_gives_empty_results() {
        let none: Vec<LogRecord> = Vec::new();
        assert!(fold(&none, TopIps::new(10)).is_empty());
        assert!(fold(&none, StatusDistribution::new()).is_empty());
        assert!(fold(&none, HourlyTraffic::new()).is_empty());
        assert!(fold(&none, ResourceAnalysis::new(10)).is_empty());
        assert!(fold(&none, ErrorAnalysis::new()).is_empty());
        assert!(fold(&none, TrafficHeatmap::new()).is_empty());
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(fold(&none, DailyTraffic::new(30, today)).is_empty());
        assert_eq!(fold(&none, CorpusStatistics::new()), CorpusStats::default());
    }

    #[test]
    fn test_top_ips_limit_and_tie_break() {
        let records = vec![
            record("10.0.0.2", "2024-01-01T00:00:00Z", "/", 200, 0),
            record("10.0.0.3", "2024-01-01T00:00:00Z", "/", 200, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/", 200, 0),
            record("10.0.0.3", "2024-01-01T00:00:00Z", "/", 200, 0),
        ];
        let top = fold(&records, TopIps::new(2));
        assert_eq!(
            top,
            vec![
                IpCount {
                    ip_address: "10.0.0.3".to_string(),
                    request_count: 2
                },
                IpCount {
                    ip_address: "10.0.0.1".to_string(),
                    request_count: 1
                },
            ]
        );
    }

    #[test]
    fn test_status_percentages_sum_to_hundred() {
        let mut records = Vec::new();
        for (status, n) in [(200u16, 5), (301, 1), (404, 1)] {
            for _ in 0..n {
                records.push(record("10.0.0.1", "2024-01-01T00:00:00Z", "/", status, 0));
            }
        }
        let rows = fold(&records, StatusDistribution::new());

        let codes: Vec<u16> = rows.iter().map(|r| r.status_code).collect();
        assert_eq!(codes, vec![200, 301, 404]);
        assert_eq!(rows[0].percentage.to_string(), "71.43");
        assert_eq!(rows[1].percentage.to_string(), "14.29");

        let sum: i64 = rows.iter().map(|r| r.percentage.hundredths() as i64).sum();
        assert!((sum - 10_000).abs() <= rows.len() as i64);
    }

    #[test]
    fn test_hourly_buckets_sorted_and_sparse() {
        let records = vec![at("2024-01-01T23:59:59Z"), at("2024-01-02T00:00:00Z")];
        let rows = fold(&records, HourlyTraffic::new());
        assert_eq!(
            rows,
            vec![
                HourlyCount {
                    hour: 0,
                    request_count: 1
                },
                HourlyCount {
                    hour: 23,
                    request_count: 1
                },
            ]
        );
    }

    #[test]
    fn test_hour_is_local_to_logged_offset() {
        let records = vec![at("2024-01-01T08:30:00-05:00")];
        let rows = fold(&records, HourlyTraffic::new());
        assert_eq!(rows[0].hour, 8);
    }

    #[test]
    fn test_daily_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let records = vec![
            at("2024-02-29T23:59:59Z"),
            at("2024-03-01T00:00:00Z"),
            at("2024-03-01T12:00:00Z"),
            at("2024-03-30T09:00:00+09:00"),
        ];
        let daily = DailyTraffic::new(30, today);
        assert_eq!(
            daily.since(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );

        let rows = fold(&records, daily);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(rows[0].request_count, 2);
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2024, 3, 30).unwrap());
    }

    #[test]
    fn test_resource_average_rounds_half_up() {
        let records = vec![
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/a", 200, 1),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/a", 200, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/a", 200, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/a", 200, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/a", 200, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/a", 200, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/a", 200, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/a", 200, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/b", 200, 0),
        ];
        let rows = fold(&records, ResourceAnalysis::new(10));
        assert_eq!(rows[0].resource, "/a");
        assert_eq!(rows[0].request_count, 8);
        // 1 / 8 = 0.125
        assert_eq!(rows[0].avg_size.to_string(), "0.13");
        assert_eq!(rows[1].avg_size, Fixed2::ZERO);
    }

    #[test]
    fn test_error_analysis_samples() {
        let records = vec![
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/ok", 200, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/x", 404, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/x", 404, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/y", 404, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/z", 404, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/w", 404, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/boom", 500, 0),
            record("10.0.0.1", "2024-01-01T00:00:00Z", "/moved", 399, 0),
        ];
        let rows = fold(&records, ErrorAnalysis::new());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status_code, 404);
        assert_eq!(rows[0].error_count, 5);
        assert_eq!(rows[0].samples(), "/x,/y,/z");
        assert_eq!(rows[1].status_code, 500);
        assert!(rows.iter().all(|r| r.status_code >= 400));
    }

    #[test]
    fn test_error_analysis_without_errors() {
        let records = vec![at("2024-01-01T00:00:00Z")];
        assert!(fold(&records, ErrorAnalysis::new()).is_empty());
    }

    #[test]
    fn test_heatmap_uses_sunday_first_numbering() {
        // 2024-01-07 is a Sunday, 2024-01-13 a Saturday
        let records = vec![
            at("2024-01-13T05:00:00Z"),
            at("2024-01-07T10:00:00Z"),
            at("2024-01-07T09:00:00Z"),
            at("2024-01-07T09:30:00Z"),
        ];
        let cells = fold(&records, TrafficHeatmap::new());
        let keys: Vec<(u32, u32, u64)> = cells
            .iter()
            .map(|c| (c.day_of_week, c.hour, c.request_count))
            .collect();
        assert_eq!(keys, vec![(1, 9, 2), (1, 10, 1), (7, 5, 1)]);
        assert_eq!(cells[0].day_name(), "Sunday");
        assert_eq!(cells[2].day_name(), "Saturday");
    }

    #[test]
    fn test_corpus_statistics() {
        let records = vec![
            record("10.0.0.1", "2024-01-02T00:00:00Z", "/", 200, 0),
            record("10.0.0.2", "2024-01-01T00:00:00Z", "/", 200, 0),
            record("10.0.0.1", "2024-01-03T00:00:00+01:00", "/", 200, 0),
        ];
        let stats = fold(&records, CorpusStatistics::new());
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.unique_ips, 2);
        assert_eq!(
            stats.earliest,
            Some(DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap())
        );
        assert_eq!(
            stats.latest,
            Some(DateTime::parse_from_rfc3339("2024-01-03T00:00:00+01:00").unwrap())
        );
    }
}
