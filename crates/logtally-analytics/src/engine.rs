use chrono::{NaiveDate, Utc};
use thiserror::Error;

use logtally_store::{LogStore, RecordFilter, StoreError};
use logtally_types::{
    CorpusStats, DailyCount, ErrorGroup, HeatmapCell, HourlyCount, IpCount, ResourceStats,
    StatusShare,
};

use crate::aggregate::{
    Aggregate, CorpusStatistics, DailyTraffic, ErrorAnalysis, HourlyTraffic, ResourceAnalysis,
    StatusDistribution, TopIps, TrafficHeatmap,
};
use crate::snapshot::DashboardSnapshot;

/// Rows returned by the ranked reports unless the caller asks otherwise
pub const DEFAULT_TOP_N: usize = 10;

/// Trailing window of the daily traffic report
pub const DEFAULT_DAYS: u32 = 30;

/// A report could not be computed
#[derive(Debug, Error)]
#[error("{report} query failed")]
pub struct AnalyticsError {
    pub report: &'static str,
    #[source]
    pub source: StoreError,
}

/// Read-only reports over the records held by a store
///
/// Reports are independent: each one is a separate scan, and one failing
/// does not affect the others.
pub struct AnalyticsEngine<S> {
    store: S,
}

impl<S: LogStore> AnalyticsEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn run<A: Aggregate>(
        &self,
        report: &'static str,
        filter: RecordFilter,
        mut aggregate: A,
    ) -> Result<A::Output, AnalyticsError> {
        let scanned = self
            .store
            .scan(&filter, &mut |stored| aggregate.observe(&stored.record));

        match scanned {
            Ok(()) => Ok(aggregate.finish()),
            Err(source) => {
                tracing::error!(report, error = %source, "Error fetching report");
                Err(AnalyticsError { report, source })
            }
        }
    }

    /// Addresses with the most requests
    pub fn top_ips(&self, n: usize) -> Result<Vec<IpCount>, AnalyticsError> {
        self.run("top IPs", RecordFilter::all(), TopIps::new(n))
    }

    /// Requests per status code, with percentages of the whole record set
    pub fn status_distribution(&self) -> Result<Vec<StatusShare>, AnalyticsError> {
        self.run(
            "status distribution",
            RecordFilter::all(),
            StatusDistribution::new(),
        )
    }

    pub fn hourly_traffic(&self) -> Result<Vec<HourlyCount>, AnalyticsError> {
        self.run("hourly traffic", RecordFilter::all(), HourlyTraffic::new())
    }

    /// Requests per date over the last `days` days, counted from today (UTC)
    pub fn daily_traffic(&self, days: u32) -> Result<Vec<DailyCount>, AnalyticsError> {
        self.daily_traffic_until(days, Utc::now().date_naive())
    }

    /// Requests per date over the `days` days before `today`
    pub fn daily_traffic_until(
        &self,
        days: u32,
        today: NaiveDate,
    ) -> Result<Vec<DailyCount>, AnalyticsError> {
        let aggregate = DailyTraffic::new(days, today);
        let filter = RecordFilter::all().since(aggregate.since());
        self.run("daily traffic", filter, aggregate)
    }

    /// Most requested resources with average response size
    pub fn resource_analysis(&self, n: usize) -> Result<Vec<ResourceStats>, AnalyticsError> {
        self.run("resource analysis", RecordFilter::all(), ResourceAnalysis::new(n))
    }

    /// Status codes >= 400 with sample resources
    pub fn error_analysis(&self) -> Result<Vec<ErrorGroup>, AnalyticsError> {
        self.run(
            "error analysis",
            RecordFilter::all().min_status(400),
            ErrorAnalysis::new(),
        )
    }

    /// Requests per (day of week, hour)
    pub fn traffic_heatmap(&self) -> Result<Vec<HeatmapCell>, AnalyticsError> {
        self.run("traffic heatmap", RecordFilter::all(), TrafficHeatmap::new())
    }

    pub fn corpus_stats(&self) -> Result<CorpusStats, AnalyticsError> {
        self.run("corpus statistics", RecordFilter::all(), CorpusStatistics::new())
    }

    /// Every report at once. Failed reports come back empty and are listed
    /// in [`DashboardSnapshot::failures`].
    pub fn snapshot(&self, top_n: usize, days: u32) -> DashboardSnapshot {
        let mut failures = Vec::new();

        DashboardSnapshot {
            generated_at: Utc::now(),
            stats: or_default(self.corpus_stats(), &mut failures),
            top_ips: or_default(self.top_ips(top_n), &mut failures),
            status: or_default(self.status_distribution(), &mut failures),
            hourly: or_default(self.hourly_traffic(), &mut failures),
            daily: or_default(self.daily_traffic(days), &mut failures),
            resources: or_default(self.resource_analysis(top_n), &mut failures),
            errors: or_default(self.error_analysis(), &mut failures),
            heatmap: or_default(self.traffic_heatmap(), &mut failures),
            failures,
        }
    }
}

fn or_default<T: Default>(result: Result<T, AnalyticsError>, failures: &mut Vec<String>) -> T {
    result.unwrap_or_else(|e| {
        failures.push(e.to_string());
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use logtally_store::{MemoryStore, StoredRecord};
    use logtally_types::{Fixed2, LogRecord};

    /// Store whose reads always fail
    struct BrokenStore;

    impl LogStore for BrokenStore {
        fn insert_batch(&self, _records: &[LogRecord]) -> Result<u64, StoreError> {
            Ok(0)
        }

        fn scan(
            &self,
            _filter: &RecordFilter,
            _visit: &mut dyn FnMut(&StoredRecord),
        ) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("connection lost")))
        }
    }

    fn record(ts: &str, status: u16, size: u64) -> LogRecord {
        LogRecord::new(
            "10.0.0.1".to_string(),
            DateTime::parse_from_rfc3339(ts).unwrap(),
            "GET".to_string(),
            "/a".to_string(),
            status,
            size,
        )
    }

    fn two_line_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_batch(&[
                record("2024-01-01T00:00:00Z", 200, 500),
                record("2024-01-01T01:00:00Z", 404, 0),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_two_record_scenario() {
        let engine = AnalyticsEngine::new(two_line_store());

        let top = engine.top_ips(1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!((top[0].ip_address.as_str(), top[0].request_count), ("10.0.0.1", 2));

        let status = engine.status_distribution().unwrap();
        let rows: Vec<(u16, u64, String)> = status
            .iter()
            .map(|s| (s.status_code, s.count, s.percentage.to_string()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (200, 1, "50.00".to_string()),
                (404, 1, "50.00".to_string())
            ]
        );

        let errors = engine.error_analysis().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!((errors[0].status_code, errors[0].error_count), (404, 1));
        assert_eq!(errors[0].samples(), "/a");

        let resources = engine.resource_analysis(DEFAULT_TOP_N).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].request_count, 2);
        assert_eq!(resources[0].avg_size, Fixed2::from_hundredths(25_000));

        let hourly = engine.hourly_traffic().unwrap();
        assert_eq!(hourly.iter().map(|h| h.hour).collect::<Vec<_>>(), vec![0, 1]);

        let stats = engine.corpus_stats().unwrap();
        assert_eq!((stats.total_records, stats.unique_ips), (2, 1));
    }

    #[test]
    fn test_daily_traffic_window_from_today() {
        let engine = AnalyticsEngine::new(two_line_store());
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let rows = engine.daily_traffic_until(DEFAULT_DAYS, today).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_count, 2);

        // Window starts Jan 2, after both records
        assert!(engine.daily_traffic_until(8, today).unwrap().is_empty());
    }

    #[test]
    fn test_empty_store_gives_empty_reports() {
        let engine = AnalyticsEngine::new(MemoryStore::new());
        let snapshot = engine.snapshot(DEFAULT_TOP_N, DEFAULT_DAYS);
        assert!(snapshot.failures.is_empty());
        assert!(snapshot.is_empty());
        assert!(snapshot.top_ips.is_empty());
        assert!(snapshot.heatmap.is_empty());
        assert_eq!(snapshot.stats, CorpusStats::default());
    }

    #[test]
    fn test_query_failure_is_reported_per_report() {
        let engine = AnalyticsEngine::new(BrokenStore);

        let err = engine.top_ips(5).unwrap_err();
        assert_eq!(err.report, "top IPs");
        assert!(engine.error_analysis().is_err());

        let snapshot = engine.snapshot(5, 7);
        assert_eq!(snapshot.failures.len(), 8);
        assert!(snapshot.status.is_empty());
    }

    #[test]
    fn test_engine_over_shared_store() {
        let store = std::sync::Arc::new(two_line_store());
        let engine = AnalyticsEngine::new(store.clone());
        assert_eq!(engine.traffic_heatmap().unwrap().len(), 2);
        assert_eq!(engine.store().count().unwrap(), 2);
    }
}
