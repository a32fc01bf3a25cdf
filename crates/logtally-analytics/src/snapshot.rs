use chrono::{DateTime, Utc};
use serde::Serialize;

use logtally_types::{
    CorpusStats, DailyCount, ErrorGroup, HeatmapCell, HourlyCount, IpCount, ResourceStats,
    StatusShare,
};

/// All reports computed in one pass over the engine
#[derive(Clone, Debug, Default, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub stats: CorpusStats,
    pub top_ips: Vec<IpCount>,
    pub status: Vec<StatusShare>,
    pub hourly: Vec<HourlyCount>,
    pub daily: Vec<DailyCount>,
    pub resources: Vec<ResourceStats>,
    pub errors: Vec<ErrorGroup>,
    pub heatmap: Vec<HeatmapCell>,
    /// One message per report that could not be computed
    pub failures: Vec<String>,
}

impl DashboardSnapshot {
    /// No records were visible to any report
    pub fn is_empty(&self) -> bool {
        self.stats.total_records == 0
    }

    /// Largest single hourly bucket, used to scale bars
    pub fn peak_hour(&self) -> Option<&HourlyCount> {
        self.hourly.iter().max_by(|a, b| {
            a.request_count
                .cmp(&b.request_count)
                .then_with(|| b.hour.cmp(&a.hour))
        })
    }

    /// Request count for a (day of week, hour) cell, zero when absent
    pub fn heatmap_count(&self, day_of_week: u32, hour: u32) -> u64 {
        self.heatmap
            .iter()
            .find(|c| c.day_of_week == day_of_week && c.hour == hour)
            .map_or(0, |c| c.request_count)
    }

    /// Largest heatmap cell
    pub fn heatmap_peak(&self) -> u64 {
        self.heatmap
            .iter()
            .map(|c| c.request_count)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour(hour: u32, request_count: u64) -> HourlyCount {
        HourlyCount {
            hour,
            request_count,
        }
    }

    fn cell(day_of_week: u32, hour: u32, request_count: u64) -> HeatmapCell {
        HeatmapCell {
            day_of_week,
            hour,
            request_count,
        }
    }

    #[test]
    fn test_peak_hour_prefers_earliest_on_tie() {
        let snapshot = DashboardSnapshot {
            hourly: vec![hour(3, 7), hour(9, 7), hour(12, 2)],
            ..Default::default()
        };
        assert_eq!(snapshot.peak_hour().map(|h| h.hour), Some(3));
    }

    #[test]
    fn test_heatmap_lookup() {
        let snapshot = DashboardSnapshot {
            heatmap: vec![cell(1, 0, 4), cell(7, 23, 9)],
            ..Default::default()
        };
        assert_eq!(snapshot.heatmap_count(7, 23), 9);
        assert_eq!(snapshot.heatmap_count(2, 5), 0);
        assert_eq!(snapshot.heatmap_peak(), 9);
        assert!(snapshot.is_empty());
    }
}
