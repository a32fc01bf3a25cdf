mod dashboard;
mod heatmap;
mod overview;
mod tables;

pub use dashboard::DashboardScreen;
pub use heatmap::HeatmapPanel;
pub use overview::OverviewPanel;
pub use tables::{DailyPanel, ErrorsPanel, ResourcesPanel, TopIpsPanel};
