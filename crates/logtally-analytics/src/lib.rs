//! Traffic analytics for logtally
//!
//! Reports are computed by folding stored records through an [`Aggregate`].
//! [`AnalyticsEngine`] runs each report as one store scan.

pub mod aggregate;
mod engine;
mod snapshot;

pub use aggregate::{Aggregate, ERROR_SAMPLE_LIMIT, fold};
pub use engine::{AnalyticsEngine, AnalyticsError, DEFAULT_DAYS, DEFAULT_TOP_N};
pub use snapshot::DashboardSnapshot;
