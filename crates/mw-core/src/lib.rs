/// Configuration, shared types and report plumbing for modwatch.
///
/// This crate contains the verdict types produced by the classifier,
/// the TOML configuration, the daily schedule math and the report sink seam
/// used across the modwatch workspace.

pub mod config;
pub mod error;
pub mod schedule;
pub mod traits;
pub mod verdict;

pub use config::{AggregationPolicy, AnalysisConfig, MonitorConfig};
pub use error::CoreError;
pub use schedule::DailySchedule;
pub use traits::{FnSink, ReportEvent, ReportSink, RunSummary};
pub use verdict::{ClassificationResult, Label};
