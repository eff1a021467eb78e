pub mod chart_job;
pub mod chart_pipeline;
pub mod run_summary;
pub mod station_grouper;
pub mod window;

pub use chart_job::ChartJob;
pub use chart_pipeline::{CancellationFlag, ChartPipeline, PipelineEvent};
pub use run_summary::{RunSummary, StationFailure};
pub use station_grouper::StationGrouper;
pub use window::TrailingWindow;
