pub mod dispatch;
pub mod font_safe;
pub mod html_writer;
pub mod png_writer;

use crate::error::Result;
use crate::models::StationChart;
use std::path::Path;

pub use dispatch::ArtifactDispatcher;
pub use html_writer::HtmlChartWriter;
pub use png_writer::PngChartWriter;

/// One output format for a station chart.
pub trait ChartRenderer: Send + Sync {
    /// Write the chart to `path`, replacing any existing file.
    fn render(&self, chart: &StationChart, path: &Path) -> Result<()>;
}
