pub mod chart;
pub mod observation;
pub mod station;

pub use chart::{
    AxisRange, AxisSpec, ChartSeries, Locale, SeriesKind, SeriesStyle, StationChart, YAxis,
};
pub use observation::Observation;
pub use station::{ArtifactPaths, StationGroup, WindowedSubset};
