use crate::error::{ProcessingError, Result};
use crate::models::{SeriesKind, SeriesStyle, StationChart, YAxis};
use crate::utils::constants::{DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH};
use crate::writers::font_safe::{ensure_font, FontSafeBackend};
use crate::writers::ChartRenderer;
use chrono::Duration;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::debug;

type DrawResult = std::result::Result<(), Box<dyn Error>>;

const NAVY: RGBColor = RGBColor(0, 0, 128);
const SEA_GREEN: RGBColor = RGBColor(46, 139, 87);
const DEEP_SKY_BLUE: RGBColor = RGBColor(0, 191, 255);
const FIRE_BRICK: RGBColor = RGBColor(178, 34, 34);
const ORANGE: RGBColor = RGBColor(255, 165, 0);

fn series_color(kind: SeriesKind) -> RGBColor {
    match kind {
        SeriesKind::Precipitation => NAVY,
        SeriesKind::DryTemperature => SEA_GREEN,
        SeriesKind::MinTemperature => DEEP_SKY_BLUE,
        SeriesKind::MaxTemperature => FIRE_BRICK,
        SeriesKind::Humidity => ORANGE,
    }
}

/// Static raster chart written with plotters' bitmap backend.
pub struct PngChartWriter {
    width: u32,
    height: u32,
    font_path: Option<PathBuf>,
}

impl PngChartWriter {
    pub fn new() -> Self {
        Self {
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
            font_path: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_font_path(mut self, font_path: Option<PathBuf>) -> Self {
        self.font_path = font_path;
        self
    }
}

impl Default for PngChartWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer for PngChartWriter {
    fn render(&self, chart: &StationChart, path: &Path) -> Result<()> {
        let has_font = ensure_font(self.font_path.as_deref());
        debug!(
            "Drawing {}x{} image for '{}' (text: {})",
            self.width, self.height, chart.station, has_font
        );

        let backend = BitMapBackend::new(path, (self.width, self.height));
        let root = FontSafeBackend::new(backend).into_drawing_area();

        draw_chart(root, chart).map_err(|e| ProcessingError::render(&chart.station, e.to_string()))
    }
}

/// Split a series into runs of consecutive present values; a gap ends the run.
fn contiguous_runs(xs: &[f64], values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for (&x, value) in xs.iter().zip(values) {
        match value {
            Some(y) if y.is_finite() => current.push((x, *y)),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

macro_rules! draw_styled {
    ($chart:ident . $method:ident, $series:expr, $xs:expr) => {{
        let series = $series;
        let color = series_color(series.kind);
        let runs = contiguous_runs($xs, &series.values);

        match series.style {
            SeriesStyle::Line => {
                let style = color.stroke_width(2);
                $chart
                    .$method(
                        runs.into_iter()
                            .flat_map(move |run| LineSeries::new(run, style).point_size(2)),
                    )?
                    .label(series.name.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }
            SeriesStyle::DashedLine => {
                let style = color.stroke_width(2);
                $chart
                    .$method(
                        runs.into_iter()
                            .flat_map(move |run| DashedLineSeries::new(run, 6, 4, style)),
                    )?
                    .label(series.name.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }
            SeriesStyle::Markers => {
                let style = color.filled();
                $chart
                    .$method(runs.into_iter().flatten().map(move |p| Circle::new(p, 3, style)))?
                    .label(series.name.as_str())
                    .legend(move |(x, y)| Circle::new((x + 10, y), 3, style));
            }
        }
    }};
}

fn draw_chart<DB>(root: DrawingArea<DB, Shift>, chart: &StationChart) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let first = chart
        .first_date()
        .ok_or_else(|| format!("no dates for station '{}'", chart.station))?;
    let xs: Vec<f64> = chart
        .dates
        .iter()
        .map(|d| (*d - first).num_days() as f64)
        .collect();
    let span = xs.iter().copied().fold(0.0, f64::max);

    let primary = chart.primary_axis.range;
    let secondary = chart.secondary_axis.range;
    let x_range = -0.5..(span + 0.5);

    let mut plot = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), primary.min..primary.max)?
        .set_secondary_coord(x_range, secondary.min..secondary.max);

    let date_label = |x: &f64| {
        (first + Duration::days(x.round() as i64))
            .format("%d/%m")
            .to_string()
    };

    plot.configure_mesh()
        .x_desc(chart.date_axis.as_str())
        .y_desc(chart.primary_axis.title.as_str())
        .x_labels(10)
        .x_label_formatter(&date_label)
        .label_style(("sans-serif", 14))
        .draw()?;

    plot.configure_secondary_axes()
        .y_desc(chart.secondary_axis.title.as_str())
        .label_style(("sans-serif", 14))
        .draw()?;

    for series in chart.series_on(YAxis::Primary) {
        draw_styled!(plot.draw_series, series, &xs);
    }
    for series in chart.series_on(YAxis::Secondary) {
        draw_styled!(plot.draw_secondary_series, series, &xs);
    }

    plot.configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 14))
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}
