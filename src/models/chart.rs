use crate::error::{ProcessingError, Result};
use crate::models::WindowedSubset;
use crate::utils::constants::{PRECIPITATION_RANGE, TEMPERATURE_RANGE};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language of chart titles and axis labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl FromStr for Locale {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "es" | "spanish" => Ok(Locale::Es),
            "en" | "english" => Ok(Locale::En),
            _ => Err(ProcessingError::Config(format!("Unsupported locale: {}", s))),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Es => write!(f, "es"),
            Locale::En => write!(f, "en"),
        }
    }
}

impl Locale {
    pub fn title(&self, station: &str) -> String {
        match self {
            Locale::Es => station.to_string(),
            Locale::En => format!("Data for {}", station),
        }
    }

    pub fn date_axis(&self) -> &'static str {
        match self {
            Locale::Es => "Fecha",
            Locale::En => "Date",
        }
    }

    pub fn precipitation_axis(&self) -> &'static str {
        match self {
            Locale::Es => "Precipitación (mm)",
            Locale::En => "Precipitation (mm)",
        }
    }

    pub fn temperature_axis(&self) -> &'static str {
        match self {
            Locale::Es => "Temperatura (°C)",
            Locale::En => "Temperature (°C)",
        }
    }

    pub fn series_name(&self, kind: SeriesKind) -> &'static str {
        match (self, kind) {
            (Locale::Es, SeriesKind::Precipitation) => "Precipitación",
            (Locale::Es, SeriesKind::DryTemperature) => "Temperatura media",
            (Locale::Es, SeriesKind::MinTemperature) => "Temperatura min",
            (Locale::Es, SeriesKind::MaxTemperature) => "Temperatura max",
            (Locale::Es, SeriesKind::Humidity) => "Humedad relativa",
            (Locale::En, SeriesKind::Precipitation) => "Precipitation",
            (Locale::En, SeriesKind::DryTemperature) => "Dry temperature",
            (Locale::En, SeriesKind::MinTemperature) => "Min temperature",
            (Locale::En, SeriesKind::MaxTemperature) => "Max temperature",
            (Locale::En, SeriesKind::Humidity) => "Relative humidity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesKind {
    Precipitation,
    DryTemperature,
    MinTemperature,
    MaxTemperature,
    Humidity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YAxis {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesStyle {
    Line,
    DashedLine,
    Markers,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub title: String,
    pub range: AxisRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub kind: SeriesKind,
    pub name: String,
    pub axis: YAxis,
    pub style: SeriesStyle,
    /// One entry per date of the chart; `None` marks a gap
    pub values: Vec<Option<f64>>,
}

/// Renderer-independent description of one station chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationChart {
    pub station: String,
    pub locale: Locale,
    pub title: String,
    pub date_axis: String,
    pub dates: Vec<NaiveDate>,
    pub series: Vec<ChartSeries>,
    pub primary_axis: AxisSpec,
    pub secondary_axis: AxisSpec,
}

impl StationChart {
    pub fn from_subset(
        subset: &WindowedSubset,
        locale: Locale,
        include_humidity: bool,
    ) -> Result<Self> {
        if subset.is_empty() {
            return Err(ProcessingError::EmptyWindow {
                station: subset.label.clone(),
            });
        }

        let rows = &subset.observations;
        let dates = rows.iter().map(|o| o.date).collect();

        let series_for = |kind: SeriesKind, axis: YAxis, style: SeriesStyle| ChartSeries {
            kind,
            name: locale.series_name(kind).to_string(),
            axis,
            style,
            values: rows
                .iter()
                .map(|o| match kind {
                    SeriesKind::Precipitation => o.precipitation,
                    SeriesKind::DryTemperature => o.dry_temp,
                    SeriesKind::MinTemperature => o.min_temp,
                    SeriesKind::MaxTemperature => o.max_temp,
                    SeriesKind::Humidity => o.humidity,
                })
                .collect(),
        };

        let mut series = vec![
            series_for(SeriesKind::Precipitation, YAxis::Primary, SeriesStyle::Line),
            series_for(
                SeriesKind::DryTemperature,
                YAxis::Secondary,
                SeriesStyle::DashedLine,
            ),
            series_for(
                SeriesKind::MinTemperature,
                YAxis::Secondary,
                SeriesStyle::Markers,
            ),
            series_for(
                SeriesKind::MaxTemperature,
                YAxis::Secondary,
                SeriesStyle::Markers,
            ),
        ];

        if include_humidity {
            series.push(series_for(
                SeriesKind::Humidity,
                YAxis::Primary,
                SeriesStyle::DashedLine,
            ));
        }

        Ok(Self {
            station: subset.label.clone(),
            locale,
            title: locale.title(&subset.label),
            date_axis: locale.date_axis().to_string(),
            dates,
            series,
            primary_axis: AxisSpec {
                title: locale.precipitation_axis().to_string(),
                range: PRECIPITATION_RANGE,
            },
            secondary_axis: AxisSpec {
                title: locale.temperature_axis().to_string(),
                range: TEMPERATURE_RANGE,
            },
        })
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn series_on(&self, axis: YAxis) -> impl Iterator<Item = &ChartSeries> {
        self.series.iter().filter(move |s| s.axis == axis)
    }
}
