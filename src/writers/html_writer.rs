use crate::error::Result;
use crate::models::{ChartSeries, SeriesKind, SeriesStyle, StationChart, YAxis};
use crate::utils::constants::{DEFAULT_DOCUMENT_HEIGHT, DEFAULT_DOCUMENT_WIDTH, PLOTLY_CDN_URL};
use crate::writers::ChartRenderer;
use serde::Serialize;
use serde_json::json;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
struct Trace<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    mode: &'static str,
    x: Vec<String>,
    y: &'a [Option<f64>],
    yaxis: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    marker: Option<serde_json::Value>,
    hovertemplate: String,
}

fn series_color(kind: SeriesKind) -> &'static str {
    match kind {
        SeriesKind::Precipitation => "navy",
        SeriesKind::DryTemperature => "seagreen",
        SeriesKind::MinTemperature => "deepskyblue",
        SeriesKind::MaxTemperature => "firebrick",
        SeriesKind::Humidity => "orange",
    }
}

fn build_trace<'a>(series: &'a ChartSeries, x: &[String]) -> Trace<'a> {
    let color = series_color(series.kind);
    let (mode, line, marker) = match series.style {
        SeriesStyle::Line => ("lines", Some(json!({ "color": color, "width": 2 })), None),
        SeriesStyle::DashedLine => (
            "lines",
            Some(json!({ "color": color, "width": 2, "dash": "dash" })),
            None,
        ),
        SeriesStyle::Markers => ("markers", None, Some(json!({ "color": color, "size": 7 }))),
    };

    Trace {
        kind: "scatter",
        name: &series.name,
        mode,
        x: x.to_vec(),
        y: &series.values,
        yaxis: match series.axis {
            YAxis::Primary => "y",
            YAxis::Secondary => "y2",
        },
        line,
        marker,
        hovertemplate: format!("{}: %{{y}}<extra></extra>", series.name),
    }
}

/// Interactive chart written as a standalone HTML page driven by Plotly.
pub struct HtmlChartWriter {
    width: u32,
    height: u32,
}

impl HtmlChartWriter {
    pub fn new() -> Self {
        Self {
            width: DEFAULT_DOCUMENT_WIDTH,
            height: DEFAULT_DOCUMENT_HEIGHT,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Plotly `data` and `layout` for the chart.
    pub fn figure(&self, chart: &StationChart) -> serde_json::Value {
        let x: Vec<String> = chart
            .dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect();
        let data: Vec<Trace<'_>> = chart.series.iter().map(|s| build_trace(s, &x)).collect();

        let primary = chart.primary_axis.range;
        let secondary = chart.secondary_axis.range;

        json!({
            "data": data,
            "layout": {
                "title": { "text": chart.title },
                "width": self.width,
                "height": self.height,
                "hovermode": "x unified",
                "xaxis": { "title": { "text": chart.date_axis }, "type": "date" },
                "yaxis": {
                    "title": { "text": chart.primary_axis.title },
                    "range": [primary.min, primary.max],
                },
                "yaxis2": {
                    "title": { "text": chart.secondary_axis.title },
                    "range": [secondary.min, secondary.max],
                    "overlaying": "y",
                    "side": "right",
                },
                "legend": { "orientation": "h", "y": -0.25 },
            }
        })
    }

    pub fn write_document<W: Write>(&self, chart: &StationChart, out: &mut W) -> Result<()> {
        let figure = serde_json::to_string(&self.figure(chart))?;
        // Keep "</script>" inside string values from closing the tag
        let figure = figure.replace('<', "\\u003c");
        let title = html_escape(&chart.title);

        write!(
            out,
            r##"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="{cdn}" charset="utf-8"></script>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            padding: 20px;
            background: #fff;
        }}
    </style>
</head>
<body>
    <div id="chart"></div>
    <script>
        const figure = {figure};
        Plotly.newPlot("chart", figure.data, figure.layout, {{ responsive: true }});
    </script>
</body>
</html>
"##,
            lang = chart.locale,
            title = title,
            cdn = PLOTLY_CDN_URL,
            figure = figure,
        )?;

        Ok(())
    }
}

impl Default for HtmlChartWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer for HtmlChartWriter {
    fn render(&self, chart: &StationChart, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_document(chart, &mut out)?;
        out.flush()?;
        Ok(())
    }
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
