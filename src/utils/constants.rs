use crate::models::AxisRange;

/// Input columns
pub const COL_STATION: &str = "Nombre";
pub const COL_DATE: &str = "fecha";
pub const COL_PRECIPITATION: &str = "lluvia";
pub const COL_MIN_TEMP: &str = "tmin";
pub const COL_DRY_TEMP: &str = "tseca";
pub const COL_MAX_TEMP: &str = "tmax";
pub const COL_HUMIDITY: &str = "hum_rel";

pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_STATION,
    COL_DATE,
    COL_PRECIPITATION,
    COL_MIN_TEMP,
    COL_DRY_TEMP,
    COL_MAX_TEMP,
];

/// Input date format (DD/MM/YYYY)
pub const INPUT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Trailing window length, inclusive of both ends
pub const WINDOW_DAYS: i64 = 30;

/// Fixed axis ranges
pub const PRECIPITATION_RANGE: AxisRange = AxisRange::new(-5.0, 90.0);
pub const TEMPERATURE_RANGE: AxisRange = AxisRange::new(-5.0, 40.0);

/// Output directory names under the chosen output folder
pub const IMAGE_DIR: &str = "img_output";
pub const DOCUMENT_DIR: &str = "html_output";

/// Output extensions
pub const DOCUMENT_EXTENSION: &str = "html";
pub const IMAGE_EXTENSION: &str = "png";

/// Static image defaults
pub const DEFAULT_IMAGE_WIDTH: u32 = 1000;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 500;

/// Interactive document defaults
pub const DEFAULT_DOCUMENT_WIDTH: u32 = 800;
pub const DEFAULT_DOCUMENT_HEIGHT: u32 = 400;
pub const PLOTLY_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "STATION_CHARTS";

/// Fonts tried when no font file is configured
pub const FONT_CANDIDATES: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];
