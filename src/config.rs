use crate::error::{ProcessingError, Result};
use crate::models::Locale;
use crate::utils::constants::{
    DEFAULT_DOCUMENT_HEIGHT, DEFAULT_DOCUMENT_WIDTH, DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH,
    DOCUMENT_DIR, ENV_PREFIX, IMAGE_DIR,
};
use crate::utils::filename::DocumentNaming;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

/// Run settings: built-in defaults, then an optional TOML file, then
/// `STATION_CHARTS__*` environment variables. CLI flags are applied on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    #[validate(length(min = 1))]
    pub image_dir_name: String,

    #[validate(length(min = 1))]
    pub document_dir_name: String,

    pub naming: DocumentNaming,

    pub locale: Locale,

    pub include_humidity: bool,

    #[validate(range(min = 1, max = 256))]
    pub max_workers: usize,

    #[validate(range(min = 200, max = 8000))]
    pub image_width: u32,

    #[validate(range(min = 150, max = 8000))]
    pub image_height: u32,

    #[validate(range(min = 200, max = 8000))]
    pub document_width: u32,

    #[validate(range(min = 150, max = 8000))]
    pub document_height: u32,

    /// TTF file used for chart text in static images
    pub font_path: Option<PathBuf>,

    pub use_mmap: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_dir_name: IMAGE_DIR.to_string(),
            document_dir_name: DOCUMENT_DIR.to_string(),
            naming: DocumentNaming::default(),
            locale: Locale::default(),
            include_humidity: false,
            max_workers: num_cpus::get().clamp(1, 256),
            image_width: DEFAULT_IMAGE_WIDTH,
            image_height: DEFAULT_IMAGE_HEIGHT,
            document_width: DEFAULT_DOCUMENT_WIDTH,
            document_height: DEFAULT_DOCUMENT_HEIGHT,
            font_path: None,
            use_mmap: false,
        }
    }
}

impl Settings {
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_error)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = file {
            debug!("Loading settings from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;

        settings.validate()?;
        Ok(settings)
    }
}

fn config_error(err: config::ConfigError) -> ProcessingError {
    ProcessingError::Config(err.to_string())
}
