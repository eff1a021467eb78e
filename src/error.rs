use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read input file {path}: {source}")]
    InputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column '{column}' in input header")]
    MissingColumn { column: String },

    #[error("Invalid date '{value}' on line {line} (expected DD/MM/YYYY)")]
    InvalidDate { line: usize, value: String },

    #[error("Input is not valid text: {0}")]
    Encoding(String),

    #[error("Cannot create output directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Station '{station}' has no observations in its window")]
    EmptyWindow { station: String },

    #[error("Rendering failed for station '{station}': {message}")]
    Render { station: String, message: String },

    #[error("Chart serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Processing cancelled by user")]
    Cancelled,

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Scope of a failure: whether it aborts the run or only the current station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Directory,
    Render,
    Config,
    Cancelled,
    Internal,
}

impl ProcessingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProcessingError::InputFile { .. }
            | ProcessingError::Csv(_)
            | ProcessingError::MissingColumn { .. }
            | ProcessingError::InvalidDate { .. }
            | ProcessingError::Encoding(_) => ErrorCategory::Parse,
            ProcessingError::Directory { .. } => ErrorCategory::Directory,
            ProcessingError::EmptyWindow { .. }
            | ProcessingError::Render { .. }
            | ProcessingError::Json(_)
            | ProcessingError::Io(_) => ErrorCategory::Render,
            ProcessingError::Config(_) | ProcessingError::Validation(_) => ErrorCategory::Config,
            ProcessingError::Cancelled => ErrorCategory::Cancelled,
            ProcessingError::TaskJoin(_) => ErrorCategory::Internal,
        }
    }

    /// Fatal errors abort the whole run; render errors are scoped to one station.
    pub fn is_fatal(&self) -> bool {
        self.category() != ErrorCategory::Render
    }

    pub fn render(station: &str, message: impl Into<String>) -> Self {
        ProcessingError::Render {
            station: station.to_string(),
            message: message.into(),
        }
    }
}
