pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use filename::{document_file_name, image_file_name, station_label, DocumentNaming};
pub use logging::init_logging;
pub use progress::ProgressReporter;
