use crate::models::ArtifactPaths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationFailure {
    pub station: String,
    pub message: String,
}

/// Outcome of one batch run, in station order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub stations_total: usize,
    pub observations_total: usize,
    pub succeeded: Vec<(String, ArtifactPaths)>,
    pub failed: Vec<StationFailure>,
    pub skipped: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Distinct files on disk. Stations sharing a label overwrite each other.
    pub fn artifact_count(&self) -> usize {
        self.succeeded
            .iter()
            .flat_map(|(_, paths)| [&paths.document, &paths.image])
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn status_message(&self) -> String {
        if self.stations_total == 0 {
            return "No stations found in input; nothing to render".to_string();
        }

        if self.is_success() {
            return format!(
                "Charts generated for {} station{}",
                self.succeeded.len(),
                if self.succeeded.len() == 1 { "" } else { "s" }
            );
        }

        let names: Vec<&str> = self.failed.iter().map(|f| f.station.as_str()).collect();
        format!(
            "Charts generated for {} of {} stations; {} failed: {}",
            self.succeeded.len(),
            self.stations_total,
            self.failed.len(),
            names.join(", ")
        )
    }
}
