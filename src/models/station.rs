use crate::models::Observation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All observations sharing one raw station key, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationGroup {
    pub key: String,
    pub observations: Vec<Observation>,
}

impl StationGroup {
    pub fn new(key: String) -> Self {
        Self {
            key,
            observations: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.observations.iter().map(|o| o.date).max()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.observations.iter().map(|o| o.date).min()
    }
}

/// The trailing window of one station, sorted by date, with the label already normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedSubset {
    /// Raw grouping key as it appeared in the input
    pub key: String,
    /// Display and file name label (underscores replaced by spaces)
    pub label: String,
    /// Inclusive lower bound of the window
    pub start: NaiveDate,
    pub latest: NaiveDate,
    pub observations: Vec<Observation>,
}

impl WindowedSubset {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// `MM-YYYY` of the latest observation.
    pub fn month_year_tag(&self) -> String {
        self.latest.format("%m-%Y").to_string()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }
}

/// Files written for one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub document: PathBuf,
    pub image: PathBuf,
}
