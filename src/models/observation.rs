use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily row of the input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub station: String,
    pub date: NaiveDate,

    // Millimetres
    pub precipitation: Option<f64>,

    // Degrees Celsius
    pub min_temp: Option<f64>,
    pub dry_temp: Option<f64>,
    pub max_temp: Option<f64>,

    // Percent
    pub humidity: Option<f64>,
}

impl Observation {
    pub fn new(
        station: String,
        date: NaiveDate,
        precipitation: Option<f64>,
        min_temp: Option<f64>,
        dry_temp: Option<f64>,
        max_temp: Option<f64>,
    ) -> Self {
        Self {
            station,
            date,
            precipitation,
            min_temp,
            dry_temp,
            max_temp,
            humidity: None,
        }
    }

    pub fn with_humidity(mut self, humidity: Option<f64>) -> Self {
        self.humidity = humidity;
        self
    }
}
