use crate::models::{StationGroup, WindowedSubset};
use crate::utils::constants::WINDOW_DAYS;
use crate::utils::filename::station_label;
use chrono::Duration;

/// Trailing window anchored on each station's own latest date.
pub struct TrailingWindow {
    days: i64,
}

impl TrailingWindow {
    pub fn new() -> Self {
        Self { days: WINDOW_DAYS }
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    /// Keep rows with `date >= latest - days`, sorted by date (stable), labels normalized.
    ///
    /// Returns `None` for an empty group.
    pub fn apply(&self, group: &StationGroup) -> Option<WindowedSubset> {
        let latest = group.latest_date()?;
        let start = latest - Duration::days(self.days);
        let label = station_label(&group.key);

        let mut observations: Vec<_> = group
            .observations
            .iter()
            .filter(|o| o.date >= start)
            .cloned()
            .collect();
        observations.sort_by_key(|o| o.date);

        for observation in &mut observations {
            observation.station = station_label(&observation.station);
        }

        Some(WindowedSubset {
            key: group.key.clone(),
            label,
            start,
            latest,
            observations,
        })
    }
}

impl Default for TrailingWindow {
    fn default() -> Self {
        Self::new()
    }
}
