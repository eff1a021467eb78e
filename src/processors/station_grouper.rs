use crate::models::{Observation, StationGroup};
use crate::utils::filename::station_label;
use std::collections::HashMap;
use tracing::warn;

pub struct StationGrouper;

impl StationGrouper {
    pub fn new() -> Self {
        Self
    }

    /// Partition observations by exact station key, groups in first-seen order.
    pub fn group_by_station(&self, observations: Vec<Observation>) -> Vec<StationGroup> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<StationGroup> = Vec::new();

        for observation in observations {
            let slot = match index.get(&observation.station) {
                Some(&slot) => slot,
                None => {
                    let slot = groups.len();
                    index.insert(observation.station.clone(), slot);
                    groups.push(StationGroup::new(observation.station.clone()));
                    slot
                }
            };
            groups[slot].observations.push(observation);
        }

        groups
    }

    /// Group indices bucketed by output label, buckets in first-seen order.
    ///
    /// Groups in one bucket write the same files and must be rendered in input
    /// order so the last of them wins.
    pub fn label_lanes(&self, groups: &[StationGroup]) -> Vec<Vec<usize>> {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut lanes: Vec<Vec<usize>> = Vec::new();

        for (i, group) in groups.iter().enumerate() {
            let label = station_label(&group.key);
            match slots.get(&label) {
                Some(&slot) => lanes[slot].push(i),
                None => {
                    slots.insert(label, lanes.len());
                    lanes.push(vec![i]);
                }
            }
        }

        lanes
    }

    /// Raw keys that collapse onto the same label once underscores become spaces.
    ///
    /// Their artifacts share file names, so the later station overwrites the earlier one.
    pub fn label_collisions(&self, groups: &[StationGroup]) -> Vec<(String, Vec<String>)> {
        let collisions: Vec<(String, Vec<String>)> = self
            .label_lanes(groups)
            .into_iter()
            .filter(|lane| lane.len() > 1)
            .map(|lane| {
                let label = station_label(&groups[lane[0]].key);
                let keys = lane.iter().map(|&i| groups[i].key.clone()).collect();
                (label, keys)
            })
            .collect();

        for (label, keys) in &collisions {
            warn!(
                "Stations {:?} share the label '{}'; the last one in the input wins",
                keys, label
            );
        }

        collisions
    }
}

impl Default for StationGrouper {
    fn default() -> Self {
        Self::new()
    }
}
