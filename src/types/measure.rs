//! Measure descriptors as reported by the sensors endpoint and cached per station.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Measure ids reported in m/s that are stored in km/h.
pub const SPEED_MEASURE_IDS: [&str; 3] = ["max_speed", "speed_sigma", "mean_speed"];

pub const KMH_PER_MS: f64 = 3.6;

/// One measure a sensor can report, identified by its type/id pair.
///
/// Fields other than `measureType` and `measureId` are kept as received so
/// the cache file round-trips the upstream object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDescriptor {
    /// Measure type id, e.g. `measuresForWater`.
    pub measure_type: String,
    /// Measure id, e.g. `precipitation`.
    pub measure_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MeasureDescriptor {
    pub fn new(measure_type: impl Into<String>, measure_id: impl Into<String>) -> Self {
        Self {
            measure_type: measure_type.into(),
            measure_id: measure_id.into(),
            extra: Map::new(),
        }
    }

    pub fn is_speed(&self) -> bool {
        SPEED_MEASURE_IDS.contains(&self.measure_id.as_str())
    }
}

/// Sensor id to the measures that sensor reports.
pub type SensorMap = BTreeMap<String, Vec<MeasureDescriptor>>;
