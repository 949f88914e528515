//! Response shapes of the station, sensor and readings endpoints that the sync
//! pipeline decodes. Only the fields the pipeline relies on are modeled.

use crate::types::measure::MeasureDescriptor;
use serde::Deserialize;

/// Body of `/euskalmet/stations/{id}/current`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentStation {
    pub sensors: Vec<SensorRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorRef {
    /// Resource key such as `euskalmet/sensors/C17Z`.
    pub sensor_key: String,
}

impl SensorRef {
    /// The sensor id, i.e. the last segment of the key.
    pub fn sensor_id(&self) -> &str {
        self.sensor_key
            .rsplit('/')
            .next()
            .unwrap_or(self.sensor_key.as_str())
    }
}

/// Body of `/euskalmet/sensors/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorInfo {
    pub meteors: Vec<MeasureDescriptor>,
}

/// Body of a readings request for one measure during one hour.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReadings {
    /// Interval description; characters 6..16 hold the Unix seconds of its start.
    pub date_range: String,
    /// Canonical measure name, used as column name.
    pub measure: String,
    pub slots: Vec<Slot>,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Lower bound of the slot interval as `HH:MM` or `HH:MM:SS`, UTC.
    pub lower_end_point_desc: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_id_from_key() {
        let sensor = SensorRef {
            sensor_key: "euskalmet/sensors/C17Z".to_string(),
        };
        assert_eq!(sensor.sensor_id(), "C17Z");

        let bare = SensorRef {
            sensor_key: "C17Z".to_string(),
        };
        assert_eq!(bare.sensor_id(), "C17Z");
    }

    #[test]
    fn test_raw_readings_accepts_nulls() {
        let raw: RawReadings = serde_json::from_value(serde_json::json!({
            "dateRange": "/Date(1652979600000)/",
            "measure": "precipitation",
            "slots": [{ "lowerEndPointDesc": "17:00" }, { "lowerEndPointDesc": "17:10" }],
            "values": [0.2, null]
        }))
        .unwrap();
        assert_eq!(raw.values, vec![Some(0.2), None]);
        assert_eq!(raw.slots[1].lower_end_point_desc, "17:10");
    }
}
