//! In-memory [`Fetch`] implementation for tests.

use crate::api::error::ApiError;
use crate::api::fetcher::Fetch;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Mutex;

type Handler = Box<dyn Fn(&str) -> Result<Value, ApiError> + Send + Sync>;

pub(crate) struct MockFetcher {
    handler: Handler,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub(crate) fn new(
        handler: impl Fn(&str) -> Result<Value, ApiError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A station with two sensors: `S1` reports `precipitation`, `S2` reports
    /// `mean_speed` in m/s. Every reading hour returns a single slot whose value
    /// is the UTC hour of the request.
    pub(crate) fn two_sensor_station(station: &str) -> Self {
        let station = station.to_string();
        Self::new(move |path| two_sensor_response(&station, path))
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, path: &str) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(path.to_string());
        (self.handler)(path)
    }
}

pub(crate) fn not_found(path: &str) -> ApiError {
    ApiError::HttpStatus {
        status: 404,
        reason: "Not Found".to_string(),
        url: path.to_string(),
    }
}

pub(crate) fn two_sensor_response(station: &str, path: &str) -> Result<Value, ApiError> {
    if path == format!("/euskalmet/stations/{station}/current") {
        return Ok(json!({
            "station": station,
            "sensors": [
                { "sensorKey": "euskalmet/sensors/S1" },
                { "sensorKey": "euskalmet/sensors/S2" }
            ]
        }));
    }
    if path == "/euskalmet/sensors/S1" {
        return Ok(json!({
            "sensorId": "S1",
            "meteors": [{ "measureType": "measuresForWater", "measureId": "precipitation" }]
        }));
    }
    if path == "/euskalmet/sensors/S2" {
        return Ok(json!({
            "sensorId": "S2",
            "meteors": [{ "measureType": "measuresForWind", "measureId": "mean_speed" }]
        }));
    }
    if path.starts_with(&format!("/euskalmet/readings/forStation/{station}/")) {
        return hourly_reading(path).ok_or_else(|| not_found(path));
    }
    Err(not_found(path))
}

/// Builds a one-slot readings response for a `.../measures/{type}/{id}/at/YYYY/MM/DD/HH` path.
pub(crate) fn hourly_reading(path: &str) -> Option<Value> {
    let segments: Vec<&str> = path.split('/').collect();
    let at = segments.iter().position(|s| *s == "at")?;
    let measure_id = segments.get(at.checked_sub(1)?)?;
    let year: i32 = segments.get(at + 1)?.parse().ok()?;
    let month: u32 = segments.get(at + 2)?.parse().ok()?;
    let day: u32 = segments.get(at + 3)?.parse().ok()?;
    let hour: u32 = segments.get(at + 4)?.parse().ok()?;
    let start = Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single()?;

    Some(readings_json(
        start.timestamp(),
        measure_id,
        &[&format!("{hour:02}:00")],
        &[json!(hour as f64)],
    ))
}

pub(crate) fn readings_json(epoch_seconds: i64, measure: &str, slots: &[&str], values: &[Value]) -> Value {
    let slots: Vec<Value> = slots
        .iter()
        .map(|desc| json!({ "lowerEndPointDesc": desc }))
        .collect();
    json!({
        "dateRange": format!("/Date({epoch_seconds}000)/"),
        "measure": measure,
        "slots": slots,
        "values": values,
    })
}
