//! Access to the station, sensor and readings endpoints.

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::fetcher::Fetch;
use bon::bon;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Raw access to station and sensor metadata and single-hour readings.
///
/// Obtained through [`crate::Euskalmet::stations()`]. Responses are returned
/// as decoded JSON, exactly as the API sends them.
#[derive(Clone)]
pub struct StationsClient {
    fetcher: Arc<dyn Fetch>,
}

#[bon]
impl StationsClient {
    pub(crate) fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self { fetcher }
    }

    /// Every station of the network.
    pub async fn list(&self) -> Result<Value, ApiError> {
        self.fetcher.fetch(&endpoints::stations()).await
    }

    /// Current data of a station, including the keys of its sensors.
    pub async fn current(&self, station: &str) -> Result<Value, ApiError> {
        self.fetcher.fetch(&endpoints::station_current(station)).await
    }

    /// Every sensor of the network.
    pub async fn sensors(&self) -> Result<Value, ApiError> {
        self.fetcher.fetch(&endpoints::sensors()).await
    }

    /// One sensor, with the measures it reports under `meteors`.
    pub async fn sensor(&self, sensor_id: &str) -> Result<Value, ApiError> {
        self.fetcher.fetch(&endpoints::sensor(sensor_id)).await
    }

    /// Readings of one measure of one sensor during the UTC hour of `at`.
    ///
    /// ```no_run
    /// # use euskalmet::{Euskalmet, EuskalmetError};
    /// # use chrono::{TimeZone, Utc};
    /// # async fn run() -> Result<(), EuskalmetError> {
    /// let client = Euskalmet::new().await?;
    /// let readings = client
    ///     .stations()
    ///     .readings()
    ///     .station("C017")
    ///     .sensor("C17Z")
    ///     .measure_type("measuresForWind")
    ///     .measure_id("mean_speed")
    ///     .at(Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap())
    ///     .call()
    ///     .await?;
    /// println!("{readings}");
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn readings(
        &self,
        station: &str,
        sensor: &str,
        measure_type: &str,
        measure_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Value, ApiError> {
        let path = endpoints::station_readings(station, sensor, measure_type, measure_id, at);
        self.fetcher.fetch(&path).await
    }
}
