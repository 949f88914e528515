//! Path templates of the Euskalmet API.
//!
//! Every function returns a path relative to the API base url. Date segments are
//! zero padded exactly as the API expects them (`YYYY/MM/DD/HH`, `YYYYMMDD`).

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

pub const API_DOMAIN: &str = "euskalmet";

pub fn stations() -> String {
    format!("/{API_DOMAIN}/stations")
}

pub fn station_current(station_id: &str) -> String {
    format!("/{API_DOMAIN}/stations/{station_id}/current")
}

pub fn sensors() -> String {
    format!("/{API_DOMAIN}/sensors")
}

pub fn sensor(sensor_id: &str) -> String {
    format!("/{API_DOMAIN}/sensors/{sensor_id}")
}

/// Readings of one measure of one sensor during the UTC hour of `at`.
pub fn station_readings(
    station_id: &str,
    sensor_id: &str,
    measure_type_id: &str,
    measure_id: &str,
    at: DateTime<Utc>,
) -> String {
    format!(
        "/{API_DOMAIN}/readings/forStation/{station_id}/{sensor_id}/measures/{measure_type_id}/{measure_id}/at/{:04}/{:02}/{:02}/{:02}",
        at.year(),
        at.month(),
        at.day(),
        at.hour()
    )
}

pub fn regions() -> String {
    format!("/{API_DOMAIN}/geo/regions")
}

pub fn region(region_id: &str) -> String {
    format!("/{API_DOMAIN}/geo/regions/{region_id}")
}

pub fn region_zones(region_id: &str) -> String {
    format!("/{API_DOMAIN}/geo/regions/{region_id}/zones")
}

pub fn zone_locations(region_id: &str, zone_id: &str) -> String {
    format!("/{API_DOMAIN}/geo/regions/{region_id}/zones/{zone_id}/locations")
}

pub fn region_forecast(region_id: &str, at: NaiveDate, forecast_date: NaiveDate) -> String {
    format!(
        "/{API_DOMAIN}/weather/regions/{region_id}/forecast/at/{}/for/{}",
        ymd_segments(at),
        forecast_date.format("%Y%m%d")
    )
}

pub fn location_forecast(
    region_id: &str,
    zone_id: &str,
    location_id: &str,
    at: NaiveDate,
    forecast_date: NaiveDate,
) -> String {
    format!(
        "/{API_DOMAIN}/weather/regions/{region_id}/zones/{zone_id}/locations/{location_id}/forecast/at/{}/for/{}",
        ymd_segments(at),
        forecast_date.format("%Y%m%d")
    )
}

pub fn location_last_report(
    region_id: &str,
    zone_id: &str,
    location_id: &str,
    date: NaiveDate,
) -> String {
    format!(
        "/{API_DOMAIN}/weather/regions/{region_id}/zones/{zone_id}/locations/{location_id}/reports/for/{}/last",
        ymd_segments(date)
    )
}

fn ymd_segments(date: NaiveDate) -> String {
    format!("{:04}/{:02}/{:02}", date.year(), date.month(), date.day())
}
