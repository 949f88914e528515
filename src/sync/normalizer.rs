//! Turns one readings response (one measure, one hour) into a time-indexed column.

use crate::sync::error::SyncError;
use crate::types::measure::{MeasureDescriptor, KMH_PER_MS};
use crate::types::station::RawReadings;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

/// Byte range of the Unix seconds inside `dateRange` (`/Date(1652979600000)/`).
///
/// Fixed by the upstream format and fragile: any change in that string's
/// prefix breaks the reference date.
const DATE_RANGE_SECONDS: std::ops::Range<usize> = 6..16;

/// A single measure's values, indexed by local timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureSeries {
    pub name: String,
    pub points: Vec<(DateTime<Tz>, f64)>,
}

impl MeasureSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Decodes `body` as a readings response fetched from `path` and normalizes it.
pub fn normalize_response(
    path: &str,
    body: Value,
    descriptor: &MeasureDescriptor,
    tz: Tz,
) -> Result<MeasureSeries, SyncError> {
    let raw: RawReadings =
        serde_json::from_value(body).map_err(|e| SyncError::UnexpectedShape {
            path: path.to_string(),
            source: e,
        })?;
    normalize(&raw, descriptor, tz)
}

/// Builds the series for one readings response.
///
/// Slot times are UTC wall-clock times on the UTC date of the reference
/// timestamp; the resulting index is expressed in `tz`. Missing values become
/// NaN and speed measures are converted from m/s to km/h.
pub fn normalize(
    raw: &RawReadings,
    descriptor: &MeasureDescriptor,
    tz: Tz,
) -> Result<MeasureSeries, SyncError> {
    if raw.slots.len() != raw.values.len() {
        return Err(SyncError::SlotValueMismatch {
            measure: raw.measure.clone(),
            slots: raw.slots.len(),
            values: raw.values.len(),
        });
    }

    let reference = reference_timestamp(&raw.date_range, tz)?;
    let reference_date = reference.with_timezone(&Utc).date_naive();

    let factor = if descriptor.is_speed() { KMH_PER_MS } else { 1.0 };

    let points = raw
        .slots
        .iter()
        .zip(&raw.values)
        .map(|(slot, value)| {
            let time = parse_slot_time(&slot.lower_end_point_desc)?;
            let timestamp = Utc
                .from_utc_datetime(&reference_date.and_time(time))
                .with_timezone(&tz);
            Ok((timestamp, value.unwrap_or(f64::NAN) * factor))
        })
        .collect::<Result<Vec<_>, SyncError>>()?;

    Ok(MeasureSeries {
        name: raw.measure.clone(),
        points,
    })
}

/// Reads the reference instant embedded in a `dateRange` string.
pub fn reference_timestamp(date_range: &str, tz: Tz) -> Result<DateTime<Tz>, SyncError> {
    let malformed = || SyncError::MalformedDateRange(date_range.to_string());
    let seconds: i64 = date_range
        .get(DATE_RANGE_SECONDS)
        .ok_or_else(malformed)?
        .parse()
        .map_err(|_| malformed())?;
    let instant = Utc.timestamp_opt(seconds, 0).single().ok_or_else(malformed)?;
    Ok(instant.with_timezone(&tz))
}

fn parse_slot_time(desc: &str) -> Result<NaiveTime, SyncError> {
    NaiveTime::parse_from_str(desc, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(desc, "%H:%M"))
        .map_err(|_| SyncError::MalformedSlot(desc.to_string()))
}
