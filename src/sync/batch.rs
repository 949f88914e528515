//! Planning of the hours a sync run has to fetch.

use chrono::{DateTime, LocalResult, TimeDelta, TimeZone, Timelike};

/// Number of consecutive hours fetched and persisted together.
pub const BATCH_HOURS: usize = 6;

/// Six consecutive, hour-aligned timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<Tz: TimeZone> {
    hours: Vec<DateTime<Tz>>,
}

impl<Tz: TimeZone> Batch<Tz> {
    pub fn hours(&self) -> &[DateTime<Tz>] {
        &self.hours
    }

    pub fn first(&self) -> &DateTime<Tz> {
        &self.hours[0]
    }

    pub fn last(&self) -> &DateTime<Tz> {
        &self.hours[BATCH_HOURS - 1]
    }
}

/// Truncates `dt` to the start of its local hour.
///
/// Works on wall-clock time, so zones with half-hour offsets stay aligned to
/// their own hours. During a repeated (fall-back) hour the occurrence `dt`
/// belongs to is kept.
pub fn floor_hour<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<Tz> {
    let local = dt.naive_local();
    let Some(start_of_hour) = local.date().and_hms_opt(local.hour(), 0, 0) else {
        return floor_utc_hour(dt);
    };
    match dt.timezone().from_local_datetime(&start_of_hour) {
        LocalResult::Single(floored) => floored,
        LocalResult::Ambiguous(earliest, latest) => {
            if &latest <= dt {
                latest
            } else {
                earliest
            }
        }
        // The start of the hour falls in a gap; only possible with sub-hour DST shifts.
        LocalResult::None => floor_utc_hour(dt),
    }
}

fn floor_utc_hour<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<Tz> {
    let into_hour = TimeDelta::seconds(dt.timestamp().rem_euclid(3600))
        + TimeDelta::nanoseconds(i64::from(dt.timestamp_subsec_nanos()));
    dt.clone() - into_hour
}

/// Hourly timestamps from `start` to `end` (both floored, inclusive), extended
/// backwards until the count is a multiple of [`BATCH_HOURS`].
///
/// The last element is always the floored `end`. Returns an empty sequence
/// when `start` is after `end`.
pub fn hourly_range<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> Vec<DateTime<Tz>> {
    let start = floor_hour(start);
    let end = floor_hour(end);
    if start > end {
        return Vec::new();
    }

    let hours = (end.clone() - start.clone()).num_hours() as usize + 1;
    let padding = (BATCH_HOURS - hours % BATCH_HOURS) % BATCH_HOURS;
    let first = start - TimeDelta::hours(padding as i64);

    (0..hours + padding)
        .map(|i| first.clone() + TimeDelta::hours(i as i64))
        .collect()
}

/// Splits the padded hourly range between `start` and `end` into batches, in
/// chronological order.
pub fn plan_batches<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> Vec<Batch<Tz>> {
    hourly_range(start, end)
        .chunks_exact(BATCH_HOURS)
        .map(|hours| Batch {
            hours: hours.to_vec(),
        })
        .collect()
}
