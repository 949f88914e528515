//! Incremental download of station observations into the per-station table.

use crate::api::endpoints;
use crate::api::fetcher::Fetch;
use crate::sync::batch::{plan_batches, Batch};
use crate::sync::error::SyncError;
use crate::sync::normalizer::normalize_response;
use crate::sync::sensor_catalog::SensorCatalog;
use crate::sync::table::{load_table, save_table, ObservationTable};
use crate::types::measure::SensorMap;
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use futures_util::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TABLE_FILE_SUFFIX: &str = "_OBS_MERGED.csv";

/// How the six hours of a batch are fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Concurrency {
    /// One hour after another, in order.
    Sequential,
    /// Up to [`Concurrency::workers`] hours at a time.
    #[default]
    Parallel,
}

impl Concurrency {
    pub fn workers(self) -> usize {
        match self {
            Concurrency::Sequential => 1,
            Concurrency::Parallel => num_cpus::get().saturating_sub(1).max(1),
        }
    }
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub station: String,
    pub batches_planned: usize,
    pub batches_written: usize,
    /// Batches that produced no rows.
    pub batches_skipped: usize,
    pub batches_failed: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} batches planned, {} written, {} empty, {} failed",
            self.station,
            self.batches_planned,
            self.batches_written,
            self.batches_skipped,
            self.batches_failed
        )
    }
}

enum BatchOutcome {
    Written,
    Empty,
}

pub type Clock = fn() -> DateTime<Utc>;

pub struct SyncEngine {
    fetcher: Arc<dyn Fetch>,
    catalog: Arc<SensorCatalog>,
    data_dir: PathBuf,
    tz: Tz,
    lookback: TimeDelta,
    clock: Clock,
}

impl SyncEngine {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        catalog: Arc<SensorCatalog>,
        data_dir: &Path,
        tz: Tz,
        lookback: TimeDelta,
    ) -> Self {
        Self {
            fetcher,
            catalog,
            data_dir: data_dir.to_path_buf(),
            tz,
            lookback,
            clock: Utc::now,
        }
    }

    /// Replaces the source of "now".
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn table_path(&self, station: &str) -> PathBuf {
        self.data_dir.join(format!("{station}{TABLE_FILE_SUFFIX}"))
    }

    /// Brings the station's table up to the last complete hour.
    ///
    /// Starts at `start` if given, otherwise at the latest persisted timestamp,
    /// otherwise at now minus the lookback. Each batch is merged and written
    /// before the next one starts. A failing batch is logged and counted; the
    /// run goes on with the next one.
    ///
    /// Nothing times out: a hung request blocks its batch, and with it the
    /// rest of the run. Concurrent runs for the same station must be
    /// serialized by the caller.
    pub async fn run(
        &self,
        station: &str,
        concurrency: Concurrency,
        start: Option<DateTime<Utc>>,
    ) -> Result<SyncReport, SyncError> {
        let now = (self.clock)();
        let path = self.table_path(station);

        let start = match start {
            Some(start) => start.with_timezone(&self.tz),
            None => {
                let persisted = load_table(path.clone(), station.to_string(), self.tz).await?;
                match persisted.as_ref().and_then(|t| t.last_timestamp()) {
                    Some(last) => *last,
                    None => (now - self.lookback).with_timezone(&self.tz),
                }
            }
        };
        let end = (now - TimeDelta::hours(1)).with_timezone(&self.tz);

        let batches = plan_batches(&start, &end);
        info!(
            "Syncing {} from {} to {} in {} batches ({:?})",
            station,
            start,
            end,
            batches.len(),
            concurrency
        );

        let mut report = SyncReport {
            station: station.to_string(),
            batches_planned: batches.len(),
            ..SyncReport::default()
        };

        for batch in &batches {
            match self.sync_batch(station, batch, concurrency, &path).await {
                Ok(BatchOutcome::Written) => report.batches_written += 1,
                Ok(BatchOutcome::Empty) => {
                    debug!("No readings for {} starting {}", station, batch.first());
                    report.batches_skipped += 1;
                }
                Err(e) => {
                    error!(
                        "Batch {} - {} for {} failed: {}",
                        batch.first(),
                        batch.last(),
                        station,
                        e
                    );
                    report.batches_failed += 1;
                }
            }
        }

        info!("{}", report);
        Ok(report)
    }

    async fn sync_batch(
        &self,
        station: &str,
        batch: &Batch<Tz>,
        concurrency: Concurrency,
        path: &Path,
    ) -> Result<BatchOutcome, SyncError> {
        let sensors = self.catalog.resolve(station).await?;
        let frame = self.fetch_batch(station, &sensors, batch, concurrency).await;
        if frame.is_empty() {
            return Ok(BatchOutcome::Empty);
        }

        let mut table = load_table(path.to_path_buf(), station.to_string(), self.tz)
            .await?
            .unwrap_or_else(|| ObservationTable::new(station));
        table.merge(frame);
        debug!(
            "Writing {} rows for {} up to {}",
            table.len(),
            station,
            batch.last()
        );
        save_table(table, path.to_path_buf()).await?;
        Ok(BatchOutcome::Written)
    }

    async fn fetch_batch(
        &self,
        station: &str,
        sensors: &SensorMap,
        batch: &Batch<Tz>,
        concurrency: Concurrency,
    ) -> ObservationTable {
        let mut frames: Vec<(usize, ObservationTable)> =
            stream::iter(batch.hours().iter().enumerate())
                .map(|(index, hour)| async move {
                    (index, self.readings_at(station, sensors, hour).await)
                })
                .buffer_unordered(concurrency.workers())
                .collect()
                .await;
        // Completion order must not leak into the column order.
        frames.sort_by_key(|(index, _)| *index);

        let mut batch_frame = ObservationTable::new(station);
        for (_, frame) in frames {
            batch_frame.merge(frame);
        }
        batch_frame
    }

    /// Every measure of every sensor of `station` during the hour of `hour`.
    ///
    /// A reading that cannot be fetched or decoded is logged and left out.
    pub async fn readings_at(
        &self,
        station: &str,
        sensors: &SensorMap,
        hour: &DateTime<Tz>,
    ) -> ObservationTable {
        let at = hour.with_timezone(&Utc);
        let mut frame = ObservationTable::new(station);

        for (sensor_id, descriptors) in sensors {
            for descriptor in descriptors {
                let path = endpoints::station_readings(
                    station,
                    sensor_id,
                    &descriptor.measure_type,
                    &descriptor.measure_id,
                    at,
                );
                let body = match self.fetcher.fetch(&path).await {
                    Ok(body) => body,
                    Err(e) => {
                        debug!("No {} from {} at {}: {}", descriptor.measure_id, sensor_id, at, e);
                        continue;
                    }
                };
                match normalize_response(&path, body, descriptor, self.tz) {
                    Ok(series) => frame.push_series(series),
                    Err(e) => warn!("Skipping {}: {}", path, e),
                }
            }
        }
        frame
    }
}
