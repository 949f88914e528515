//! The per-station observation table and its CSV persistence.
//!
//! On disk the table is a CSV file with a `DATE` column (`YYYY-MM-DD HH:MM:SS±HH:MM`),
//! one column per measure and a constant `station` column. Missing values are
//! empty cells. The file is always rewritten in full.

use crate::sync::error::SyncError;
use crate::sync::normalizer::MeasureSeries;
use chrono::DateTime;
use chrono_tz::Tz;
use log::debug;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

pub const DATE_COLUMN: &str = "DATE";
pub const STATION_COLUMN: &str = "station";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";
const TIMESTAMP_PARSE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Observations of one station, indexed by unique local timestamps kept in
/// ascending order.
///
/// Missing values are simply absent from a row; NaN is never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    station: String,
    columns: Vec<String>,
    rows: BTreeMap<DateTime<Tz>, BTreeMap<String, f64>>,
}

impl ObservationTable {
    pub fn new(station: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            columns: Vec::new(),
            rows: BTreeMap::new(),
        }
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    /// Measure column names, in order of first appearance.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &DateTime<Tz>> {
        self.rows.keys()
    }

    pub fn first_timestamp(&self) -> Option<&DateTime<Tz>> {
        self.rows.keys().next()
    }

    /// The sync cursor: the latest timestamp in the table.
    pub fn last_timestamp(&self) -> Option<&DateTime<Tz>> {
        self.rows.keys().next_back()
    }

    /// Value of `column` at `timestamp`, `None` when missing.
    pub fn value(&self, timestamp: &DateTime<Tz>, column: &str) -> Option<f64> {
        self.rows.get(timestamp)?.get(column).copied()
    }

    /// Adds a measure column. Rows are created for every timestamp of the
    /// series, even where the value is missing.
    pub fn push_series(&mut self, series: MeasureSeries) {
        self.register_column(&series.name);
        for (timestamp, value) in series.points {
            let row = self.rows.entry(timestamp).or_default();
            if !value.is_nan() {
                row.insert(series.name.clone(), value);
            }
        }
    }

    /// Merges `newer` into this table.
    ///
    /// Timestamps only present in `newer` are appended. For shared timestamps
    /// every value present in `newer` overwrites the current one; values
    /// missing in `newer` leave the current ones untouched. Columns new to this
    /// table are added after the existing ones.
    pub fn merge(&mut self, newer: ObservationTable) {
        for column in &newer.columns {
            self.register_column(column);
        }
        for (timestamp, values) in newer.rows {
            self.rows.entry(timestamp).or_default().extend(values);
        }
    }

    fn register_column(&mut self, name: &str) {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
    }

    /// `DATE`, the measure columns, then `station`.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<String> = self
            .rows
            .keys()
            .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .collect();

        let mut columns = Vec::with_capacity(self.columns.len() + 2);
        columns.push(Column::from(Series::new(DATE_COLUMN.into(), dates)));
        for name in &self.columns {
            let values: Vec<Option<f64>> = self
                .rows
                .values()
                .map(|row| row.get(name).copied())
                .collect();
            columns.push(Column::from(Series::new(name.as_str().into(), values)));
        }
        columns.push(Column::from(Series::new(
            STATION_COLUMN.into(),
            vec![self.station.as_str(); self.rows.len()],
        )));

        DataFrame::new(columns)
    }

    /// Rebuilds a table from a frame laid out like [`Self::to_dataframe`].
    ///
    /// Timestamps are re-localized to `tz`; the `station` column is ignored in
    /// favour of `station`. Any other column is read as a float measure.
    pub fn from_dataframe(station: &str, tz: Tz, df: &DataFrame) -> Result<Self, SyncError> {
        let dates = df
            .column(DATE_COLUMN)
            .map_err(|_| SyncError::MissingColumn(DATE_COLUMN.to_string()))?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let timestamps = dates
            .str()?
            .into_iter()
            .map(|value| parse_timestamp(value.unwrap_or_default(), tz))
            .collect::<Result<Vec<_>, _>>()?;

        let mut table = ObservationTable::new(station);
        for timestamp in &timestamps {
            table.rows.entry(*timestamp).or_default();
        }

        let measure_columns: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| name != DATE_COLUMN && name != STATION_COLUMN)
            .collect();

        for name in measure_columns {
            let values = df
                .column(&name)?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let points = timestamps
                .iter()
                .zip(values.f64()?.into_iter())
                .map(|(ts, value)| (*ts, value.unwrap_or(f64::NAN)))
                .collect();
            table.push_series(MeasureSeries { name, points });
        }

        Ok(table)
    }

    pub fn read_csv(path: &Path, station: &str, tz: Tz) -> Result<Self, SyncError> {
        // Every column is read as text; measures are cast afterwards so a column
        // that starts with integers cannot be inferred as such.
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| SyncError::TableRead(path.to_path_buf(), e))?
            .finish()
            .map_err(|e| SyncError::TableRead(path.to_path_buf(), e))?;
        Self::from_dataframe(station, tz, &df)
    }

    /// Writes the whole table to `path` through a temporary file in the same
    /// directory, so an interrupted write never leaves a truncated table.
    pub fn write_csv(&self, path: &Path) -> Result<(), SyncError> {
        let mut df = self.to_dataframe()?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp_file =
            NamedTempFile::new_in(dir).map_err(|e| SyncError::TableIo(path.to_path_buf(), e))?;
        CsvWriter::new(temp_file.as_file_mut())
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| SyncError::TableWrite(path.to_path_buf(), e))?;
        temp_file
            .persist(path)
            .map_err(|e| SyncError::TableIo(path.to_path_buf(), e.error))?;
        Ok(())
    }
}

fn parse_timestamp(value: &str, tz: Tz) -> Result<DateTime<Tz>, SyncError> {
    TIMESTAMP_PARSE_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok())
        .map(|dt| dt.with_timezone(&tz))
        .ok_or_else(|| SyncError::InvalidTimestamp(value.to_string()))
}

/// Reads the persisted table at `path`, `None` if there is no file yet.
pub async fn load_table(
    path: PathBuf,
    station: String,
    tz: Tz,
) -> Result<Option<ObservationTable>, SyncError> {
    let exists = tokio::fs::try_exists(&path)
        .await
        .map_err(|e| SyncError::TableIo(path.clone(), e))?;
    if !exists {
        debug!("No observation table at {:?}", path);
        return Ok(None);
    }
    task::spawn_blocking(move || ObservationTable::read_csv(&path, &station, tz).map(Some)).await?
}

pub async fn save_table(table: ObservationTable, path: PathBuf) -> Result<(), SyncError> {
    task::spawn_blocking(move || table.write_csv(&path)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Madrid;

    fn at(hour: u32) -> DateTime<Tz> {
        Madrid.with_ymd_and_hms(2024, 3, 10, hour, 0, 0).unwrap()
    }

    fn series(name: &str, points: &[(u32, f64)]) -> MeasureSeries {
        MeasureSeries {
            name: name.to_string(),
            points: points.iter().map(|(h, v)| (at(*h), *v)).collect(),
        }
    }

    fn table(points: &[(u32, f64)]) -> ObservationTable {
        let mut table = ObservationTable::new("C017");
        table.push_series(series("precipitation", points));
        table
    }

    #[test]
    fn test_merge_overwrites_shared_and_appends_new() {
        let mut persisted = table(&[(1, 1.0), (2, 2.0)]);
        persisted.merge(table(&[(2, 20.0), (3, 3.0)]));

        assert_eq!(persisted.len(), 3);
        assert_eq!(persisted.value(&at(1), "precipitation"), Some(1.0));
        assert_eq!(persisted.value(&at(2), "precipitation"), Some(20.0));
        assert_eq!(persisted.value(&at(3), "precipitation"), Some(3.0));
        let order: Vec<_> = persisted.timestamps().cloned().collect();
        assert_eq!(order, vec![at(1), at(2), at(3)]);
    }

    #[test]
    fn test_merge_keeps_values_missing_in_newer() {
        let mut persisted = table(&[(1, 1.0)]);
        persisted.merge(table(&[(1, f64::NAN)]));
        assert_eq!(persisted.value(&at(1), "precipitation"), Some(1.0));
    }

    #[test]
    fn test_merge_adds_new_columns() {
        let mut persisted = table(&[(1, 1.0)]);
        let mut newer = ObservationTable::new("C017");
        newer.push_series(series("mean_speed", &[(1, 7.2), (2, 3.6)]));
        persisted.merge(newer);

        assert_eq!(persisted.columns(), ["precipitation", "mean_speed"]);
        assert_eq!(persisted.value(&at(1), "mean_speed"), Some(7.2));
        assert_eq!(persisted.value(&at(2), "precipitation"), None);
    }

    #[test]
    fn test_merge_with_itself_is_a_no_op() {
        let mut persisted = table(&[(1, 1.0), (2, 2.0)]);
        let copy = persisted.clone();
        persisted.merge(copy.clone());
        assert_eq!(persisted, copy);
    }

    #[test]
    fn test_all_missing_series_still_creates_rows() {
        let table = table(&[(4, f64::NAN)]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(&at(4), "precipitation"), None);
        assert_eq!(table.last_timestamp(), Some(&at(4)));
    }

    #[test]
    fn test_dataframe_layout() {
        let mut table = table(&[(1, 1.5), (2, f64::NAN)]);
        table.push_series(series("mean_speed", &[(2, 3.6)]));
        let df = table.to_dataframe().unwrap();

        assert_eq!(df.shape(), (2, 4));
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, ["DATE", "precipitation", "mean_speed", "station"]);
        let dates: Vec<Option<&str>> = df
            .column("DATE")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            dates,
            vec![Some("2024-03-10 01:00:00+01:00"), Some("2024-03-10 02:00:00+01:00")]
        );
        assert_eq!(df.column("precipitation").unwrap().null_count(), 1);
    }

    #[test]
    fn test_csv_round_trip_keeps_zone_and_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("C017_OBS_MERGED.csv");

        let mut written = table(&[(1, 0.0), (2, f64::NAN), (3, 0.25)]);
        written.push_series(series("mean_speed", &[(1, 7.2)]));
        written.write_csv(&path).unwrap();

        let read_back = ObservationTable::read_csv(&path, "C017", Madrid).unwrap();
        assert_eq!(read_back, written);
        assert_eq!(read_back.first_timestamp(), Some(&at(1)));
    }

    #[test]
    fn test_rewrite_of_same_table_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let table = table(&[(1, 0.1), (2, 0.2)]);

        table.write_csv(&path).unwrap();
        let first = std::fs::read(&path).unwrap();
        ObservationTable::read_csv(&path, "C017", Madrid)
            .unwrap()
            .write_csv(&path)
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_timestamps_are_relocalized() {
        let parsed = parse_timestamp("2024-03-10 00:00:00+00:00", Madrid).unwrap();
        assert_eq!(parsed, at(1));
        assert_eq!(parsed.format(TIMESTAMP_FORMAT).to_string(), "2024-03-10 01:00:00+01:00");
        assert!(matches!(
            parse_timestamp("yesterday", Madrid),
            Err(SyncError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_missing_date_column() {
        let df = DataFrame::new(vec![Column::from(Series::new("station".into(), ["C017"]))]).unwrap();
        assert!(matches!(
            ObservationTable::from_dataframe("C017", Madrid, &df),
            Err(SyncError::MissingColumn(c)) if c == "DATE"
        ));
    }

    #[tokio::test]
    async fn test_load_missing_table_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_table(dir.path().join("none.csv"), "C017".to_string(), Madrid)
            .await
            .unwrap();
        assert!(loaded.is_none());
    }
}
