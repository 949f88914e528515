use crate::api::endpoints;
use crate::api::fetcher::Fetch;
use crate::sync::error::SyncError;
use crate::types::measure::SensorMap;
use crate::types::station::{CurrentStation, SensorInfo};
use log::{debug, info};
use serde::de::DeserializeOwned;
use std::collections::{hash_map::Entry, HashMap};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;

const CACHE_FILE_SUFFIX: &str = "_info.json";

/// Per-station cache of which sensors exist and which measures each reports.
///
/// A station's catalog is fetched once and then served from
/// `<cache_dir>/<station>_info.json` forever. There is no freshness check;
/// call [`SensorCatalog::invalidate`] after a station's sensors change.
pub struct SensorCatalog {
    fetcher: Arc<dyn Fetch>,
    cache_dir: PathBuf,
    memory: Mutex<HashMap<String, SensorMap>>,
}

impl SensorCatalog {
    pub fn new(fetcher: Arc<dyn Fetch>, cache_dir: &Path) -> Self {
        Self {
            fetcher,
            cache_dir: cache_dir.to_path_buf(),
            memory: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache_path(&self, station: &str) -> PathBuf {
        self.cache_dir.join(format!("{station}{CACHE_FILE_SUFFIX}"))
    }

    /// Sensor id to measure descriptors for `station`.
    ///
    /// Served from memory, then from the cache file, and only then fetched
    /// from the API and persisted. A failed population leaves no cache file.
    pub async fn resolve(&self, station: &str) -> Result<SensorMap, SyncError> {
        {
            let memory = self.memory.lock().await;
            if let Some(sensors) = memory.get(station) {
                return Ok(sensors.clone());
            }
        }

        let cache_path = self.cache_path(station);
        let sensors = match self.read_cache_file(&cache_path).await? {
            Some(sensors) => {
                debug!("Loaded sensor catalog for {} from {:?}", station, cache_path);
                sensors
            }
            None => {
                info!("Sensor catalog for {} not cached, fetching from API", station);
                let sensors = self.populate(station).await?;
                self.write_cache_file(station, &cache_path, &sensors).await?;
                sensors
            }
        };

        let mut memory = self.memory.lock().await;
        match memory.entry(station.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => Ok(entry.insert(sensors).clone()),
        }
    }

    /// Forgets `station` in memory and on disk.
    pub async fn invalidate(&self, station: &str) -> Result<(), SyncError> {
        self.memory.lock().await.remove(station);
        let cache_path = self.cache_path(station);
        match tokio::fs::remove_file(&cache_path).await {
            Ok(()) => {
                info!("Invalidated sensor catalog for {}", station);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::CatalogWrite(cache_path, e)),
        }
    }

    async fn populate(&self, station: &str) -> Result<SensorMap, SyncError> {
        let current: CurrentStation = self.fetch_as(&endpoints::station_current(station)).await?;

        let mut sensors = SensorMap::new();
        for sensor in &current.sensors {
            let sensor_id = sensor.sensor_id();
            let info: SensorInfo = self.fetch_as(&endpoints::sensor(sensor_id)).await?;
            sensors.insert(sensor_id.to_string(), info.meteors);
        }
        debug!("Station {} has {} sensors", station, sensors.len());
        Ok(sensors)
    }

    async fn fetch_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        let body = self.fetcher.fetch(path).await?;
        serde_json::from_value(body).map_err(|e| SyncError::UnexpectedShape {
            path: path.to_string(),
            source: e,
        })
    }

    async fn read_cache_file(&self, path: &Path) -> Result<Option<SensorMap>, SyncError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::CatalogRead(path.to_path_buf(), e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SyncError::CatalogDecode(path.to_path_buf(), e))
    }

    async fn write_cache_file(
        &self,
        station: &str,
        path: &Path,
        sensors: &SensorMap,
    ) -> Result<(), SyncError> {
        let json = serde_json::to_string_pretty(sensors)
            .map_err(|e| SyncError::CatalogEncode(station.to_string(), e))?;
        let path = path.to_path_buf();
        task::spawn_blocking(move || persist_atomically(&path, json.as_bytes())).await?
    }
}

/// Writes through a temporary file in the same directory, so a crash never
/// leaves a truncated cache behind.
fn persist_atomically(path: &Path, contents: &[u8]) -> Result<(), SyncError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp_file =
        NamedTempFile::new_in(dir).map_err(|e| SyncError::CatalogWrite(path.to_path_buf(), e))?;
    temp_file
        .write_all(contents)
        .map_err(|e| SyncError::CatalogWrite(path.to_path_buf(), e))?;
    temp_file
        .persist(path)
        .map_err(|e| SyncError::CatalogWrite(path.to_path_buf(), e.error))?;
    Ok(())
}
