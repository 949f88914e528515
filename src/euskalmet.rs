//! Main entry point: an authenticated client for the Euskalmet API and the
//! incremental station sync built on top of it.

use crate::api::fetcher::{ApiClient, Fetch};
use crate::api::token::sign_token;
use crate::clients::geo_client::GeoClient;
use crate::clients::stations_client::StationsClient;
use crate::clients::weather_client::WeatherClient;
use crate::config::settings::{read_private_key, Settings, SyncSettings};
use crate::error::EuskalmetError;
use crate::sync::batch::floor_hour;
use crate::sync::engine::{Clock, Concurrency, SyncEngine, SyncReport};
use crate::sync::error::SyncError;
use crate::sync::sensor_catalog::SensorCatalog;
use crate::sync::table::load_table;
use crate::utils::{default_config_dir, default_data_dir, ensure_dir_exists};
use bon::bon;
use chrono::{DateTime, Utc};
use log::info;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The main client.
///
/// Holds one authenticated fetcher shared by the API facades
/// ([`stations`](Self::stations), [`geo`](Self::geo), [`weather`](Self::weather))
/// and by the sync engine, together with the per-station sensor catalog cache.
///
/// # Examples
///
/// ```no_run
/// # use euskalmet::{Euskalmet, EuskalmetError};
/// # async fn run() -> Result<(), EuskalmetError> {
/// let client = Euskalmet::new().await?;
/// let report = client.sync().station("C017").call().await?;
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
pub struct Euskalmet {
    fetcher: Arc<dyn Fetch>,
    catalog: Arc<SensorCatalog>,
    engine: SyncEngine,
    data_dir: PathBuf,
}

#[bon]
impl Euskalmet {
    /// Creates a client from `~/.config/euskalmet`, storing data in
    /// `~/.euskalmet/data`.
    ///
    /// # Errors
    ///
    /// Fails with [`EuskalmetError::Config`] when the settings file or the
    /// private key is missing or invalid, and with [`EuskalmetError::Api`] when
    /// the token cannot be signed.
    pub async fn new() -> Result<Self, EuskalmetError> {
        Self::with_dirs(&default_config_dir()?, &default_data_dir()?).await
    }

    /// Creates a client reading `settings.toml` and `privateKey.pem` from
    /// `config_dir` and storing data in `data_dir` (created if missing).
    pub async fn with_dirs(config_dir: &Path, data_dir: &Path) -> Result<Self, EuskalmetError> {
        let settings = Settings::load(config_dir).await?;
        let private_key = read_private_key(config_dir).await?;
        let token = sign_token(&settings.payload, &private_key)?;
        info!("Signed API token for {}", settings.payload.email);

        let fetcher = Arc::new(ApiClient::new(&settings.api.base_url, token));
        Self::with_fetcher(fetcher, &settings.sync, data_dir).await
    }

    /// Creates a client over any [`Fetch`] implementation.
    pub async fn with_fetcher(
        fetcher: Arc<dyn Fetch>,
        sync: &SyncSettings,
        data_dir: &Path,
    ) -> Result<Self, EuskalmetError> {
        ensure_dir_exists(data_dir)
            .await
            .map_err(|e| EuskalmetError::DataDirCreation(data_dir.to_path_buf(), e))?;

        let catalog = Arc::new(SensorCatalog::new(fetcher.clone(), data_dir));
        let engine = SyncEngine::new(
            fetcher.clone(),
            catalog.clone(),
            data_dir,
            sync.tz()?,
            sync.lookback()?,
        );
        Ok(Self {
            fetcher,
            catalog,
            engine,
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Replaces the clock the sync uses to decide which hours are complete.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.engine = self.engine.with_clock(clock);
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn stations(&self) -> StationsClient {
        StationsClient::new(self.fetcher.clone())
    }

    pub fn geo(&self) -> GeoClient {
        GeoClient::new(self.fetcher.clone())
    }

    pub fn weather(&self) -> WeatherClient {
        WeatherClient::new(self.fetcher.clone())
    }

    pub fn sensor_catalog(&self) -> &SensorCatalog {
        &self.catalog
    }

    /// Brings the observation table of `station` up to the last complete hour.
    ///
    /// * `.concurrency(Concurrency)`: defaults to [`Concurrency::Parallel`].
    /// * `.start(DateTime<Utc>)`: overrides the resume point.
    ///
    /// Individual batches that fail are logged and counted in the report; only
    /// failures to read the existing table before planning are returned.
    #[builder]
    pub async fn sync(
        &self,
        station: &str,
        concurrency: Option<Concurrency>,
        start: Option<DateTime<Utc>>,
    ) -> Result<SyncReport, EuskalmetError> {
        let report = self
            .engine
            .run(station, concurrency.unwrap_or_default(), start)
            .await?;
        Ok(report)
    }

    /// Every measure of `station` during the hour containing `hour`, with the
    /// same layout as the persisted table.
    #[builder]
    pub async fn readings_at(
        &self,
        station: &str,
        hour: DateTime<Utc>,
    ) -> Result<DataFrame, EuskalmetError> {
        let sensors = self.catalog.resolve(station).await?;
        let hour = floor_hour(&hour.with_timezone(&self.engine.tz()));
        let frame = self.engine.readings_at(station, &sensors, &hour).await;
        Ok(frame.to_dataframe().map_err(SyncError::from)?)
    }

    /// The persisted observation table of `station`, `None` if it was never synced.
    pub async fn load_observations(&self, station: &str) -> Result<Option<DataFrame>, EuskalmetError> {
        let table = load_table(
            self.engine.table_path(station),
            station.to_string(),
            self.engine.tz(),
        )
        .await?;
        match table {
            Some(table) => Ok(Some(table.to_dataframe().map_err(SyncError::from)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockFetcher;
    use crate::config::error::ConfigError;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 34, 0).unwrap()
    }

    async fn client(data_dir: &Path) -> (Euskalmet, Arc<MockFetcher>) {
        let fetcher = Arc::new(MockFetcher::two_sensor_station("C017"));
        let sync = SyncSettings {
            lookback_days: 1,
            ..SyncSettings::default()
        };
        let client = Euskalmet::with_fetcher(fetcher.clone(), &sync, data_dir)
            .await
            .unwrap()
            .with_clock(fixed_now);
        (client, fetcher)
    }

    #[tokio::test]
    async fn test_sync_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _) = client(&dir.path().join("data")).await;

        assert!(client.load_observations("C017").await.unwrap().is_none());

        let report = client
            .sync()
            .station("C017")
            .concurrency(Concurrency::Sequential)
            .call()
            .await
            .unwrap();
        assert_eq!(report.batches_written, 4);

        let df = client.load_observations("C017").await.unwrap().unwrap();
        assert_eq!(df.height(), 24);
        assert!(client.data_dir().join("C017_OBS_MERGED.csv").exists());
        assert!(client.data_dir().join("C017_info.json").exists());
    }

    #[tokio::test]
    async fn test_readings_at_floors_the_hour() {
        let dir = tempfile::tempdir().unwrap();
        let (client, fetcher) = client(dir.path()).await;

        let df = client
            .readings_at()
            .station("C017")
            .hour(Utc.with_ymd_and_hms(2024, 3, 10, 5, 59, 0).unwrap())
            .call()
            .await
            .unwrap();

        assert_eq!(df.height(), 1);
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, ["DATE", "precipitation", "mean_speed", "station"]);
        assert_eq!(fetcher.count_calls("/euskalmet/readings/"), 2);
        assert!(fetcher
            .calls()
            .iter()
            .any(|p| p.ends_with("/at/2024/03/10/05")));
    }

    #[tokio::test]
    async fn test_invalid_sync_settings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sync = SyncSettings {
            timezone: "Nowhere/Special".to_string(),
            ..SyncSettings::default()
        };
        let result = Euskalmet::with_fetcher(
            Arc::new(MockFetcher::two_sensor_station("C017")),
            &sync,
            dir.path(),
        )
        .await;
        assert!(matches!(
            result,
            Err(EuskalmetError::Config(ConfigError::InvalidTimezone { .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = Euskalmet::with_dirs(&dir.path().join("config"), &dir.path().join("data")).await;
        assert!(matches!(
            result,
            Err(EuskalmetError::Config(ConfigError::MissingFile(_)))
        ));
    }
}
