mod api;
mod clients;
mod config;
mod error;
mod euskalmet;
mod sync;
mod types;
mod utils;

pub use error::EuskalmetError;
pub use euskalmet::*;

pub use api::error::ApiError;
pub use api::fetcher::{ApiClient, Fetch, DEFAULT_BASE_URL};
pub use api::token::sign_token;

pub use clients::geo_client::*;
pub use clients::stations_client::*;
pub use clients::weather_client::*;

pub use config::error::ConfigError;
pub use config::settings::*;

pub use sync::batch::{floor_hour, hourly_range, plan_batches, Batch, BATCH_HOURS};
pub use sync::engine::{Clock, Concurrency, SyncEngine, SyncReport};
pub use sync::error::SyncError;
pub use sync::normalizer::{normalize, normalize_response, reference_timestamp, MeasureSeries};
pub use sync::sensor_catalog::SensorCatalog;
pub use sync::table::{ObservationTable, DATE_COLUMN, STATION_COLUMN};

pub use types::measure::*;
pub use types::station::*;

pub use utils::{default_config_dir, default_data_dir};
