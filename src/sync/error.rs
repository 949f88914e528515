use crate::api::error::ApiError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Unexpected response shape from {path}")]
    UnexpectedShape {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed date range '{0}' in readings response")]
    MalformedDateRange(String),

    #[error("Malformed slot time '{0}' in readings response")]
    MalformedSlot(String),

    #[error("Readings for '{measure}' have {slots} slots but {values} values")]
    SlotValueMismatch {
        measure: String,
        slots: usize,
        values: usize,
    },

    #[error("Failed to read sensor cache {0:?}")]
    CatalogRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write sensor cache {0:?}")]
    CatalogWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode sensor cache {0:?}")]
    CatalogDecode(PathBuf, #[source] serde_json::Error),

    #[error("Failed to encode sensor cache for station '{0}'")]
    CatalogEncode(String, #[source] serde_json::Error),

    #[error("Failed to parse observation table {0:?}")]
    TableRead(PathBuf, #[source] PolarsError),

    #[error("Failed to encode observation table {0:?}")]
    TableWrite(PathBuf, #[source] PolarsError),

    #[error("I/O error on observation table {0:?}")]
    TableIo(PathBuf, #[source] std::io::Error),

    #[error("Invalid timestamp '{0}' in observation table")]
    InvalidTimestamp(String),

    #[error("Required column '{0}' not found in observation table")]
    MissingColumn(String),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
