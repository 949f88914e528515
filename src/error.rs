use crate::api::error::ApiError;
use crate::config::error::ConfigError;
use crate::sync::error::SyncError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EuskalmetError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Failed to create data directory {0:?}")]
    DataDirCreation(PathBuf, #[source] std::io::Error),
}
