use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required file {0:?} not found")]
    MissingFile(PathBuf),

    #[error("Failed to read {0:?}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse settings file {0:?}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Unknown time zone '{name}': {reason}")]
    InvalidTimezone { name: String, reason: String },

    #[error("Lookback must be a positive number of days, got {0}")]
    InvalidLookback(i64),

    #[error("Failed to determine home directory")]
    HomeDirResolution,
}
