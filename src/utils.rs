use crate::config::error::ConfigError;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".config/euskalmet";
const DATA_DIR: &str = ".euskalmet/data";

/// `~/.config/euskalmet`, holding `settings.toml` and `privateKey.pem`.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR))
        .ok_or(ConfigError::HomeDirResolution)
}

/// `~/.euskalmet/data`, holding sensor catalogs and observation tables.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR))
        .ok_or(ConfigError::HomeDirResolution)
}

pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::other(format!(
            "path exists but is not a directory: {}",
            path.display()
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating data directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}
