//! Settings and credentials read from the user's configuration directory.
//!
//! The directory (by default `~/.config/euskalmet`) must contain:
//!
//! * `settings.toml` with the claims issued together with the API key, and
//!   optional `[api]` and `[sync]` tables:
//!
//! ```toml
//! [payload]
//! iss = "company"
//! exp = 1616081478
//! iat = 1618673478
//! email = "name@company.com"
//!
//! [sync]
//! lookback_days = 30
//! timezone = "Europe/Madrid"
//! ```
//!
//! * `privateKey.pem`, the RSA key registered for the API key.

use crate::api::fetcher::DEFAULT_BASE_URL;
use crate::config::error::ConfigError;
use chrono::TimeDelta;
use chrono_tz::Tz;
use serde::Deserialize;
use std::io;
use std::path::Path;

pub const SETTINGS_FILE_NAME: &str = "settings.toml";
pub const PRIVATE_KEY_FILE_NAME: &str = "privateKey.pem";

pub const DEFAULT_TIMEZONE: &str = "Europe/Madrid";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub payload: TokenPayload,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

/// JWT claims issued with the API key.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenPayload {
    /// Issuer, usually the company name.
    pub iss: String,
    /// Expiration as a Unix timestamp.
    pub exp: i64,
    /// Emission as a Unix timestamp.
    pub iat: i64,
    /// Email of the API key owner.
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SyncSettings {
    /// How far back the first download of a station reaches.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    /// IANA zone the observation tables are indexed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            timezone: default_timezone(),
        }
    }
}

impl SyncSettings {
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidTimezone {
                name: self.timezone.clone(),
                reason: e.to_string(),
            })
    }

    pub fn lookback(&self) -> Result<TimeDelta, ConfigError> {
        if self.lookback_days <= 0 {
            return Err(ConfigError::InvalidLookback(self.lookback_days));
        }
        TimeDelta::try_days(self.lookback_days).ok_or(ConfigError::InvalidLookback(self.lookback_days))
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_lookback_days() -> i64 {
    DEFAULT_LOOKBACK_DAYS
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Settings {
    pub async fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(SETTINGS_FILE_NAME);
        let text = read_required(&path).await?;
        let text = String::from_utf8(text).map_err(|e| {
            ConfigError::Read(path.clone(), io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        Self::from_toml_str(&text).map_err(|e| ConfigError::Parse(path, e))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

pub async fn read_private_key(config_dir: &Path) -> Result<Vec<u8>, ConfigError> {
    read_required(&config_dir.join(PRIVATE_KEY_FILE_NAME)).await
}

async fn read_required(path: &Path) -> Result<Vec<u8>, ConfigError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ConfigError::MissingFile(path.to_path_buf()))
        }
        Err(e) => Err(ConfigError::Read(path.to_path_buf(), e)),
    }
}
