use crate::api::error::ApiError;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.euskadi.eus";

/// Source of decoded API responses.
///
/// Every facade and the sync engine talk to the API through this trait, so a
/// single authenticated client can be shared (and replaced in tests).
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Requests `path` (relative to the API base url) and decodes the JSON body.
    ///
    /// Fails with [`ApiError::HttpStatus`] when the upstream status is 300 or above.
    async fn fetch(&self, path: &str) -> Result<Value, ApiError>;
}

/// Authenticated HTTP client for the Euskalmet API.
///
/// Requests have no timeout and cannot be cancelled: a hung request blocks
/// the caller (and, during a sync, the whole batch) until the connection fails.
pub struct ApiClient {
    base_url: String,
    token: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http: Client::new(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Fetch for ApiClient {
    async fn fetch(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url_for(path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        if status.as_u16() >= 300 {
            warn!("HTTP error {} for {}", status, url);
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                url,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::BodyDecode(url, e))
    }
}
