//! Access to the geographic hierarchy: regions, zones and locations.

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::fetcher::Fetch;
use serde_json::Value;
use std::sync::Arc;

/// Obtained through [`crate::Euskalmet::geo()`].
#[derive(Clone)]
pub struct GeoClient {
    fetcher: Arc<dyn Fetch>,
}

impl GeoClient {
    pub(crate) fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self { fetcher }
    }

    pub async fn regions(&self) -> Result<Value, ApiError> {
        self.fetcher.fetch(&endpoints::regions()).await
    }

    pub async fn region(&self, region_id: &str) -> Result<Value, ApiError> {
        self.fetcher.fetch(&endpoints::region(region_id)).await
    }

    pub async fn zones(&self, region_id: &str) -> Result<Value, ApiError> {
        self.fetcher.fetch(&endpoints::region_zones(region_id)).await
    }

    pub async fn locations(&self, region_id: &str, zone_id: &str) -> Result<Value, ApiError> {
        self.fetcher
            .fetch(&endpoints::zone_locations(region_id, zone_id))
            .await
    }
}
