//! Access to forecasts and measure reports.

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::fetcher::Fetch;
use bon::bon;
use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::sync::Arc;

/// Forecasts and reports for regions and locations.
///
/// Obtained through [`crate::Euskalmet::weather()`]. The emission date (`at`)
/// defaults to today's local date.
#[derive(Clone)]
pub struct WeatherClient {
    fetcher: Arc<dyn Fetch>,
}

#[bon]
impl WeatherClient {
    pub(crate) fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self { fetcher }
    }

    /// Forecast for a whole region, emitted on `at`, for `forecast_date`.
    ///
    /// ```no_run
    /// # use euskalmet::{Euskalmet, EuskalmetError};
    /// # use chrono::NaiveDate;
    /// # async fn run() -> Result<(), EuskalmetError> {
    /// let client = Euskalmet::new().await?;
    /// let forecast = client
    ///     .weather()
    ///     .region_forecast()
    ///     .region("basque_country")
    ///     .forecast_date(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap())
    ///     .call()
    ///     .await?;
    /// println!("{forecast:#}");
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn region_forecast(
        &self,
        region: &str,
        forecast_date: NaiveDate,
        at: Option<NaiveDate>,
    ) -> Result<Value, ApiError> {
        let at = at.unwrap_or_else(today);
        self.fetcher
            .fetch(&endpoints::region_forecast(region, at, forecast_date))
            .await
    }

    /// Forecast for one location of a zone.
    #[builder]
    pub async fn location_forecast(
        &self,
        region: &str,
        zone: &str,
        location: &str,
        forecast_date: NaiveDate,
        at: Option<NaiveDate>,
    ) -> Result<Value, ApiError> {
        let at = at.unwrap_or_else(today);
        let path = endpoints::location_forecast(region, zone, location, at, forecast_date);
        self.fetcher.fetch(&path).await
    }

    /// Last measures report of a location for `date`.
    #[builder]
    pub async fn last_report(
        &self,
        region: &str,
        zone: &str,
        location: &str,
        date: Option<NaiveDate>,
    ) -> Result<Value, ApiError> {
        let date = date.unwrap_or_else(today);
        let path = endpoints::location_last_report(region, zone, location, date);
        self.fetcher.fetch(&path).await
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
