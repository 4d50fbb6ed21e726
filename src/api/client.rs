//! Sensor API client
//!
//! Thin wrapper over reqwest that unwraps the backend's `{success, data}`
//! envelope. Non-2xx responses, `success: false` and undecodable bodies all
//! surface as [`ApiError`].

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{Envelope, HourlyStats, SensorSnapshot};
use crate::errors::ApiError;

/// Resource path for the full sensor list
pub const SENSORS_PATH: &str = "/sensors";

/// Resource path for server-side hourly aggregates
pub const HOURLY_STATS_PATH: &str = "/stats/hourly";

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url` (e.g. `http://host:8080/api/v1`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(base_url));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::RequestFailed {
                url: base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and return the unwrapped `data` payload
    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| ApiError::RequestFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        if !envelope.success {
            return Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "no message".to_string()),
            ));
        }

        envelope.data.ok_or(ApiError::MissingData)
    }

    /// Fetch the current state of every sensor
    pub async fn fetch_sensors(&self) -> Result<Vec<SensorSnapshot>, ApiError> {
        self.get_data(SENSORS_PATH, &[]).await
    }

    /// Fetch the server's hourly aggregates for `date`
    pub async fn hourly_stats(&self, date: NaiveDate) -> Result<Vec<HourlyStats>, ApiError> {
        let query = [("date", date.format("%Y-%m-%d").to_string())];
        self.get_data(HOURLY_STATS_PATH, &query).await
    }
}
