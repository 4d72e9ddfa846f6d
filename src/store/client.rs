//! HTTP client for the authoritative state store

use reqwest::Client;

use crate::calibration::HsvCalibration;
use crate::config::Config;

use super::document::{HsvUpdate, StateDocument};

/// Client for the store's three state endpoints
#[derive(Clone)]
pub struct StoreClient {
    client: Client,
    base_url: String,
}

impl StoreClient {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(StoreError::Request)?;
        Ok(Self::with_client(client, &config.store_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `GET /game_state`
    pub async fn fetch_state(&self) -> Result<StateDocument, StoreError> {
        let response = self
            .client
            .get(self.url("game_state"))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(StoreError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status: status.as_u16(), body });
        }

        response.json().await.map_err(StoreError::Parse)
    }

    /// `POST /update_game_state`. Returns the payload size in bytes.
    pub async fn push_state(&self, document: &StateDocument) -> Result<usize, StoreError> {
        let payload = serde_json::to_vec(document).map_err(StoreError::Encode)?;
        let bytes = payload.len();

        let response = self
            .client
            .post(self.url("update_game_state"))
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await
            .map_err(StoreError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status: status.as_u16(), body });
        }

        Ok(bytes)
    }

    /// `POST /update_hsv_values`
    pub async fn push_hsv(&self, hsv: HsvCalibration) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.url("update_hsv_values"))
            .json(&HsvUpdate { hsv_values: hsv })
            .send()
            .await
            .map_err(StoreError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status: status.as_u16(), body });
        }

        Ok(())
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(#[source] reqwest::Error),

    #[error("Failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}
