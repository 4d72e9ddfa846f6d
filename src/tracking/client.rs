//! HTTP client for the color-tracking service

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::game::Position;

/// `POST /video_feed` response body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackingResponse {
    pub detected: bool,
    pub x: Option<f32>,
    pub y: Option<f32>,
    /// Base64 JPEG of the frame as the tracker saw it
    pub original: Option<String>,
    /// Base64 JPEG of the thresholded mask
    pub processed: Option<String>,
}

impl TrackingResponse {
    /// Detected position, if the tracker found the object
    pub fn position(&self) -> Option<Position> {
        match (self.detected, self.x, self.y) {
            (true, Some(x), Some(y)) => Some(Position::new(x, y)),
            _ => None,
        }
    }

    /// Decode the preview images, skipping any that are absent
    pub fn previews(&self) -> Result<TrackingPreviews, TrackerError> {
        let decode = |field: &Option<String>| -> Result<Option<Vec<u8>>, TrackerError> {
            field
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| STANDARD.decode(s))
                .transpose()
                .map_err(TrackerError::Preview)
        };
        Ok(TrackingPreviews {
            original: decode(&self.original)?,
            processed: decode(&self.processed)?,
        })
    }
}

/// Decoded preview JPEGs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingPreviews {
    pub original: Option<Vec<u8>>,
    pub processed: Option<Vec<u8>>,
}

/// Client for the tracking service
#[derive(Clone)]
pub struct TrackerClient {
    client: Client,
    base_url: String,
}

impl TrackerClient {
    pub fn new(config: &Config) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(TrackerError::Request)?;
        Ok(Self {
            client,
            base_url: config.tracker_url.clone(),
        })
    }

    /// Send one JPEG frame with the last known position
    pub async fn send_frame(
        &self,
        jpeg: Vec<u8>,
        last_known: Position,
    ) -> Result<TrackingResponse, TrackerError> {
        let image = Part::bytes(jpeg)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(TrackerError::Request)?;
        let form = Form::new()
            .part("image", image)
            .text("prevX", last_known.x.to_string())
            .text("prevY", last_known.y.to_string());

        let response = self
            .client
            .post(format!("{}/video_feed", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(TrackerError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Api { status: status.as_u16(), body });
        }

        response.json().await.map_err(TrackerError::Parse)
    }
}

/// Tracking errors
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(#[source] reqwest::Error),

    #[error("Invalid preview image: {0}")]
    Preview(#[source] base64::DecodeError),

    #[error("Failed to read frame: {0}")]
    Frame(#[from] std::io::Error),
}
