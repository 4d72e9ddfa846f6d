//! Application state shared by the client's tasks

use std::sync::Arc;

use crate::config::Config;
use crate::store::{StoreClient, StoreError};
use crate::tracking::{TrackerClient, TrackerError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: StoreClient,
    pub tracker: TrackerClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);

        // State store client
        let store = StoreClient::new(&config)?;

        // Tracking service client
        let tracker = TrackerClient::new(&config)?;

        Ok(Self {
            config,
            store,
            tracker,
        })
    }
}

/// Startup errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Store client: {0}")]
    Store(#[from] StoreError),

    #[error("Tracker client: {0}")]
    Tracker(#[from] TrackerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_clients_from_config() {
        let config = Config::from_lookup(|key| match key {
            "STORE_URL" => Some("http://store.local:5000/".to_string()),
            _ => None,
        })
        .unwrap();

        let state = AppState::new(config).unwrap();
        assert_eq!(state.config.tracker_url, "http://store.local:5000");
    }
}
