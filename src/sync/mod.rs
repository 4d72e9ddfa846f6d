//! State synchronization with the authoritative store
//!
//! Startup pulls the stored state once. After that every push is launched as
//! a detached task; outcomes come back over a channel that the tick loop
//! drains without waiting.

pub mod stats;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::calibration::HsvCalibration;
use crate::store::{StateDocument, StoreClient};
use crate::util::rate_limit::LogThrottle;

pub use stats::{SyncReport, SyncStats};

/// Where the simulation sends state and calibration
pub trait StateSink: Send {
    /// Launch a full-state push; must not block
    fn push_state(&mut self, document: StateDocument);

    /// Launch a calibration push; must not block
    fn push_calibration(&mut self, hsv: HsvCalibration);

    /// Collect outcomes of finished pushes
    fn poll(&mut self) {}

    fn stats(&self) -> SyncStats {
        SyncStats::default()
    }
}

/// Fire-and-forget pushes to the store over HTTP
pub struct HttpSync {
    store: StoreClient,
    reports_tx: mpsc::UnboundedSender<SyncReport>,
    reports_rx: mpsc::UnboundedReceiver<SyncReport>,
    stats: SyncStats,
    failure_log: LogThrottle,
}

impl HttpSync {
    pub fn new(store: StoreClient) -> Self {
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        Self {
            store,
            reports_tx,
            reports_rx,
            stats: SyncStats::default(),
            failure_log: LogThrottle::default(),
        }
    }
}

impl StateSink for HttpSync {
    fn push_state(&mut self, document: StateDocument) {
        self.stats.states_sent += 1;
        let store = self.store.clone();
        let reports = self.reports_tx.clone();
        tokio::spawn(async move {
            let report = match store.push_state(&document).await {
                Ok(bytes) => SyncReport::StateAccepted { bytes },
                Err(e) => SyncReport::StateFailed {
                    error: e.to_string(),
                },
            };
            let _ = reports.send(report);
        });
    }

    fn push_calibration(&mut self, hsv: HsvCalibration) {
        self.stats.calibrations_sent += 1;
        let store = self.store.clone();
        let reports = self.reports_tx.clone();
        tokio::spawn(async move {
            let report = match store.push_hsv(hsv).await {
                Ok(()) => SyncReport::CalibrationAccepted,
                Err(e) => SyncReport::CalibrationFailed {
                    error: e.to_string(),
                },
            };
            let _ = reports.send(report);
        });
    }

    fn poll(&mut self) {
        while let Ok(report) = self.reports_rx.try_recv() {
            self.stats.record(&report);
            match &report {
                SyncReport::StateFailed { error } => {
                    if let Some(suppressed) = self.failure_log.check() {
                        warn!(error = %error, suppressed, "State sync failed");
                    }
                }
                SyncReport::CalibrationFailed { error } => {
                    warn!(error = %error, "Calibration push failed");
                }
                SyncReport::CalibrationAccepted => debug!("Calibration stored"),
                SyncReport::StateAccepted { .. } => {}
            }
        }
    }

    fn stats(&self) -> SyncStats {
        self.stats.clone()
    }
}

/// Pull the stored state, falling back to a fresh fight when unavailable
pub async fn fetch_initial_state(store: &StoreClient) -> StateDocument {
    match store.fetch_state().await {
        Ok(document) => {
            info!(
                boss_phase = document.boss_phase,
                boss_health = document.boss_health,
                calibrated = document.hsv_values.is_some(),
                "Loaded stored game state"
            );
            document
        }
        Err(e) => {
            warn!(error = %e, "Could not load stored game state, starting fresh");
            StateDocument::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use std::time::Duration;

    fn dead_store() -> StoreClient {
        StoreClient::with_client(Client::new(), "http://127.0.0.1:1")
    }

    #[tokio::test]
    async fn unreachable_store_hydrates_defaults() {
        let document = fetch_initial_state(&dead_store()).await;
        assert_eq!(document, StateDocument::default());
    }

    #[tokio::test]
    async fn failed_pushes_are_counted_not_raised() {
        let mut sync = HttpSync::new(dead_store());
        sync.push_state(StateDocument::default());
        sync.push_calibration(HsvCalibration::new([0, 0, 195, 179, 255, 255]).unwrap());

        for _ in 0..100 {
            sync.poll();
            let stats = sync.stats();
            if stats.states_failed == 1 && stats.calibrations_failed == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let stats = sync.stats();
        assert_eq!(stats.states_sent, 1);
        assert_eq!(stats.states_failed, 1);
        assert_eq!(stats.calibrations_failed, 1);
        assert_eq!(stats.in_flight(), 0);
    }
}
