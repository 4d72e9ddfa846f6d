//! Frame capture loop feeding the input buffer
//!
//! Frames go out on a fixed timer regardless of how long the tracker takes
//! to answer. Each exchange runs as its own task; whichever response lands
//! last wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::game::input::InputSender;
use crate::game::Position;
use crate::util::rate_limit::LogThrottle;

use super::client::{TrackerClient, TrackerError, TrackingResponse};

/// Reads the current webcam frame from a file kept fresh by the capture tool
#[derive(Debug, Clone)]
pub struct FrameSource {
    path: PathBuf,
}

impl FrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn grab(&self) -> Result<Vec<u8>, TrackerError> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// Push a detected position and remember it for the next request.
/// Returns the position when it was queued; a full queue drops it.
pub fn apply_detection(
    response: &TrackingResponse,
    input: &InputSender,
    last_known: &Mutex<Position>,
) -> Option<Position> {
    let position = response.position()?;
    *last_known.lock() = position;
    input.push(position).then_some(position)
}

/// State shared by every in-flight exchange
#[derive(Clone)]
struct Exchange {
    client: TrackerClient,
    input: InputSender,
    last_known: Arc<Mutex<Position>>,
    preview_dir: Option<PathBuf>,
    failure_log: LogThrottle,
}

impl Exchange {
    async fn run(self, frame: Vec<u8>, prev: Position) {
        let response = match self.client.send_frame(frame, prev).await {
            Ok(response) => response,
            Err(e) => {
                if let Some(suppressed) = self.failure_log.check() {
                    warn!(error = %e, suppressed, "Tracking request failed");
                }
                return;
            }
        };

        match apply_detection(&response, &self.input, &self.last_known) {
            Some(position) => trace!(x = position.x, y = position.y, "Tracked position queued"),
            None => trace!(detected = response.detected, "No position queued"),
        }

        if let Some(dir) = &self.preview_dir {
            if let Err(e) = write_previews(dir, &response).await {
                if let Some(suppressed) = self.failure_log.check() {
                    warn!(error = %e, suppressed, "Failed to write tracker previews");
                }
            }
        }
    }
}

async fn write_previews(dir: &Path, response: &TrackingResponse) -> Result<(), TrackerError> {
    let previews = response.previews()?;
    if let Some(original) = previews.original {
        tokio::fs::write(dir.join("original.jpg"), original).await?;
    }
    if let Some(processed) = previews.processed {
        tokio::fs::write(dir.join("processed.jpg"), processed).await?;
    }
    Ok(())
}

/// Periodic capture → tracker → input buffer pipeline
pub struct TrackingTask {
    source: FrameSource,
    interval: Duration,
    exchange: Exchange,
}

impl TrackingTask {
    pub fn new(
        client: TrackerClient,
        source: FrameSource,
        input: InputSender,
        start: Position,
        interval: Duration,
        preview_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            source,
            interval,
            exchange: Exchange {
                client,
                input,
                last_known: Arc::new(Mutex::new(start)),
                preview_dir,
                failure_log: LogThrottle::default(),
            },
        }
    }

    /// Run until the simulation drops its end of the input queue
    pub async fn run(self) {
        info!(
            frame = %self.source.path.display(),
            interval_ms = self.interval.as_millis() as u64,
            "Tracking started"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if self.exchange.input.is_closed() {
                debug!("Input buffer closed, stopping tracking");
                break;
            }

            let frame = match self.source.grab().await {
                Ok(frame) => frame,
                Err(e) => {
                    if let Some(suppressed) = self.exchange.failure_log.check() {
                        warn!(error = %e, suppressed, "Failed to grab frame");
                    }
                    continue;
                }
            };

            let prev = *self.exchange.last_known.lock();
            tokio::spawn(self.exchange.clone().run(frame, prev));
        }
    }
}
