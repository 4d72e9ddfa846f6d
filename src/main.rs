//! Orange Ball client - tick-driven boss fight driven by a tracked object
//!
//! This is the main entry point for the client. It handles:
//! - Pulling the stored fight state and hydrating the simulation
//! - Feeding webcam frames to the tracking service
//! - Running the fixed-rate simulation loop
//! - Pushing state and calibration back to the store

mod app;
mod calibration;
mod config;
mod game;
mod store;
mod sync;
mod tracking;
mod util;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::calibration::console::run_stdin_console;
use crate::config::Config;
use crate::game::collision::CircleOverlap;
use crate::game::input::input_channel;
use crate::game::scene::TraceScene;
use crate::game::simulation::SimulationDeps;
use crate::game::Simulation;
use crate::sync::{fetch_initial_state, HttpSync};
use crate::tracking::{FrameSource, TrackingTask};
use crate::util::time::{init_process_time, uptime_secs, MonotonicClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize process time tracking
    init_process_time();

    info!("Starting Orange Ball client");
    info!("State store: {}", config.store_url);
    info!("Tracker: {}", config.tracker_url);

    let app = AppState::new(config)?;

    // Authoritative state, pulled once
    let document = fetch_initial_state(&app.store).await;

    let (input, buffer) = input_channel();
    let (calibration_tx, calibration_rx) = mpsc::unbounded_channel();

    let simulation = Simulation::hydrate(
        &document,
        SimulationDeps {
            clock: Arc::new(MonotonicClock::new()),
            input: buffer,
            calibration: calibration_rx,
            sync: Box::new(HttpSync::new(app.store.clone())),
            scene: Box::new(TraceScene),
            oracle: Box::new(CircleOverlap::default()),
            tick_rate: app.config.tick_rate,
            rng_seed: app.config.rng_seed,
            fallback_calibration: app.config.hsv_values,
        },
    );

    // Operator calibration console
    tokio::spawn(run_stdin_console(calibration_tx));

    // Tracking pipeline
    match &app.config.frame_path {
        Some(path) => {
            let task = TrackingTask::new(
                app.tracker.clone(),
                FrameSource::new(path.clone()),
                input,
                simulation.state().player_position,
                app.config.capture_interval,
                app.config.preview_dir.clone(),
            );
            tokio::spawn(task.run());
        }
        None => warn!("FRAME_PATH not set, player input disabled"),
    }

    let stats = simulation.run(shutdown_signal()).await?;

    info!(
        states_accepted = stats.states_accepted,
        states_failed = stats.states_failed,
        calibrations_failed = stats.calibrations_failed,
        uptime_secs = uptime_secs(),
        "Client shutdown complete"
    );
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
