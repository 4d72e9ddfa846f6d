//! Simulation state hydration and the fixed-rate tick loop

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::calibration::{CalibrationUpdate, HsvCalibration};
use crate::store::StateDocument;
use crate::sync::{StateSink, SyncStats};
use crate::util::time::{tick_duration, uptime_secs, Clock, Millis, SYNC_PERIOD_TICKS};

use super::boss::{BossController, FAN_ANGLES};
use super::collision::{HitEvent, OverlapOracle};
use super::input::InputBuffer;
use super::projectiles::ProjectileManager;
use super::scene::Scene;
use super::state::{BossPhase, Direction, Motion, Owner, SimulationState, BOSS_MAX_HEALTH};

/// How long shutdown waits for the final state push to land
const FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

/// Collaborators and settings needed to build a simulation
pub struct SimulationDeps {
    pub clock: Arc<dyn Clock>,
    pub input: InputBuffer,
    pub calibration: mpsc::UnboundedReceiver<CalibrationUpdate>,
    pub sync: Box<dyn StateSink>,
    pub scene: Box<dyn Scene>,
    pub oracle: Box<dyn OverlapOracle>,
    pub tick_rate: u32,
    pub rng_seed: Option<u64>,
    /// Used when the stored state carries no calibration
    pub fallback_calibration: Option<HsvCalibration>,
}

/// The tick-driven fight between the tracked player and the boss
pub struct Simulation {
    state: SimulationState,
    clock: Arc<dyn Clock>,
    input: InputBuffer,
    calibration: mpsc::UnboundedReceiver<CalibrationUpdate>,
    boss: BossController,
    projectiles: ProjectileManager,
    oracle: Box<dyn OverlapOracle>,
    sync: Box<dyn StateSink>,
    hits: Vec<HitEvent>,
    tick_rate: u32,
}

impl Simulation {
    /// Build the simulation from the stored state.
    ///
    /// Stored timers are discarded; every cadence gate starts at the local
    /// clock's current time.
    pub fn hydrate(document: &StateDocument, deps: SimulationDeps) -> Self {
        let now = deps.clock.now_ms();
        let mut projectiles = ProjectileManager::new(deps.scene, deps.tick_rate);
        let mut state = SimulationState::new(now);

        state.player_position = document.player_position();
        state.player_hits = document.player_hits;
        state.boss_position = document.boss_position();
        state.boss_direction = Direction::from_wire(document.boss_direction);
        state.boss_phase = BossPhase::from_id(document.boss_phase).unwrap_or_else(|| {
            warn!(boss_phase = document.boss_phase, "Unknown stored boss phase, using 1");
            BossPhase::Sweep
        });
        state.angle_cycle_index = if document.angle_cycle_index < FAN_ANGLES.len() {
            document.angle_cycle_index
        } else {
            warn!(
                angle_cycle_index = document.angle_cycle_index,
                "Stored angle index out of range, wrapping"
            );
            document.angle_cycle_index % FAN_ANGLES.len()
        };
        state.boss_health = if document.boss_health == 0 {
            info!("Stored fight already won, starting a new one");
            BOSS_MAX_HEALTH
        } else {
            document.boss_health
        };
        state.hsv_calibration = document.hsv_values.or(deps.fallback_calibration);

        for shot in &document.player_shots {
            projectiles.spawn_player_shot(&mut state, shot.position(), now);
        }
        for shot in &document.boss_shots {
            let motion = match shot.remaining_bounces {
                Some(remaining_bounces) => Motion::Bouncing {
                    vx: shot.vx,
                    vy: shot.vy,
                    remaining_bounces,
                },
                None => Motion::Straight {
                    vx: shot.vx,
                    vy: shot.vy,
                },
            };
            projectiles.spawn(&mut state, Owner::Boss, shot.position(), motion);
        }

        info!(
            player_x = state.player_position.x,
            player_y = state.player_position.y,
            boss_phase = state.boss_phase.id(),
            boss_health = state.boss_health,
            projectiles = state.projectile_count(),
            calibrated = state.hsv_calibration.is_some(),
            "Simulation hydrated"
        );

        Self {
            state,
            clock: deps.clock,
            input: deps.input,
            calibration: deps.calibration,
            boss: BossController::new(deps.rng_seed),
            projectiles,
            oracle: deps.oracle,
            sync: deps.sync,
            hits: Vec::new(),
            tick_rate: deps.tick_rate,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn is_calibrated(&self) -> bool {
        self.state.hsv_calibration.is_some()
    }

    /// Run the fixed-rate loop until the boss falls or `shutdown` resolves.
    ///
    /// Ticking does not begin until a calibration is present.
    pub async fn run<F>(mut self, shutdown: F) -> Result<SyncStats, SimulationError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if !self.is_calibrated() {
            info!("Waiting for HSV calibration before starting");
            while !self.is_calibrated() {
                tokio::select! {
                    update = self.calibration.recv() => match update {
                        Some(update) => self.apply_calibration(update),
                        None => return Err(SimulationError::CalibrationUnavailable),
                    },
                    _ = &mut shutdown => {
                        info!("Shutdown before calibration");
                        return Ok(self.sync.stats());
                    }
                }
            }
            let now = self.clock.now_ms();
            self.anchor_timers(now);

            // positions tracked during the wait are stale by now
            let stale = self.input.discard_pending();
            if stale > 0 {
                debug!(stale, "Dropped input queued before calibration");
            }
        }

        info!(tick_rate = self.tick_rate, "Simulation started");

        let mut tick_interval = interval(tick_duration(self.tick_rate));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {}
                _ = &mut shutdown => {
                    info!(tick = self.state.tick, "Shutdown requested");
                    break;
                }
            }

            self.step();

            if !self.state.running {
                info!(
                    tick = self.state.tick,
                    player_hits = self.state.player_hits,
                    "Fight over"
                );
                break;
            }
        }

        self.sync.push_state(StateDocument::from_state(&self.state));
        self.flush().await;

        let stats = self.sync.stats();
        info!(
            ticks = self.state.tick,
            uptime_secs = uptime_secs(),
            states_sent = stats.states_sent,
            states_failed = stats.states_failed,
            avg_payload_bytes = stats.avg_payload_bytes,
            "Simulation stopped"
        );
        Ok(stats)
    }

    /// Run a single simulation tick
    pub fn step(&mut self) {
        let now = self.clock.now_ms();
        self.state.tick += 1;

        self.drain_calibration();
        self.sync.poll();

        // Ingest tracked input
        if let Some(target) = self.input.tick(now, &mut self.state.player_position) {
            trace!(x = target.x, y = target.y, "Player moving");
        }

        // Boss phase, movement and fire
        self.boss.tick(&mut self.state, now, &mut self.projectiles);

        // Player shots
        self.projectiles.fire_player_shot(&mut self.state, now);
        self.projectiles.advance_player_shots(&mut self.state, now);

        // Boss shots
        self.projectiles.advance_boss_shots(&mut self.state);

        // Hits
        self.oracle.detect(&self.state, &mut self.hits);
        for hit in self.hits.drain(..) {
            self.projectiles.resolve_hit(&mut self.state, &hit);
        }

        // Escaped shots
        self.projectiles.prune(&mut self.state);

        if self.state.tick % SYNC_PERIOD_TICKS == 0 {
            self.sync.push_state(StateDocument::from_state(&self.state));
        }
    }

    fn drain_calibration(&mut self) {
        while let Ok(update) = self.calibration.try_recv() {
            self.apply_calibration(update);
        }
    }

    /// Store a calibration change and push it right away
    fn apply_calibration(&mut self, update: CalibrationUpdate) {
        match update.apply(self.state.hsv_calibration) {
            Ok(hsv) => {
                if self.state.hsv_calibration == Some(hsv) {
                    return;
                }
                info!(hsv = %hsv, "Calibration updated");
                self.state.hsv_calibration = Some(hsv);
                self.sync.push_calibration(hsv);
            }
            Err(e) => warn!(error = %e, "Calibration update rejected"),
        }
    }

    fn anchor_timers(&mut self, now: Millis) {
        self.state.boss_phase_started_at = now;
        self.state.last_boss_shot_at = now;
        self.state.last_player_shot_at = now;
    }

    /// Wait briefly for in-flight pushes so the final state is not dropped
    async fn flush(&mut self) {
        let deadline = Instant::now() + FLUSH_TIMEOUT;
        loop {
            self.sync.poll();
            if self.sync.stats().in_flight() == 0 {
                break;
            }
            if Instant::now() >= deadline {
                debug!(in_flight = self.sync.stats().in_flight(), "Gave up waiting for sync");
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Simulation errors
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("No HSV calibration available and the calibration source closed")]
    CalibrationUnavailable,
}
