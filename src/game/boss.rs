//! Boss phase state machine and attack patterns

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::util::time::Millis;

use super::projectiles::ProjectileManager;
use super::state::{BossPhase, Motion, Owner, SimulationState};
use super::{heading_velocity, Position, ARENA_WIDTH};

/// Time spent in a phase before switching
pub const PHASE_INTERVAL_MS: Millis = 8000;

/// Fan shot headings in degrees, cycled one step per volley
pub const FAN_ANGLES: [f32; 5] = [150.0, 120.0, 90.0, 60.0, 30.0];
/// Fixed fan shot origins
pub const FAN_ORIGINS: [Position; 2] = [Position::new(200.0, 1.0), Position::new(400.0, 1.0)];

/// Projectiles per radial burst
pub const BURST_COUNT: usize = 12;
/// Wall bounces each burst projectile survives
pub const BURST_BOUNCES: u8 = 3;

/// Per-phase tuning
#[derive(Debug, Clone, Copy)]
pub struct PhaseStats {
    /// Horizontal movement per tick (0 = stationary)
    pub move_speed: f32,
    /// Minimum time between volleys
    pub fire_interval_ms: Millis,
    /// Projectile speed (units per second)
    pub projectile_speed: f32,
}

impl PhaseStats {
    pub fn for_phase(phase: BossPhase) -> Self {
        match phase {
            BossPhase::Sweep => Self {
                move_speed: 3.0,
                fire_interval_ms: 500,
                projectile_speed: 300.0,
            },
            BossPhase::Fan => Self {
                move_speed: 0.0,
                fire_interval_ms: 200,
                projectile_speed: 240.0,
            },
            BossPhase::Burst => Self {
                move_speed: 1.0,
                fire_interval_ms: 1500,
                projectile_speed: 180.0,
            },
        }
    }
}

/// Drives phase changes, movement and boss fire
pub struct BossController {
    rng: ChaCha8Rng,
}

impl BossController {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng }
    }

    /// Run one boss tick: maybe switch phase, then move and fire
    pub fn tick(
        &mut self,
        state: &mut SimulationState,
        now: Millis,
        projectiles: &mut ProjectileManager,
    ) {
        if now.saturating_sub(state.boss_phase_started_at) >= PHASE_INTERVAL_MS {
            let previous = state.boss_phase;
            state.boss_phase = self.next_phase(previous);
            state.boss_phase_started_at = now;
            info!(
                tick = state.tick,
                from = previous.id(),
                to = state.boss_phase.id(),
                "Boss phase changed"
            );
        }

        let stats = PhaseStats::for_phase(state.boss_phase);
        match state.boss_phase {
            BossPhase::Sweep => {
                Self::drift(state, stats.move_speed);
                if Self::ready_to_fire(state, now, &stats) {
                    let origin = state.boss_position;
                    projectiles.spawn(
                        state,
                        Owner::Boss,
                        origin,
                        Motion::Straight {
                            vx: 0.0,
                            vy: stats.projectile_speed,
                        },
                    );
                    state.last_boss_shot_at = now;
                }
            }
            BossPhase::Fan => {
                if Self::ready_to_fire(state, now, &stats) {
                    let angle = FAN_ANGLES[state.angle_cycle_index];
                    let (vx, vy) = heading_velocity(angle, stats.projectile_speed);
                    for origin in FAN_ORIGINS {
                        projectiles.spawn(state, Owner::Boss, origin, Motion::Straight { vx, vy });
                    }
                    state.angle_cycle_index = (state.angle_cycle_index + 1) % FAN_ANGLES.len();
                    state.last_boss_shot_at = now;
                }
            }
            BossPhase::Burst => {
                // drifts against the sweep's sign convention
                Self::drift(state, -stats.move_speed);
                if Self::ready_to_fire(state, now, &stats) {
                    let origin = state.boss_position;
                    let step = 360.0 / BURST_COUNT as f32;
                    for i in 0..BURST_COUNT {
                        let (vx, vy) = heading_velocity(i as f32 * step, stats.projectile_speed);
                        projectiles.spawn(
                            state,
                            Owner::Boss,
                            origin,
                            Motion::Bouncing {
                                vx,
                                vy,
                                remaining_bounces: BURST_BOUNCES,
                            },
                        );
                    }
                    state.last_boss_shot_at = now;
                }
            }
        }
    }

    /// Uniform pick among the phases other than `current`
    pub fn next_phase(&mut self, current: BossPhase) -> BossPhase {
        let candidates = current.others();
        candidates[self.rng.gen_range(0..candidates.len())]
    }

    fn ready_to_fire(state: &SimulationState, now: Millis, stats: &PhaseStats) -> bool {
        now.saturating_sub(state.last_boss_shot_at) >= stats.fire_interval_ms
    }

    /// Move by `speed * direction`, reversing when pushing past an edge
    fn drift(state: &mut SimulationState, speed: f32) {
        let step = speed * state.boss_direction.sign();
        state.boss_position.x += step;

        let x = state.boss_position.x;
        if (x <= 0.0 && step < 0.0) || (x >= ARENA_WIDTH && step > 0.0) {
            state.boss_direction = state.boss_direction.reversed();
        }
    }
}
