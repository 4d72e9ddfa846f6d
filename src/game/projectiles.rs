//! Projectile lifecycle - spawn, advance, retire, hit resolution

use tracing::{debug, info};

use crate::util::time::{tick_delta, Millis};

use super::collision::HitEvent;
use super::scene::{RetireReason, Scene};
use super::state::{Motion, Owner, Projectile, ProjectileId, SimulationState};
use super::tween::Tween;
use super::{Position, ARENA_HEIGHT, ARENA_WIDTH, WORLD_MARGIN};

/// Minimum time between player shots
pub const PLAYER_FIRE_INTERVAL_MS: Millis = 200;
/// Player shot travel speed (units per second)
pub const PLAYER_SHOT_SPEED: f32 = 1200.0;
/// Player shots fly until fully above the arena
pub const SHOT_HEIGHT: f32 = 20.0;
/// Boss shots this far outside the arena are dropped without a wall contact
pub const PRUNE_EPSILON: f32 = 5.0;

const MIN_X: f32 = WORLD_MARGIN;
const MAX_X: f32 = ARENA_WIDTH - WORLD_MARGIN;
const MIN_Y: f32 = WORLD_MARGIN;
const MAX_Y: f32 = ARENA_HEIGHT - WORLD_MARGIN;

/// Which physics walls a shot is pressing against this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct WallContact {
    x: bool,
    y: bool,
}

impl WallContact {
    /// A wall counts only while the shot is moving out through it
    fn detect(position: Position, vx: f32, vy: f32) -> Self {
        Self {
            x: (position.x < MIN_X && vx < 0.0) || (position.x > MAX_X && vx > 0.0),
            y: (position.y < MIN_Y && vy < 0.0) || (position.y > MAX_Y && vy > 0.0),
        }
    }

    fn any(self) -> bool {
        self.x || self.y
    }
}

fn beyond_arena(position: Position) -> bool {
    position.x < -PRUNE_EPSILON
        || position.x > ARENA_WIDTH + PRUNE_EPSILON
        || position.y < -PRUNE_EPSILON
        || position.y > ARENA_HEIGHT + PRUNE_EPSILON
}

/// Move one boss shot by `dt` seconds. Returns true when it must be retired.
fn step_boss_shot(shot: &mut Projectile, dt: f32) -> bool {
    match &mut shot.motion {
        Motion::Tween(_) => false,
        Motion::Straight { vx, vy } => {
            shot.position.x += *vx * dt;
            shot.position.y += *vy * dt;
            WallContact::detect(shot.position, *vx, *vy).any()
        }
        Motion::Bouncing {
            vx,
            vy,
            remaining_bounces,
        } => {
            shot.position.x += *vx * dt;
            shot.position.y += *vy * dt;

            let contact = WallContact::detect(shot.position, *vx, *vy);
            if !contact.any() {
                return false;
            }
            if *remaining_bounces == 0 {
                return true;
            }

            if contact.x {
                *vx = -*vx;
                shot.position.x = shot.position.x.clamp(MIN_X, MAX_X);
            }
            if contact.y {
                *vy = -*vy;
                shot.position.y = shot.position.y.clamp(MIN_Y, MAX_Y);
            }
            *remaining_bounces -= 1;
            false
        }
    }
}

/// Owns the scene entities behind both projectile pools
pub struct ProjectileManager {
    scene: Box<dyn Scene>,
    dt: f32,
}

impl ProjectileManager {
    pub fn new(scene: Box<dyn Scene>, tick_rate: u32) -> Self {
        Self {
            scene,
            dt: tick_delta(tick_rate),
        }
    }

    /// Insert a projectile and create its entity in one step.
    /// Velocity is part of `motion`, so the entity is never inert.
    pub fn spawn(
        &mut self,
        state: &mut SimulationState,
        owner: Owner,
        position: Position,
        motion: Motion,
    ) -> ProjectileId {
        let projectile = Projectile::new(owner, position, motion);
        let id = projectile.id;
        self.scene.spawn_entity(&projectile);
        state.pool_mut(owner).push(projectile);
        id
    }

    /// Player shot heading straight up to just above the arena
    pub fn spawn_player_shot(
        &mut self,
        state: &mut SimulationState,
        position: Position,
        now: Millis,
    ) -> ProjectileId {
        let target = Position::new(position.x, -SHOT_HEIGHT);
        let tween = Tween::at_speed(position, target, now, PLAYER_SHOT_SPEED);
        self.spawn(state, Owner::Player, position, Motion::Tween(tween))
    }

    /// Fire from the player's position when the cadence allows
    pub fn fire_player_shot(
        &mut self,
        state: &mut SimulationState,
        now: Millis,
    ) -> Option<ProjectileId> {
        if now.saturating_sub(state.last_player_shot_at) < PLAYER_FIRE_INTERVAL_MS {
            return None;
        }
        let origin = state.player_position;
        let id = self.spawn_player_shot(state, origin, now);
        state.last_player_shot_at = now;
        Some(id)
    }

    /// Move player shots along their tweens and retire the finished ones
    pub fn advance_player_shots(&mut self, state: &mut SimulationState, now: Millis) {
        let mut finished: Vec<ProjectileId> = Vec::new();
        for shot in state.player_shots.iter_mut() {
            if let Motion::Tween(tween) = shot.motion {
                shot.position = tween.sample(now);
                if tween.is_complete(now) {
                    finished.push(shot.id);
                }
            }
        }
        self.retire(state, Owner::Player, &finished, RetireReason::Expired);
    }

    /// Integrate boss shots one tick and retire those that hit a wall for good
    pub fn advance_boss_shots(&mut self, state: &mut SimulationState) {
        let dt = self.dt;
        let mut spent: Vec<ProjectileId> = Vec::new();
        for shot in state.boss_shots.iter_mut() {
            if step_boss_shot(shot, dt) {
                spent.push(shot.id);
            }
        }
        self.retire(state, Owner::Boss, &spent, RetireReason::WallContact);
    }

    /// Drop boss shots that escaped the arena without registering a contact
    pub fn prune(&mut self, state: &mut SimulationState) {
        let escaped: Vec<ProjectileId> = state
            .boss_shots
            .iter()
            .filter(|shot| beyond_arena(shot.position))
            .map(|shot| shot.id)
            .collect();
        self.retire(state, Owner::Boss, &escaped, RetireReason::OutOfBounds);
    }

    /// Apply a hit. Returns false when the projectile is already gone.
    pub fn resolve_hit(&mut self, state: &mut SimulationState, hit: &HitEvent) -> bool {
        let removed = self.retire(state, hit.owner, &[hit.projectile_id], RetireReason::Hit);
        if removed == 0 {
            return false;
        }

        match hit.owner {
            Owner::Player => {
                state.boss_health = state.boss_health.saturating_sub(1);
                debug!(boss_health = state.boss_health, "Boss hit");
                if state.boss_health == 0 && state.running {
                    state.running = false;
                    info!(tick = state.tick, "Boss defeated");
                }
            }
            Owner::Boss => {
                state.player_hits += 1;
                debug!(player_hits = state.player_hits, "Player hit");
            }
        }
        true
    }

    /// Remove the listed projectiles from a pool and destroy their entities
    fn retire(
        &mut self,
        state: &mut SimulationState,
        owner: Owner,
        ids: &[ProjectileId],
        reason: RetireReason,
    ) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let scene = &mut self.scene;
        let pool = state.pool_mut(owner);
        let before = pool.len();
        pool.retain(|projectile| {
            if ids.contains(&projectile.id) {
                scene.destroy_entity(projectile.id, reason);
                false
            } else {
                true
            }
        });
        before - pool.len()
    }
}
