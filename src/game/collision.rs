//! Hit detection between projectiles and the two combatants

use super::state::{Owner, ProjectileId, SimulationState};
use super::Position;

/// Player body radius
pub const PLAYER_RADIUS: f32 = 10.0;
/// Boss body radius (25 unit square)
pub const BOSS_RADIUS: f32 = 12.5;
/// Projectile hitbox radius
pub const SHOT_RADIUS: f32 = 2.0;

/// A projectile touched the opposing combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitEvent {
    pub projectile_id: ProjectileId,
    /// Owner of the projectile (the target is the other side)
    pub owner: Owner,
}

/// Source of hit events for the current tick.
/// May report the same projectile more than once; resolution is idempotent.
pub trait OverlapOracle: Send {
    fn detect(&mut self, state: &SimulationState, hits: &mut Vec<HitEvent>);
}

/// Circle-vs-circle overlap against the current positions
#[derive(Debug, Clone, Copy)]
pub struct CircleOverlap {
    pub player_radius: f32,
    pub boss_radius: f32,
    pub shot_radius: f32,
}

impl Default for CircleOverlap {
    fn default() -> Self {
        Self {
            player_radius: PLAYER_RADIUS,
            boss_radius: BOSS_RADIUS,
            shot_radius: SHOT_RADIUS,
        }
    }
}

impl CircleOverlap {
    fn overlaps(&self, shot: Position, target: Position, target_radius: f32) -> bool {
        let combined_radius = self.shot_radius + target_radius;
        shot.distance_sq(target) <= combined_radius * combined_radius
    }
}

impl OverlapOracle for CircleOverlap {
    fn detect(&mut self, state: &SimulationState, hits: &mut Vec<HitEvent>) {
        for shot in &state.player_shots {
            if self.overlaps(shot.position, state.boss_position, self.boss_radius) {
                hits.push(HitEvent {
                    projectile_id: shot.id,
                    owner: Owner::Player,
                });
            }
        }
        for shot in &state.boss_shots {
            if self.overlaps(shot.position, state.player_position, self.player_radius) {
                hits.push(HitEvent {
                    projectile_id: shot.id,
                    owner: Owner::Boss,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Motion, Projectile};

    #[test]
    fn detects_hits_on_both_sides() {
        let mut state = SimulationState::new(0);
        let near_boss = Projectile::new(
            Owner::Player,
            Position::new(state.boss_position.x + 10.0, state.boss_position.y),
            Motion::Straight { vx: 0.0, vy: 0.0 },
        );
        let far = Projectile::new(
            Owner::Player,
            Position::new(0.0, 400.0),
            Motion::Straight { vx: 0.0, vy: 0.0 },
        );
        let near_player = Projectile::new(
            Owner::Boss,
            state.player_position,
            Motion::Straight { vx: 0.0, vy: 0.0 },
        );
        let near_id = near_boss.id;
        let player_id = near_player.id;
        state.player_shots = vec![near_boss, far];
        state.boss_shots = vec![near_player];

        let mut hits = Vec::new();
        CircleOverlap::default().detect(&state, &mut hits);
        assert_eq!(
            hits,
            vec![
                HitEvent {
                    projectile_id: near_id,
                    owner: Owner::Player
                },
                HitEvent {
                    projectile_id: player_id,
                    owner: Owner::Boss
                },
            ]
        );
    }

    #[test]
    fn player_shots_do_not_hit_player() {
        let mut state = SimulationState::new(0);
        state.player_shots = vec![Projectile::new(
            Owner::Player,
            state.player_position,
            Motion::Straight { vx: 0.0, vy: 0.0 },
        )];
        let mut hits = Vec::new();
        CircleOverlap::default().detect(&state, &mut hits);
        assert!(hits.is_empty());
    }
}
