//! Boundary to the rendering/physics collaborator
//!
//! Every pooled projectile has exactly one live entity in the scene. The
//! projectile manager calls `spawn_entity` in the same step that inserts into
//! a pool and `destroy_entity` in the same step that removes from it.

use tracing::trace;

use super::state::{Projectile, ProjectileId};

/// Why a projectile left its pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    /// Player shot finished its flight
    Expired,
    /// Wall contact with no bounces left
    WallContact,
    /// Drifted past the arena bounds
    OutOfBounds,
    /// Reported by the overlap oracle
    Hit,
}

pub trait Scene: Send {
    fn spawn_entity(&mut self, projectile: &Projectile);
    fn destroy_entity(&mut self, id: ProjectileId, reason: RetireReason);
}

/// Scene that only traces entity churn (headless runs)
#[derive(Debug, Default)]
pub struct TraceScene;

impl Scene for TraceScene {
    fn spawn_entity(&mut self, projectile: &Projectile) {
        trace!(
            id = %projectile.id,
            owner = ?projectile.owner,
            x = projectile.position.x,
            y = projectile.position.y,
            "Entity spawned"
        );
    }

    fn destroy_entity(&mut self, id: ProjectileId, reason: RetireReason) {
        trace!(id = %id, ?reason, "Entity destroyed");
    }
}
