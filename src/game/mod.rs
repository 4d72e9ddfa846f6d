//! Game simulation modules

pub mod boss;
pub mod collision;
pub mod input;
pub mod projectiles;
pub mod scene;
pub mod simulation;
pub mod state;
pub mod tween;

pub use simulation::Simulation;
pub use state::SimulationState;

use serde::{Deserialize, Serialize};

/// Arena width in logical units
pub const ARENA_WIDTH: f32 = 600.0;
/// Arena height in logical units
pub const ARENA_HEIGHT: f32 = 800.0;
/// Physics bounds are inset by this much on every side
pub const WORLD_MARGIN: f32 = 1.0;

/// Point in arena coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation, `t` clamped to 0..=1
    pub fn lerp(self, to: Position, t: f32) -> Position {
        let t = t.clamp(0.0, 1.0);
        Position {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }

    pub fn distance_sq(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

/// Velocity for a heading in degrees (0 = +x, 90 = down)
pub fn heading_velocity(degrees: f32, speed: f32) -> (f32, f32) {
    let radians = degrees.to_radians();
    (radians.cos() * speed, radians.sin() * speed)
}
