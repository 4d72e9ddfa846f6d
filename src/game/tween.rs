//! Timed linear interpolation between two positions

use crate::util::time::Millis;

use super::Position;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: Position,
    pub to: Position,
    pub started_at: Millis,
    pub duration_ms: Millis,
}

impl Tween {
    pub fn new(from: Position, to: Position, started_at: Millis, duration_ms: Millis) -> Self {
        Self {
            from,
            to,
            started_at,
            duration_ms,
        }
    }

    /// Tween covering the distance at a constant speed (units per second)
    pub fn at_speed(from: Position, to: Position, started_at: Millis, speed: f32) -> Self {
        let distance = from.distance_sq(to).sqrt();
        let duration_ms = if speed > 0.0 {
            (1000.0 * distance / speed).round() as Millis
        } else {
            0
        };
        Self::new(from, to, started_at, duration_ms)
    }

    /// Fraction completed at `now`, in 0..=1
    pub fn progress(&self, now: Millis) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed as f32 / self.duration_ms as f32).min(1.0)
    }

    pub fn sample(&self, now: Millis) -> Position {
        self.from.lerp(self.to, self.progress(now))
    }

    pub fn is_complete(&self, now: Millis) -> bool {
        now >= self.started_at + self.duration_ms
    }
}
