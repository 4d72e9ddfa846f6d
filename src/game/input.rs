//! Input smoothing buffer
//!
//! The tracker pushes positions at its own pace; the simulation pulls at most
//! one per tick and glides the player toward it.

use tokio::sync::mpsc;

use crate::util::time::Millis;

use super::tween::Tween;
use super::Position;

/// Duration of the glide toward each tracked sample
pub const MOVE_DURATION_MS: Millis = 100;
/// Samples held while the simulation is behind the tracker
pub const INPUT_QUEUE_CAPACITY: usize = 8;

/// Producer handle given to the tracking task
#[derive(Clone, Debug)]
pub struct InputSender {
    tx: mpsc::Sender<Position>,
}

impl InputSender {
    /// Queue a tracked position. Returns false when the queue is full or the
    /// simulation is gone.
    pub fn push(&self, position: Position) -> bool {
        self.tx.try_send(position).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side owned by the simulation loop
#[derive(Debug)]
pub struct InputBuffer {
    rx: mpsc::Receiver<Position>,
    active: Option<Tween>,
    last_tick: Option<Millis>,
}

/// Create a connected producer/consumer pair
pub fn input_channel() -> (InputSender, InputBuffer) {
    let (tx, rx) = mpsc::channel(INPUT_QUEUE_CAPACITY);
    (
        InputSender { tx },
        InputBuffer {
            rx,
            active: None,
            last_tick: None,
        },
    )
}

impl InputBuffer {
    /// Advance player motion by one tick.
    ///
    /// Pops the oldest queued sample, if any, and starts a glide toward it
    /// from where the player stood last tick. The glide is anchored at the
    /// previous tick so the tick that starts it already moves the player.
    /// Returns the new target.
    pub fn tick(&mut self, now: Millis, player: &mut Position) -> Option<Position> {
        let previous = self.last_tick.replace(now).unwrap_or(now);

        let started = match self.rx.try_recv() {
            Ok(target) => {
                self.active = Some(Tween::new(*player, target, previous, MOVE_DURATION_MS));
                Some(target)
            }
            Err(_) => None,
        };

        if let Some(tween) = self.active {
            *player = tween.sample(now);
            if tween.is_complete(now) {
                self.active = None;
            }
        }

        started
    }

    /// Drop every queued sample. Returns how many were discarded.
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }

    /// Target of the glide in progress
    #[cfg(test)]
    pub fn current_target(&self) -> Option<Position> {
        self.active.map(|tween| tween.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_buffer_leaves_player_still() {
        let (_tx, mut buffer) = input_channel();
        let mut player = Position::new(10.0, 10.0);
        assert_eq!(buffer.tick(0, &mut player), None);
        assert_eq!(player, Position::new(10.0, 10.0));
    }

    #[test]
    fn glides_to_target_over_fixed_duration() {
        let (tx, mut buffer) = input_channel();
        let mut player = Position::new(0.0, 0.0);
        assert!(tx.push(Position::new(100.0, 0.0)));

        assert_eq!(buffer.tick(1000, &mut player), Some(Position::new(100.0, 0.0)));
        assert_eq!(player, Position::new(0.0, 0.0));

        buffer.tick(1050, &mut player);
        assert_eq!(player, Position::new(50.0, 0.0));

        buffer.tick(1100, &mut player);
        assert_eq!(player, Position::new(100.0, 0.0));
        assert_eq!(buffer.current_target(), None);
    }

    #[test]
    fn consumes_in_fifo_order_one_per_tick() {
        let (tx, mut buffer) = input_channel();
        let mut player = Position::new(0.0, 0.0);
        tx.push(Position::new(1.0, 1.0));
        tx.push(Position::new(2.0, 2.0));

        assert_eq!(buffer.tick(0, &mut player), Some(Position::new(1.0, 1.0)));
        assert_eq!(buffer.current_target(), Some(Position::new(1.0, 1.0)));

        assert_eq!(buffer.tick(16, &mut player), Some(Position::new(2.0, 2.0)));
        assert_eq!(buffer.tick(32, &mut player), None);
    }

    fn assert_near(actual: Position, expected: Position) {
        assert!(
            actual.distance_sq(expected) < 1e-4,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn new_sample_starts_from_interpolated_position() {
        let (tx, mut buffer) = input_channel();
        let mut player = Position::new(0.0, 0.0);
        tx.push(Position::new(100.0, 0.0));
        buffer.tick(0, &mut player);
        buffer.tick(50, &mut player);
        assert_eq!(player, Position::new(50.0, 0.0));

        // takes over from (50, 0), where the player stood at tick 50
        tx.push(Position::new(50.0, 100.0));
        buffer.tick(60, &mut player);
        assert_near(player, Position::new(50.0, 10.0));
        buffer.tick(150, &mut player);
        assert_eq!(player, Position::new(50.0, 100.0));
    }

    #[test]
    fn one_sample_per_tick_still_converges() {
        let (tx, mut buffer) = input_channel();
        let mut player = Position::new(300.0, 760.0);
        let target = Position::new(100.0, 760.0);

        let mut previous_x = player.x;
        for tick in 0..60u64 {
            assert!(tx.push(target));
            buffer.tick(tick * 16, &mut player);
            if tick > 0 {
                assert!(player.x < previous_x, "stalled on tick {tick}");
            }
            previous_x = player.x;
        }
        assert!((player.x - target.x).abs() < 0.5, "player at {player:?}");
    }

    #[test]
    fn full_queue_rejects_new_samples() {
        let (tx, mut buffer) = input_channel();
        for i in 0..INPUT_QUEUE_CAPACITY {
            assert!(tx.push(Position::new(i as f32, 0.0)));
        }
        assert!(!tx.push(Position::new(99.0, 0.0)));
        assert!(!tx.is_closed());

        let mut player = Position::default();
        assert_eq!(buffer.tick(0, &mut player), Some(Position::new(0.0, 0.0)));
        assert!(tx.push(Position::new(99.0, 0.0)));
    }

    #[test]
    fn discard_pending_empties_the_queue() {
        let (tx, mut buffer) = input_channel();
        tx.push(Position::new(1.0, 1.0));
        tx.push(Position::new(2.0, 2.0));
        assert_eq!(buffer.discard_pending(), 2);

        let mut player = Position::default();
        assert_eq!(buffer.tick(0, &mut player), None);
        assert!(tx.push(Position::new(3.0, 3.0)));
        assert_eq!(buffer.tick(16, &mut player), Some(Position::new(3.0, 3.0)));
    }

    #[test]
    fn samples_pushed_before_consumer_runs_are_kept() {
        let (tx, mut buffer) = input_channel();
        for i in 0..3 {
            tx.push(Position::new(i as f32, 0.0));
        }
        let mut player = Position::default();
        let consumed: Vec<_> = (0..4)
            .filter_map(|t| buffer.tick(t * 16, &mut player))
            .collect();
        assert_eq!(
            consumed,
            vec![
                Position::new(0.0, 0.0),
                Position::new(1.0, 0.0),
                Position::new(2.0, 0.0)
            ]
        );
    }

    #[test]
    fn push_fails_after_consumer_dropped() {
        let (tx, buffer) = input_channel();
        drop(buffer);
        assert!(!tx.push(Position::new(1.0, 1.0)));
    }
}
