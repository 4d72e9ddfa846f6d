//! Simulation state owned by the tick loop

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calibration::HsvCalibration;
use crate::util::time::Millis;

use super::tween::Tween;
use super::{Position, ARENA_WIDTH};

pub type ProjectileId = Uuid;

/// Boss health at the start of a fight
pub const BOSS_MAX_HEALTH: u32 = 10;
/// Player spawn point when the store has no position
pub const DEFAULT_PLAYER_POSITION: Position = Position::new(ARENA_WIDTH / 2.0, 760.0);
/// Boss spawn point when the store has no position
pub const DEFAULT_BOSS_POSITION: Position = Position::new(ARENA_WIDTH / 2.0, 20.0);

/// Boss attack pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BossPhase {
    /// Horizontal sweep, single downward shots
    Sweep,
    /// Stationary, twin fan shots on a rotating angle
    Fan,
    /// Slow drift, radial burst of wall-bouncing shots
    Burst,
}

impl BossPhase {
    pub const ALL: [BossPhase; 3] = [BossPhase::Sweep, BossPhase::Fan, BossPhase::Burst];

    /// Wire id (1..=3)
    pub fn id(self) -> u8 {
        match self {
            BossPhase::Sweep => 1,
            BossPhase::Fan => 2,
            BossPhase::Burst => 3,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        let index = usize::from(id).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    /// The two phases a transition may pick
    pub fn others(self) -> [BossPhase; 2] {
        match self {
            BossPhase::Sweep => [BossPhase::Fan, BossPhase::Burst],
            BossPhase::Fan => [BossPhase::Sweep, BossPhase::Burst],
            BossPhase::Burst => [BossPhase::Sweep, BossPhase::Fan],
        }
    }
}

impl TryFrom<u8> for BossPhase {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or_else(|| format!("unknown boss phase {id}"))
    }
}

impl From<BossPhase> for u8 {
    fn from(phase: BossPhase) -> Self {
        phase.id()
    }
}

/// Horizontal travel direction of the boss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Wire form is -1 / +1; anything negative means left
    pub fn from_wire(value: i64) -> Self {
        if value < 0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    pub fn to_wire(self) -> i8 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    Player,
    Boss,
}

/// How a projectile moves each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Timed move to a fixed target (player shots)
    Tween(Tween),
    /// Constant velocity, retired on first wall contact
    Straight { vx: f32, vy: f32 },
    /// Constant velocity, reflected off walls until the bounces run out
    Bouncing {
        vx: f32,
        vy: f32,
        remaining_bounces: u8,
    },
}

/// Active projectile
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner: Owner,
    pub position: Position,
    pub motion: Motion,
}

impl Projectile {
    pub fn new(owner: Owner, position: Position, motion: Motion) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            position,
            motion,
        }
    }

    /// Velocity in units per second; tweens report zero
    pub fn velocity(&self) -> (f32, f32) {
        match self.motion {
            Motion::Tween(_) => (0.0, 0.0),
            Motion::Straight { vx, vy } | Motion::Bouncing { vx, vy, .. } => (vx, vy),
        }
    }

    pub fn remaining_bounces(&self) -> Option<u8> {
        match self.motion {
            Motion::Bouncing {
                remaining_bounces, ..
            } => Some(remaining_bounces),
            _ => None,
        }
    }
}

/// The authoritative simulation aggregate.
/// Each field has exactly one writer:
/// - player position: input buffer
/// - boss fields, boss shot gate, angle index: boss controller
/// - projectile pools, player shot gate, health, hits: projectile manager
/// - calibration, tick, running: simulation loop
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub tick: u64,
    pub running: bool,

    pub player_position: Position,
    pub player_hits: u32,

    pub boss_position: Position,
    pub boss_direction: Direction,
    pub boss_phase: BossPhase,
    pub boss_phase_started_at: Millis,
    pub boss_health: u32,

    pub player_shots: Vec<Projectile>,
    pub boss_shots: Vec<Projectile>,

    pub last_player_shot_at: Millis,
    pub last_boss_shot_at: Millis,

    pub hsv_calibration: Option<HsvCalibration>,
    pub angle_cycle_index: usize,
}

impl SimulationState {
    /// Fresh fight with every timer anchored at `now`
    pub fn new(now: Millis) -> Self {
        Self {
            tick: 0,
            running: true,
            player_position: DEFAULT_PLAYER_POSITION,
            player_hits: 0,
            boss_position: DEFAULT_BOSS_POSITION,
            boss_direction: Direction::Right,
            boss_phase: BossPhase::Sweep,
            boss_phase_started_at: now,
            boss_health: BOSS_MAX_HEALTH,
            player_shots: Vec::new(),
            boss_shots: Vec::new(),
            last_player_shot_at: now,
            last_boss_shot_at: now,
            hsv_calibration: None,
            angle_cycle_index: 0,
        }
    }

    pub fn pool(&self, owner: Owner) -> &[Projectile] {
        match owner {
            Owner::Player => &self.player_shots,
            Owner::Boss => &self.boss_shots,
        }
    }

    pub fn pool_mut(&mut self, owner: Owner) -> &mut Vec<Projectile> {
        match owner {
            Owner::Player => &mut self.player_shots,
            Owner::Boss => &mut self.boss_shots,
        }
    }

    pub fn projectile_count(&self) -> usize {
        self.player_shots.len() + self.boss_shots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_others_never_include_self() {
        for phase in BossPhase::ALL {
            assert!(!phase.others().contains(&phase));
        }
    }

    #[test]
    fn phase_wire_ids_round_trip() {
        for phase in BossPhase::ALL {
            assert_eq!(BossPhase::from_id(phase.id()), Some(phase));
        }
        assert_eq!(BossPhase::from_id(0), None);
        assert_eq!(serde_json::to_string(&BossPhase::Fan).unwrap(), "2");
        assert!(serde_json::from_str::<BossPhase>("4").is_err());
    }

    #[test]
    fn direction_wire_form() {
        assert_eq!(Direction::from_wire(-3), Direction::Left);
        assert_eq!(Direction::from_wire(1), Direction::Right);
        assert_eq!(Direction::Left.reversed().to_wire(), 1);
    }
}
