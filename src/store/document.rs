//! Wire form of the simulation state exchanged with the store

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::calibration::HsvCalibration;
use crate::game::state::{
    BossPhase, Owner, Projectile, BOSS_MAX_HEALTH, DEFAULT_BOSS_POSITION, DEFAULT_PLAYER_POSITION,
};
use crate::game::{Position, SimulationState};
use crate::util::time::Millis;

/// Projectile as stored remotely
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotDocument {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_bounces: Option<u8>,
}

impl ShotDocument {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

impl From<&Projectile> for ShotDocument {
    fn from(projectile: &Projectile) -> Self {
        let (vx, vy) = projectile.velocity();
        Self {
            id: projectile.id,
            x: projectile.position.x,
            y: projectile.position.y,
            vx,
            vy,
            remaining_bounces: projectile.remaining_bounces(),
        }
    }
}

/// `GET /game_state` body and `POST /update_game_state` payload.
///
/// Every field falls back to a fresh-fight default, so partial documents
/// hydrate cleanly. Local timers are only ever sent, never read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDocument {
    pub player_x: f32,
    pub player_y: f32,
    pub player_hits: u32,

    pub boss_x: f32,
    pub boss_y: f32,
    pub boss_direction: i64,
    pub boss_phase: u8,
    pub boss_health: u32,

    #[serde(rename = "bullets")]
    pub player_shots: Vec<ShotDocument>,
    #[serde(rename = "boss_bullets")]
    pub boss_shots: Vec<ShotDocument>,

    #[serde(deserialize_with = "lenient_hsv")]
    pub hsv_values: Option<HsvCalibration>,
    pub angle_cycle_index: usize,
    pub running: bool,

    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub last_bullet_time: Option<Millis>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub last_boss_bullet_time: Option<Millis>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub boss_start_time: Option<Millis>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            player_x: DEFAULT_PLAYER_POSITION.x,
            player_y: DEFAULT_PLAYER_POSITION.y,
            player_hits: 0,
            boss_x: DEFAULT_BOSS_POSITION.x,
            boss_y: DEFAULT_BOSS_POSITION.y,
            boss_direction: 1,
            boss_phase: BossPhase::Sweep.id(),
            boss_health: BOSS_MAX_HEALTH,
            player_shots: Vec::new(),
            boss_shots: Vec::new(),
            hsv_values: None,
            angle_cycle_index: 0,
            running: true,
            tick: None,
            last_bullet_time: None,
            last_boss_bullet_time: None,
            boss_start_time: None,
        }
    }
}

impl StateDocument {
    /// Full snapshot of the local state
    pub fn from_state(state: &SimulationState) -> Self {
        Self {
            player_x: state.player_position.x,
            player_y: state.player_position.y,
            player_hits: state.player_hits,
            boss_x: state.boss_position.x,
            boss_y: state.boss_position.y,
            boss_direction: state.boss_direction.to_wire() as i64,
            boss_phase: state.boss_phase.id(),
            boss_health: state.boss_health,
            player_shots: state.pool(Owner::Player).iter().map(ShotDocument::from).collect(),
            boss_shots: state.pool(Owner::Boss).iter().map(ShotDocument::from).collect(),
            hsv_values: state.hsv_calibration,
            angle_cycle_index: state.angle_cycle_index,
            running: state.running,
            tick: Some(state.tick),
            last_bullet_time: Some(state.last_player_shot_at),
            last_boss_bullet_time: Some(state.last_boss_shot_at),
            boss_start_time: Some(state.boss_phase_started_at),
        }
    }

    pub fn player_position(&self) -> Position {
        Position::new(self.player_x, self.player_y)
    }

    pub fn boss_position(&self) -> Position {
        Position::new(self.boss_x, self.boss_y)
    }
}

/// Calibration that fails validation is treated as absent
fn lenient_hsv<'de, D>(deserializer: D) -> Result<Option<HsvCalibration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match serde_json::from_value(value) {
        Ok(hsv) => Some(hsv),
        Err(e) => {
            warn!(error = %e, "Ignoring invalid stored HSV calibration");
            None
        }
    }))
}

/// `POST /update_hsv_values` body
#[derive(Debug, Clone, Serialize)]
pub struct HsvUpdate {
    pub hsv_values: HsvCalibration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_store_document_parses() {
        let json = r#"{
            "player_x": 300, "player_y": 760,
            "boss_x": 300, "boss_y": 20, "boss_health": 10,
            "bullets": [], "boss_bullets": [], "running": true
        }"#;
        let doc: StateDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.player_position(), Position::new(300.0, 760.0));
        assert_eq!(doc.boss_phase, 1);
        assert_eq!(doc.boss_direction, 1);
        assert_eq!(doc.hsv_values, None);
    }

    #[test]
    fn empty_object_is_a_fresh_fight() {
        let doc: StateDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc, StateDocument::default());
    }

    #[test]
    fn invalid_calibration_is_dropped_not_fatal() {
        let doc: StateDocument =
            serde_json::from_str(r#"{"hsv_values": [999, 0, 0, 0, 0, 0], "boss_phase": 2}"#).unwrap();
        assert_eq!(doc.hsv_values, None);
        assert_eq!(doc.boss_phase, 2);
    }

    #[test]
    fn local_timers_are_sent_but_not_read() {
        let mut state = SimulationState::new(1234);
        state.tick = 15;
        let doc = StateDocument::from_state(&state);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["last_boss_bullet_time"], 1234);
        assert_eq!(json["bullets"], serde_json::json!([]));

        let back: StateDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back.last_boss_bullet_time, None);
        assert_eq!(back.tick, None);
    }

    #[test]
    fn bounces_only_serialized_when_present() {
        let doc = ShotDocument {
            remaining_bounces: None,
            ..Default::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("remaining_bounces").is_none());
    }

    #[test]
    fn hsv_update_body_shape() {
        let body = HsvUpdate {
            hsv_values: HsvCalibration::new([0, 0, 195, 179, 255, 255]).unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"hsv_values": [0, 0, 195, 179, 255, 255]})
        );
    }
}
