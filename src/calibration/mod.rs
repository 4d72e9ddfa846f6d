//! HSV calibration for the tracking service
//!
//! The simulation never reads these values; it only carries them between the
//! calibration console, the state store and the tracker.

pub mod console;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Largest hue OpenCV accepts in 8-bit HSV
pub const MAX_HUE: u8 = 179;
/// Largest saturation/value
pub const MAX_SV: u8 = 255;

/// Channel order on the wire: lower H,S,V then upper H,S,V
pub const CHANNEL_NAMES: [&str; 6] = ["lower_h", "lower_s", "lower_v", "upper_h", "upper_s", "upper_v"];

/// Lower/upper HSV thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[i64; 6]", into = "[i64; 6]")]
pub struct HsvCalibration {
    values: [u8; 6],
}

impl HsvCalibration {
    pub fn new(values: [i64; 6]) -> Result<Self, CalibrationError> {
        let mut out = [0u8; 6];
        for (index, value) in values.into_iter().enumerate() {
            out[index] = checked_channel(index, value)?;
        }
        Ok(Self { values: out })
    }

    pub fn to_array(self) -> [u8; 6] {
        self.values
    }

    /// Copy with one channel replaced
    pub fn with_channel(self, index: usize, value: i64) -> Result<Self, CalibrationError> {
        let checked = checked_channel(index, value)?;
        let mut values = self.values;
        values[index] = checked;
        Ok(Self { values })
    }
}

fn channel_max(index: usize) -> u8 {
    if index % 3 == 0 {
        MAX_HUE
    } else {
        MAX_SV
    }
}

fn checked_channel(index: usize, value: i64) -> Result<u8, CalibrationError> {
    if index >= 6 {
        return Err(CalibrationError::UnknownChannel(index));
    }
    let max = channel_max(index);
    if value < 0 || value > max as i64 {
        return Err(CalibrationError::OutOfRange {
            channel: CHANNEL_NAMES[index],
            value,
            max,
        });
    }
    Ok(value as u8)
}

impl TryFrom<[i64; 6]> for HsvCalibration {
    type Error = CalibrationError;

    fn try_from(values: [i64; 6]) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<HsvCalibration> for [i64; 6] {
    fn from(hsv: HsvCalibration) -> Self {
        hsv.to_array().map(i64::from)
    }
}

impl FromStr for HsvCalibration {
    type Err = CalibrationError;

    /// Six integers separated by commas and/or whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 6 {
            return Err(CalibrationError::WrongLength(parts.len()));
        }
        let mut values = [0i64; 6];
        for (slot, part) in values.iter_mut().zip(parts) {
            *slot = part
                .parse()
                .map_err(|_| CalibrationError::NotANumber(part.to_string()))?;
        }
        Self::new(values)
    }
}

impl fmt::Display for HsvCalibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.values;
        write!(f, "[{}, {}, {}]..[{}, {}, {}]", v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

/// Change reported by the calibration UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationUpdate {
    /// Replace all six thresholds
    Replace(HsvCalibration),
    /// Move a single slider
    Channel { index: usize, value: i64 },
}

impl CalibrationUpdate {
    /// Apply to the current calibration. A single-channel edit needs a base.
    pub fn apply(
        self,
        current: Option<HsvCalibration>,
    ) -> Result<HsvCalibration, CalibrationError> {
        match self {
            CalibrationUpdate::Replace(hsv) => Ok(hsv),
            CalibrationUpdate::Channel { index, value } => current
                .ok_or(CalibrationError::Uncalibrated)?
                .with_channel(index, value),
        }
    }
}

/// Calibration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalibrationError {
    #[error("expected 6 HSV values, got {0}")]
    WrongLength(usize),

    #[error("not a number: {0}")]
    NotANumber(String),

    #[error("unknown channel index {0}")]
    UnknownChannel(usize),

    #[error("{channel} = {value} is outside 0..={max}")]
    OutOfRange {
        channel: &'static str,
        value: i64,
        max: u8,
    },

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("no calibration to edit yet; send all six values first")]
    Uncalibrated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_and_sv_bounds_are_enforced() {
        assert!(HsvCalibration::new([179, 255, 255, 179, 255, 255]).is_ok());
        assert_eq!(
            HsvCalibration::new([180, 0, 0, 0, 0, 0]),
            Err(CalibrationError::OutOfRange {
                channel: "lower_h",
                value: 180,
                max: 179
            })
        );
        assert!(HsvCalibration::new([0, 256, 0, 0, 0, 0]).is_err());
        assert!(HsvCalibration::new([0, 0, -1, 0, 0, 0]).is_err());
    }

    #[test]
    fn serializes_as_plain_array() {
        let hsv = HsvCalibration::new([0, 0, 195, 179, 255, 255]).unwrap();
        let json = serde_json::to_string(&hsv).unwrap();
        assert_eq!(json, "[0,0,195,179,255,255]");
        let back: HsvCalibration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hsv);
        assert!(serde_json::from_str::<HsvCalibration>("[0,0,0,300,0,0]").is_err());
    }

    #[test]
    fn parses_mixed_separators() {
        let hsv: HsvCalibration = "0, 0 195,179 255 255".parse().unwrap();
        assert_eq!(hsv.to_array(), [0, 0, 195, 179, 255, 255]);
        assert_eq!(
            "1 2 3".parse::<HsvCalibration>(),
            Err(CalibrationError::WrongLength(3))
        );
    }

    #[test]
    fn channel_edit_requires_base() {
        let edit = CalibrationUpdate::Channel { index: 2, value: 190 };
        assert_eq!(edit.apply(None), Err(CalibrationError::Uncalibrated));

        let base = HsvCalibration::new([0, 0, 195, 179, 255, 255]).unwrap();
        let edited = edit.apply(Some(base)).unwrap();
        assert_eq!(edited.to_array(), [0, 0, 190, 179, 255, 255]);

        let bad_hue = CalibrationUpdate::Channel { index: 3, value: 200 };
        assert!(bad_hue.apply(Some(base)).is_err());
    }
}
