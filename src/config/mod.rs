//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::calibration::HsvCalibration;
use crate::util::time::DEFAULT_SIMULATION_TPS;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Authoritative state store base URL
    pub store_url: String,
    /// Tracking service base URL
    pub tracker_url: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Interval between frames sent to the tracker
    pub capture_interval: Duration,
    /// JPEG frame re-read on every capture (tracking disabled when unset)
    pub frame_path: Option<PathBuf>,
    /// Directory receiving tracker preview images
    pub preview_dir: Option<PathBuf>,

    /// Calibration used when the store has none
    pub hsv_values: Option<HsvCalibration>,
    /// Seed for the boss phase RNG
    pub rng_seed: Option<u64>,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_url = lookup("STORE_URL")
            .unwrap_or_else(|| "http://127.0.0.1:5000".to_string())
            .trim_end_matches('/')
            .to_string();
        if !store_url.starts_with("http://") && !store_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl("STORE_URL"));
        }

        let tracker_url = match lookup("TRACKER_URL") {
            Some(url) => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ConfigError::InvalidUrl("TRACKER_URL"));
                }
                url.trim_end_matches('/').to_string()
            }
            None => store_url.clone(),
        };

        let tick_rate = parse_in_range(&lookup, "TICK_RATE", DEFAULT_SIMULATION_TPS as u64, 1, 240)?;
        let capture_ms = parse_in_range(&lookup, "CAPTURE_INTERVAL_MS", 30, 10, 1000)?;
        let timeout_ms = parse_in_range(&lookup, "REQUEST_TIMEOUT_MS", 2000, 50, 60_000)?;

        let hsv_values = match lookup("HSV_VALUES") {
            Some(raw) => Some(
                raw.parse::<HsvCalibration>()
                    .map_err(|_| ConfigError::Invalid("HSV_VALUES"))?,
            ),
            None => None,
        };

        let rng_seed = match lookup("RNG_SEED") {
            Some(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid("RNG_SEED"))?),
            None => None,
        };

        Ok(Self {
            store_url,
            tracker_url,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            tick_rate: tick_rate as u32,
            capture_interval: Duration::from_millis(capture_ms),
            frame_path: lookup("FRAME_PATH").map(PathBuf::from),
            preview_dir: lookup("PREVIEW_DIR").map(PathBuf::from),
            hsv_values,
            rng_seed,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

fn parse_in_range<F>(
    lookup: &F,
    key: &'static str,
    default: u64,
    min: u64,
    max: u64,
) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match lookup(key) {
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid(key))?,
        None => default,
    };
    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfRange { key, min, max });
    }
    Ok(value)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("{key} must be between {min} and {max}")]
    OutOfRange {
        key: &'static str,
        min: u64,
        max: u64,
    },

    #[error("{0} must be an http(s) URL")]
    InvalidUrl(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.store_url, "http://127.0.0.1:5000");
        assert_eq!(config.tracker_url, config.store_url);
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.capture_interval, Duration::from_millis(30));
        assert!(config.frame_path.is_none());
        assert!(config.hsv_values.is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = config_from(&[("STORE_URL", "http://store.local:5000/")]).unwrap();
        assert_eq!(config.store_url, "http://store.local:5000");
    }

    #[test]
    fn hsv_values_are_parsed() {
        let config = config_from(&[("HSV_VALUES", "0,0,195,179,255,255")]).unwrap();
        assert_eq!(
            config.hsv_values.map(|hsv| hsv.to_array()),
            Some([0, 0, 195, 179, 255, 255])
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("TICK_RATE", "0")]),
            Err(ConfigError::OutOfRange { key: "TICK_RATE", .. })
        ));
        assert!(matches!(
            config_from(&[("HSV_VALUES", "200,0,0,0,0,0")]),
            Err(ConfigError::Invalid("HSV_VALUES"))
        ));
        assert!(matches!(
            config_from(&[("STORE_URL", "ftp://nope")]),
            Err(ConfigError::InvalidUrl("STORE_URL"))
        ));
    }
}
