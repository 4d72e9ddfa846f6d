//! Line-based calibration console on stdin
//!
//! Accepted commands:
//! - `hsv <lh> <ls> <lv> <uh> <us> <uv>` replaces every threshold
//! - `set <index> <value>` moves one slider (0..6, wire order)

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{CalibrationError, CalibrationUpdate, HsvCalibration};

/// Parse one console line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<CalibrationUpdate>, CalibrationError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match command {
        "hsv" => {
            let hsv: HsvCalibration = rest.parse()?;
            Ok(Some(CalibrationUpdate::Replace(hsv)))
        }
        "set" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            let [index, value] = args.as_slice() else {
                return Err(CalibrationError::WrongLength(args.len()));
            };
            let index: usize = index
                .parse()
                .map_err(|_| CalibrationError::NotANumber(index.to_string()))?;
            let value: i64 = value
                .parse()
                .map_err(|_| CalibrationError::NotANumber(value.to_string()))?;
            if index >= 6 {
                return Err(CalibrationError::UnknownChannel(index));
            }
            Ok(Some(CalibrationUpdate::Channel { index, value }))
        }
        other => Err(CalibrationError::UnknownCommand(other.to_string())),
    }
}

/// Read calibration commands from stdin until EOF or the receiver is dropped
pub async fn run_stdin_console(updates: mpsc::UnboundedSender<CalibrationUpdate>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Calibration console ready (`hsv h s v h s v` or `set <index> <value>`)");

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line) {
                Ok(Some(update)) => {
                    debug!(?update, "Calibration command");
                    if updates.send(update).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, line = %line, "Rejected calibration command"),
            },
            Ok(None) => {
                debug!("Calibration console closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read calibration console");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_replacement() {
        let update = parse_command("hsv 0 0 195 179 255 255").unwrap();
        let expected = HsvCalibration::new([0, 0, 195, 179, 255, 255]).unwrap();
        assert_eq!(update, Some(CalibrationUpdate::Replace(expected)));
    }

    #[test]
    fn parses_single_channel() {
        assert_eq!(
            parse_command("  set 4 120 ").unwrap(),
            Some(CalibrationUpdate::Channel { index: 4, value: 120 })
        );
        assert_eq!(parse_command("").unwrap(), None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_command("set 9 1").is_err());
        assert!(parse_command("set 1").is_err());
        assert!(parse_command("hsv 1 2").is_err());
        assert!(parse_command("jump").is_err());
    }
}
