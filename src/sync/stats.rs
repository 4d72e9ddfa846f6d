//! Bookkeeping for background store pushes

/// Outcome of one background push
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    /// State snapshot accepted; payload size in bytes
    StateAccepted { bytes: usize },
    StateFailed { error: String },
    CalibrationAccepted,
    CalibrationFailed { error: String },
}

/// Running totals, reported at shutdown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    pub states_sent: u64,
    pub states_accepted: u64,
    pub states_failed: u64,
    pub calibrations_sent: u64,
    pub calibrations_failed: u64,
    pub avg_payload_bytes: f32,
}

impl SyncStats {
    pub fn record(&mut self, report: &SyncReport) {
        match report {
            SyncReport::StateAccepted { bytes } => {
                self.states_accepted += 1;

                // Running average
                let n = self.states_accepted as f32;
                self.avg_payload_bytes =
                    self.avg_payload_bytes * ((n - 1.0) / n) + (*bytes as f32 / n);
            }
            SyncReport::StateFailed { .. } => self.states_failed += 1,
            SyncReport::CalibrationAccepted => {}
            SyncReport::CalibrationFailed { .. } => self.calibrations_failed += 1,
        }
    }

    /// Pushes launched but not yet reported back
    pub fn in_flight(&self) -> u64 {
        self.states_sent
            .saturating_sub(self.states_accepted + self.states_failed)
    }
}
