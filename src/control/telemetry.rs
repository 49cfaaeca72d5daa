//! Soil-moisture telemetry.
//!
//! Samples the probe once per window and reports it on the operator link,
//! independent of the operating mode.

use crate::control::params::SOIL_PERIOD_MS;
use crate::core::rig::RoverRig;
use crate::error::Result;
use crate::transport::CommandLink;

/// Periodic soil-moisture reporter.
#[derive(Debug, Default)]
pub struct TelemetryReporter {
    last_sample_ms: u64,
}

impl TelemetryReporter {
    pub fn new() -> Self {
        Self { last_sample_ms: 0 }
    }

    /// Emit a report when the window has elapsed; otherwise do nothing.
    pub fn poll(&mut self, now: u64, rig: &mut dyn RoverRig, link: &mut CommandLink) -> Result<()> {
        if now.saturating_sub(self.last_sample_ms) < SOIL_PERIOD_MS {
            return Ok(());
        }
        let raw = rig.read_moisture()?;
        link.send_line(&format!("Soil:{}", raw))?;
        self.last_sample_ms = now;
        Ok(())
    }
}
