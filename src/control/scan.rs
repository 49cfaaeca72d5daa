//! Sweep state for the scanning servo.
//!
//! The flame sensor rides the scan servo across a 0-180 degree arc in fixed
//! steps, reversing at each end: a continuous triangle-wave "radar" pattern.
//! The position here is the single source of truth for where the rover is
//! looking; the nozzle servo is aimed from it when a flame is engaged.

use crate::control::params::{
    REAIM_NUDGE_DEG, SCAN_CENTER_DEG, SCAN_MAX_DEG, SCAN_MIN_DEG, SWEEP_STEP_DEG,
};
use crate::core::rig::RoverRig;
use crate::error::Result;

/// Current sweep angle and travel direction.
#[derive(Debug, Clone, Copy)]
pub struct ScanState {
    position: i16,
    direction: i16,
}

impl ScanState {
    /// Start at rest position, sweeping toward higher angles.
    pub fn centered() -> Self {
        Self {
            position: SCAN_CENTER_DEG as i16,
            direction: SWEEP_STEP_DEG,
        }
    }

    /// Current angle in degrees.
    pub fn position(&self) -> u8 {
        self.position as u8
    }

    /// True while the sweep travels toward higher angles.
    pub fn sweeping_up(&self) -> bool {
        self.direction > 0
    }

    /// Take one sweep step, reversing and clamping at the travel limits.
    /// Returns the new angle.
    pub fn advance(&mut self) -> u8 {
        self.position += self.direction;
        if self.position >= SCAN_MAX_DEG {
            self.position = SCAN_MAX_DEG;
            self.direction = -SWEEP_STEP_DEG;
        } else if self.position <= SCAN_MIN_DEG {
            self.position = SCAN_MIN_DEG;
            self.direction = SWEEP_STEP_DEG;
        }
        self.position as u8
    }

    /// Shift the aim a few degrees against the sweep direction, clamped to
    /// the travel limits. Used to chase a target drifting out of the beam.
    /// Returns the new angle.
    pub fn nudge_against_sweep(&mut self) -> u8 {
        let delta = if self.direction > 0 {
            -REAIM_NUDGE_DEG
        } else {
            REAIM_NUDGE_DEG
        };
        self.position = (self.position + delta).clamp(SCAN_MIN_DEG, SCAN_MAX_DEG);
        self.position as u8
    }

    /// Back to the rest position, sweeping up.
    pub fn reset(&mut self) {
        *self = Self::centered();
    }
}

impl Default for ScanState {
    fn default() -> Self {
        Self::centered()
    }
}

/// Park both servos at the rest position.
pub fn center_both(rig: &mut dyn RoverRig) -> Result<()> {
    rig.set_scan_angle(SCAN_CENTER_DEG)?;
    rig.set_nozzle_angle(SCAN_CENTER_DEG)?;
    Ok(())
}
