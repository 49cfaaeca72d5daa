//! Differential drive control.
//!
//! Commands are fire-and-forget: callers cannot tell "moved" from "refused".
//! The only interlock lives in `forward`, which ranges first and holds the
//! rover still when something is closer than the obstacle threshold.

use crate::control::params::{DRIVE_DUTY, OBSTACLE_STOP_CM};
use crate::control::range;
use crate::core::rig::{RoverRig, WheelCommand};
use crate::error::Result;

/// Drive-train command front end.
#[derive(Debug, Default)]
pub struct MotionController;

impl MotionController {
    pub fn new() -> Self {
        Self
    }

    /// Drive straight ahead, unless an obstacle sits inside the stop range.
    pub fn forward(&self, rig: &mut dyn RoverRig) -> Result<()> {
        let distance = range::distance_cm(rig)?;
        if distance < OBSTACLE_STOP_CM {
            log::debug!(
                "MotionController: obstacle at {} cm, holding position",
                distance
            );
            return self.stop(rig);
        }
        rig.set_wheels(
            WheelCommand::forward(DRIVE_DUTY),
            WheelCommand::forward(DRIVE_DUTY),
        )
    }

    pub fn backward(&self, rig: &mut dyn RoverRig) -> Result<()> {
        rig.set_wheels(
            WheelCommand::reverse(DRIVE_DUTY),
            WheelCommand::reverse(DRIVE_DUTY),
        )
    }

    /// Pivot in place, left side reversing.
    pub fn turn_left(&self, rig: &mut dyn RoverRig) -> Result<()> {
        rig.set_wheels(
            WheelCommand::reverse(DRIVE_DUTY),
            WheelCommand::forward(DRIVE_DUTY),
        )
    }

    /// Pivot in place, right side reversing.
    pub fn turn_right(&self, rig: &mut dyn RoverRig) -> Result<()> {
        rig.set_wheels(
            WheelCommand::forward(DRIVE_DUTY),
            WheelCommand::reverse(DRIVE_DUTY),
        )
    }

    /// Duty to zero, direction pins low on both sides.
    pub fn stop(&self, rig: &mut dyn RoverRig) -> Result<()> {
        rig.set_wheels(WheelCommand::idle(), WheelCommand::idle())
    }
}
