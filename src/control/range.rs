//! Ultrasonic distance reading.

use crate::control::params::{OUT_OF_RANGE_CM, SOUND_CM_PER_US};
use crate::core::rig::RoverRig;
use crate::error::Result;

/// Run one ranging cycle and convert the echo to centimeters.
///
/// A missing echo is not a fault: it reads as [`OUT_OF_RANGE_CM`], meaning
/// nothing in front of the rover. The rig bounds the measurement itself, so
/// this call always returns within the echo timeout.
pub fn distance_cm(rig: &mut dyn RoverRig) -> Result<u16> {
    match rig.measure_echo()? {
        Some(echo) => {
            let cm = echo.as_micros() as f64 * SOUND_CM_PER_US / 2.0;
            Ok(cm.round() as u16)
        }
        None => Ok(OUT_OF_RANGE_CM),
    }
}
