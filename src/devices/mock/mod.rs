//! Mock bench rig for hardware-free testing
//!
//! Simulates the rover's capability surface with scriptable sensor state:
//! tests (and `type = "mock"` runs) set the flame signal, the ranging target,
//! and the moisture reading through a shared handle, and inspect every
//! actuator write the control layer makes.
//!
//! The ranging target is stored as an echo duration, not a distance, so the
//! echo-to-centimeters conversion path is exercised end to end.

use crate::control::params::SOUND_CM_PER_US;
use crate::core::rig::{RoverRig, WheelCommand};
use crate::error::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
struct RigState {
    wheels: (WheelCommand, WheelCommand),
    scan_angle: u8,
    nozzle_angle: u8,
    pump_on: bool,
    indicator_on: bool,
    flame_present: bool,
    flame_queue: VecDeque<bool>,
    echo: Option<Duration>,
    moisture: u16,
    wheel_log: Vec<(WheelCommand, WheelCommand)>,
}

impl RigState {
    fn new() -> Self {
        Self {
            wheels: (WheelCommand::idle(), WheelCommand::idle()),
            scan_angle: 90,
            nozzle_angle: 90,
            pump_on: false,
            indicator_on: false,
            flame_present: false,
            flame_queue: VecDeque::new(),
            echo: None,
            moisture: 0,
            wheel_log: Vec::new(),
        }
    }
}

/// Simulated rover rig.
pub struct MockRig {
    state: Arc<Mutex<RigState>>,
}

/// Test-side handle to script sensors and inspect actuators.
#[derive(Clone)]
pub struct MockRigHandle {
    state: Arc<Mutex<RigState>>,
}

impl MockRig {
    /// Create a rig plus its scripting handle.
    pub fn new() -> (Self, MockRigHandle) {
        let state = Arc::new(Mutex::new(RigState::new()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockRigHandle { state },
        )
    }
}

impl RoverRig for MockRig {
    fn set_wheels(&mut self, left: WheelCommand, right: WheelCommand) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.wheels = (left, right);
        state.wheel_log.push((left, right));
        Ok(())
    }

    fn set_scan_angle(&mut self, angle_deg: u8) -> Result<()> {
        self.state.lock().unwrap().scan_angle = angle_deg;
        Ok(())
    }

    fn set_nozzle_angle(&mut self, angle_deg: u8) -> Result<()> {
        self.state.lock().unwrap().nozzle_angle = angle_deg;
        Ok(())
    }

    fn set_pump(&mut self, on: bool) -> Result<()> {
        self.state.lock().unwrap().pump_on = on;
        Ok(())
    }

    fn set_indicator(&mut self, on: bool) -> Result<()> {
        self.state.lock().unwrap().indicator_on = on;
        Ok(())
    }

    fn measure_echo(&mut self) -> Result<Option<Duration>> {
        Ok(self.state.lock().unwrap().echo)
    }

    fn flame_detected(&mut self) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.flame_queue.pop_front() {
            Some(reading) => Ok(reading),
            None => Ok(state.flame_present),
        }
    }

    fn read_moisture(&mut self) -> Result<u16> {
        Ok(self.state.lock().unwrap().moisture)
    }
}

impl MockRigHandle {
    /// Script the flame signal.
    pub fn set_flame(&self, present: bool) {
        self.state.lock().unwrap().flame_present = present;
    }

    /// Queue one-shot flame readings consumed before the steady value,
    /// for scripting transient dropouts.
    pub fn queue_flame_reads(&self, readings: &[bool]) {
        self.state
            .lock()
            .unwrap()
            .flame_queue
            .extend(readings.iter().copied());
    }

    /// Place a ranging target at the given distance.
    pub fn set_target_distance_cm(&self, cm: u16) {
        let echo_us = (cm as f64 * 2.0 / SOUND_CM_PER_US) as u64;
        self.state.lock().unwrap().echo = Some(Duration::from_micros(echo_us));
    }

    /// Remove the ranging target: no echo comes back.
    pub fn clear_echo(&self) {
        self.state.lock().unwrap().echo = None;
    }

    /// Script the soil-moisture reading.
    pub fn set_moisture(&self, raw: u16) {
        self.state.lock().unwrap().moisture = raw;
    }

    /// Latest drive-train command.
    pub fn wheels(&self) -> (WheelCommand, WheelCommand) {
        self.state.lock().unwrap().wheels
    }

    /// Drain the history of drive-train commands.
    pub fn take_wheel_log(&self) -> Vec<(WheelCommand, WheelCommand)> {
        std::mem::take(&mut self.state.lock().unwrap().wheel_log)
    }

    pub fn scan_angle(&self) -> u8 {
        self.state.lock().unwrap().scan_angle
    }

    pub fn nozzle_angle(&self) -> u8 {
        self.state.lock().unwrap().nozzle_angle
    }

    pub fn pump_on(&self) -> bool {
        self.state.lock().unwrap().pump_on
    }

    pub fn indicator_on(&self) -> bool {
        self.state.lock().unwrap().indicator_on
    }

    /// True when both wheels are idle.
    pub fn drive_idle(&self) -> bool {
        let (left, right) = self.wheels();
        left.is_idle() && right.is_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_script_round_trips_through_echo() {
        let (mut rig, handle) = MockRig::new();
        handle.set_target_distance_cm(100);

        let echo = rig.measure_echo().unwrap().unwrap();
        let cm = echo.as_micros() as f64 * SOUND_CM_PER_US / 2.0;
        assert_eq!(cm.round() as u16, 100);
    }

    #[test]
    fn test_wheel_log_records_every_command() {
        let (mut rig, handle) = MockRig::new();
        rig.set_wheels(WheelCommand::forward(150), WheelCommand::forward(150))
            .unwrap();
        rig.set_wheels(WheelCommand::idle(), WheelCommand::idle())
            .unwrap();

        let log = handle.take_wheel_log();
        assert_eq!(log.len(), 2);
        assert!(handle.take_wheel_log().is_empty());
    }
}
