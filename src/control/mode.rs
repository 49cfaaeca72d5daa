//! Mode state machine and the autonomous flame-seek-and-suppress behavior.
//!
//! Auto mode runs as an explicit phase machine advanced once per scheduler
//! tick. Each phase carries its own deadline, so nothing here sleeps: the
//! command processor and telemetry keep running every tick, and a mode
//! change received mid-engagement takes effect immediately with the full
//! exit side effects.
//!
//! Phase sequence when a flame is sighted:
//!
//! ```text
//! Sweep --flame--> Alert (blink) --> Aim (settle) --> Engage (spray loop)
//!   ^                                                    |
//!   +------------------ Cooldown <-----flame out---------+
//! ```

use crate::control::motion::MotionController;
use crate::control::params::{
    AIM_SETTLE_MS, ALERT_BLINKS, ALERT_TOGGLE_MS, APPROACH_CM, COOLDOWN_MS, ENGAGE_CYCLE_MS,
    REAIM_MAX_CM, REAIM_MIN_CM, RETREAT_CM, RETREAT_DRIVE_MS, SWEEP_PERIOD_MS,
};
use crate::control::range;
use crate::control::scan::{self, ScanState};
use crate::core::rig::RoverRig;
use crate::core::types::Mode;
use crate::error::Result;
use crate::transport::CommandLink;

/// Autonomous behavior phase, each advanced against its own deadline.
#[derive(Debug, Clone, Copy)]
enum AutoPhase {
    /// Sweeping the sensor arc, watching for flame.
    Sweep { next_step_at: u64 },
    /// Blinking the indicator after a sighting; runs to completion.
    Alert {
        toggles_left: u8,
        next_toggle_at: u64,
        lit: bool,
    },
    /// Nozzle aimed, waiting out mechanical settling.
    Aim { settle_until: u64 },
    /// Spray loop: range, close in or back off, pump running.
    Engage {
        next_cycle_at: u64,
        /// Set while the fixed reverse leg is running.
        reversing_until: Option<u64>,
    },
    /// Flame is out; pause before the sweep resumes.
    Cooldown { until: u64 },
}

/// Top-level mode state machine.
///
/// Owns the sweep state and the autonomous phase; mode transitions are the
/// only writer of the rig's idle posture.
pub struct ModeController {
    mode: Mode,
    scan: ScanState,
    phase: AutoPhase,
    motion: MotionController,
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            scan: ScanState::centered(),
            phase: AutoPhase::Sweep { next_step_at: 0 },
            motion: MotionController::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current sweep angle (degrees).
    pub fn scan_position(&self) -> u8 {
        self.scan.position()
    }

    /// Switch mode and acknowledge on the link.
    ///
    /// Leaving Auto always parks the rig: servos centered, motors stopped,
    /// pump and indicator off, whatever phase was running.
    pub fn set_mode(
        &mut self,
        mode: Mode,
        now: u64,
        rig: &mut dyn RoverRig,
        link: &mut CommandLink,
    ) -> Result<()> {
        let was_auto = self.mode == Mode::Auto;
        self.mode = mode;

        if was_auto && mode != Mode::Auto {
            self.park(rig)?;
        }
        // Reselecting Auto mid-run keeps the current phase; only a fresh
        // entry starts a new sweep.
        if mode == Mode::Auto && !was_auto {
            self.phase = AutoPhase::Sweep { next_step_at: now };
        }

        log::info!("ModeController: mode set to {}", mode.code());
        link.send_line(&format!("Mode: {}", mode.code()))
    }

    /// Park the rig in its idle posture and reset the autonomous state.
    fn park(&mut self, rig: &mut dyn RoverRig) -> Result<()> {
        self.scan.reset();
        self.phase = AutoPhase::Sweep { next_step_at: 0 };
        scan::center_both(rig)?;
        self.motion.stop(rig)?;
        rig.set_pump(false)?;
        rig.set_indicator(false)?;
        Ok(())
    }

    /// Run one step of autonomous behavior. No-op outside Auto mode.
    pub fn step(&mut self, now: u64, rig: &mut dyn RoverRig, link: &mut CommandLink) -> Result<()> {
        if self.mode != Mode::Auto {
            return Ok(());
        }

        match self.phase {
            AutoPhase::Sweep { next_step_at } => {
                if now >= next_step_at {
                    self.sweep_step(now, rig)?;
                }
            }
            AutoPhase::Alert {
                toggles_left,
                next_toggle_at,
                lit,
            } => {
                if now >= next_toggle_at {
                    self.alert_step(toggles_left, lit, now, rig)?;
                }
            }
            AutoPhase::Aim { settle_until } => {
                if now >= settle_until {
                    self.phase = AutoPhase::Engage {
                        next_cycle_at: now,
                        reversing_until: None,
                    };
                }
            }
            AutoPhase::Engage {
                next_cycle_at,
                reversing_until,
            } => {
                self.engage_step(next_cycle_at, reversing_until, now, rig, link)?;
            }
            AutoPhase::Cooldown { until } => {
                if now >= until {
                    log::debug!("ModeController: cooldown over, sweep resumes");
                    self.phase = AutoPhase::Sweep { next_step_at: now };
                }
            }
        }
        Ok(())
    }

    /// One sweep increment: move the sensor, look for flame.
    fn sweep_step(&mut self, now: u64, rig: &mut dyn RoverRig) -> Result<()> {
        let angle = self.scan.advance();
        rig.set_scan_angle(angle)?;

        if rig.flame_detected()? {
            log::info!("ModeController: flame sighted at {} deg", angle);
            self.phase = AutoPhase::Alert {
                toggles_left: ALERT_BLINKS * 2,
                next_toggle_at: now,
                lit: false,
            };
        } else {
            self.phase = AutoPhase::Sweep {
                next_step_at: now + SWEEP_PERIOD_MS,
            };
        }
        Ok(())
    }

    /// One indicator toggle; after the last one, aim the nozzle.
    fn alert_step(
        &mut self,
        toggles_left: u8,
        lit: bool,
        now: u64,
        rig: &mut dyn RoverRig,
    ) -> Result<()> {
        if toggles_left == 0 {
            let angle = self.scan.position();
            rig.set_nozzle_angle(angle)?;
            log::info!("ModeController: nozzle aimed at {} deg", angle);
            self.phase = AutoPhase::Aim {
                settle_until: now + AIM_SETTLE_MS,
            };
        } else {
            rig.set_indicator(!lit)?;
            self.phase = AutoPhase::Alert {
                toggles_left: toggles_left - 1,
                next_toggle_at: now + ALERT_TOGGLE_MS,
                lit: !lit,
            };
        }
        Ok(())
    }

    /// One engagement cycle, or progress on the reverse leg.
    fn engage_step(
        &mut self,
        next_cycle_at: u64,
        reversing_until: Option<u64>,
        now: u64,
        rig: &mut dyn RoverRig,
        link: &mut CommandLink,
    ) -> Result<()> {
        // Finish the fixed reverse leg before anything else; the pump keeps
        // running through it.
        if let Some(until) = reversing_until {
            if now >= until {
                self.motion.stop(rig)?;
                self.phase = AutoPhase::Engage {
                    next_cycle_at: now + ENGAGE_CYCLE_MS,
                    reversing_until: None,
                };
            }
            return Ok(());
        }

        if now < next_cycle_at {
            return Ok(());
        }

        // Cycle boundary: the flame state decides whether we keep going.
        if !rig.flame_detected()? {
            return self.disengage(now, rig);
        }

        let distance = range::distance_cm(rig)?;
        link.send_line(&format!("Dist:{}", distance))?;

        let mut reversing = None;
        if distance > APPROACH_CM {
            self.motion.forward(rig)?;
        } else if distance < RETREAT_CM {
            self.motion.backward(rig)?;
            reversing = Some(now + RETREAT_DRIVE_MS);
        } else {
            // Suppression range: hold position.
            self.motion.stop(rig)?;
        }

        rig.set_pump(true)?;

        // A transient dropout mid-cycle means the target drifted out of the
        // beam, not that it is out: chase it instead of disengaging.
        if (REAIM_MIN_CM..=REAIM_MAX_CM).contains(&distance) && !rig.flame_detected()? {
            let angle = self.scan.nudge_against_sweep();
            rig.set_scan_angle(angle)?;
            rig.set_nozzle_angle(angle)?;
            log::debug!("ModeController: target drifting, re-aimed to {} deg", angle);
        }

        self.phase = AutoPhase::Engage {
            next_cycle_at: now + ENGAGE_CYCLE_MS,
            reversing_until: reversing,
        };
        Ok(())
    }

    /// Flame is out: stop spraying, hold off, then go back to sweeping.
    fn disengage(&mut self, now: u64, rig: &mut dyn RoverRig) -> Result<()> {
        log::info!("ModeController: flame out, disengaging");
        rig.set_pump(false)?;
        self.motion.stop(rig)?;
        self.phase = AutoPhase::Cooldown {
            until: now + COOLDOWN_MS,
        };
        Ok(())
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::params::{DRIVE_DUTY, SCAN_CENTER_DEG};
    use crate::core::rig::WheelDirection;
    use crate::devices::mock::{MockRig, MockRigHandle};
    use crate::transport::MockTransport;

    fn setup() -> (ModeController, MockRig, MockRigHandle, CommandLink, MockTransport) {
        let (rig, handle) = MockRig::new();
        let console = MockTransport::new();
        let link = CommandLink::new(Box::new(console.clone()));
        (ModeController::new(), rig, handle, link, console)
    }

    /// Drive the controller tick by tick from `start` to `end` (exclusive).
    fn run_until(
        ctl: &mut ModeController,
        rig: &mut MockRig,
        link: &mut CommandLink,
        start: u64,
        end: u64,
    ) -> u64 {
        let mut now = start;
        while now < end {
            ctl.step(now, rig, link).unwrap();
            now += 10;
        }
        now
    }

    #[test]
    fn test_mode_change_is_acknowledged() {
        let (mut ctl, mut rig, _handle, mut link, console) = setup();

        ctl.set_mode(Mode::Auto, 0, &mut rig, &mut link).unwrap();
        ctl.set_mode(Mode::Gesture, 10, &mut rig, &mut link).unwrap();
        assert_eq!(console.take_lines(), vec!["Mode: A", "Mode: G"]);
    }

    #[test]
    fn test_leaving_auto_parks_the_rig() {
        let (mut ctl, mut rig, handle, mut link, _console) = setup();

        ctl.set_mode(Mode::Auto, 0, &mut rig, &mut link).unwrap();
        handle.set_flame(true);
        handle.set_target_distance_cm(50);

        // Deep into an engagement: sweeping, alert, aim, several spray cycles
        run_until(&mut ctl, &mut rig, &mut link, 0, 4000);
        assert!(handle.pump_on());

        ctl.set_mode(Mode::Normal, 4000, &mut rig, &mut link).unwrap();
        assert_eq!(handle.scan_angle(), SCAN_CENTER_DEG);
        assert_eq!(handle.nozzle_angle(), SCAN_CENTER_DEG);
        assert!(handle.drive_idle());
        assert!(!handle.pump_on());
        assert!(!handle.indicator_on());
        assert_eq!(ctl.scan_position(), SCAN_CENTER_DEG);
    }

    #[test]
    fn test_sweep_does_nothing_outside_auto() {
        let (mut ctl, mut rig, handle, mut link, _console) = setup();

        run_until(&mut ctl, &mut rig, &mut link, 0, 1000);
        assert_eq!(handle.scan_angle(), SCAN_CENTER_DEG);
        assert!(handle.take_wheel_log().is_empty());
    }

    #[test]
    fn test_sweep_advances_at_its_cadence() {
        let (mut ctl, mut rig, handle, mut link, _console) = setup();

        ctl.set_mode(Mode::Auto, 0, &mut rig, &mut link).unwrap();
        run_until(&mut ctl, &mut rig, &mut link, 0, 200);

        // Steps at t=0,50,100,150: 100, 110, 120, 130 degrees
        assert_eq!(handle.scan_angle(), 130);
    }

    #[test]
    fn test_alert_blinks_then_aims() {
        let (mut ctl, mut rig, handle, mut link, _console) = setup();

        ctl.set_mode(Mode::Auto, 0, &mut rig, &mut link).unwrap();
        handle.set_flame(true);
        handle.set_target_distance_cm(25);

        // First sweep step at t=0 sights the flame (scan at 100 deg)
        ctl.step(0, &mut rig, &mut link).unwrap();
        ctl.step(0, &mut rig, &mut link).unwrap();
        assert!(handle.indicator_on());

        // Blink runs 5 on/off cycles at 200 ms per edge
        run_until(&mut ctl, &mut rig, &mut link, 10, 2010);
        assert!(!handle.indicator_on());
        assert_eq!(handle.nozzle_angle(), 100);

        // No spraying before the nozzle settles
        assert!(!handle.pump_on());
        run_until(&mut ctl, &mut rig, &mut link, 2010, 2600);
        assert!(handle.pump_on());
    }

    #[test]
    fn test_engage_action_sequence_tracks_distance() {
        let (mut ctl, mut rig, handle, mut link, _console) = setup();

        ctl.set_mode(Mode::Auto, 0, &mut rig, &mut link).unwrap();
        handle.set_flame(true);
        handle.set_target_distance_cm(40);

        // Sight -> alert (2000 ms) -> settle (500 ms) -> first cycle
        let mut now = run_until(&mut ctl, &mut rig, &mut link, 0, 2600);
        handle.take_wheel_log();

        // Two cycles at 40 cm: closing in
        now = run_until(&mut ctl, &mut rig, &mut link, now, now + 200);
        // Next cycle at 10 cm: back off for 500 ms, then stop
        handle.set_target_distance_cm(10);
        now = run_until(&mut ctl, &mut rig, &mut link, now, now + 600);
        // Next cycle at 20 cm: suppression range, hold
        handle.set_target_distance_cm(20);
        run_until(&mut ctl, &mut rig, &mut link, now, now + 200);

        let log = handle.take_wheel_log();
        let directions: Vec<WheelDirection> = log.iter().map(|(left, _)| left.direction).collect();
        assert_eq!(
            directions,
            vec![
                WheelDirection::Forward,
                WheelDirection::Forward,
                WheelDirection::Reverse,
                WheelDirection::Idle,
                WheelDirection::Idle,
            ]
        );
        assert!(handle.pump_on());

        // Both the approach and the retreat run at the fixed duty
        assert_eq!(log[0].0.duty, DRIVE_DUTY);
        assert_eq!(log[2].0.duty, DRIVE_DUTY);
    }

    #[test]
    fn test_transient_dropout_nudges_aim_instead_of_disengaging() {
        let (mut ctl, mut rig, handle, mut link, _console) = setup();

        ctl.set_mode(Mode::Auto, 0, &mut rig, &mut link).unwrap();
        handle.set_flame(true);
        handle.set_target_distance_cm(25);
        let now = run_until(&mut ctl, &mut rig, &mut link, 0, 2700);
        assert!(handle.pump_on());
        let aimed = handle.nozzle_angle();
        assert_eq!(aimed, 100); // sighted on the first sweep step, going up

        // One cycle where the boundary read sees the flame but the mid-cycle
        // read does not: the target drifted out of the beam
        handle.queue_flame_reads(&[true, false]);
        run_until(&mut ctl, &mut rig, &mut link, now, now + 100);

        // Still engaged, aim shifted 5 deg against the sweep direction
        assert!(handle.pump_on());
        assert_eq!(handle.nozzle_angle(), aimed - 5);
        assert_eq!(handle.scan_angle(), aimed - 5);

        // Steady flame keeps the engagement going at the corrected angle
        run_until(&mut ctl, &mut rig, &mut link, now + 100, now + 300);
        assert!(handle.pump_on());
    }

    #[test]
    fn test_disengage_latency_within_one_cycle() {
        let (mut ctl, mut rig, handle, mut link, _console) = setup();

        ctl.set_mode(Mode::Auto, 0, &mut rig, &mut link).unwrap();
        handle.set_flame(true);
        handle.set_target_distance_cm(50);
        let now = run_until(&mut ctl, &mut rig, &mut link, 0, 3000);

        // Pursuing: wheels forward, pump on
        let (left, _) = handle.wheels();
        assert_eq!(left.direction, WheelDirection::Forward);
        assert!(handle.pump_on());

        handle.set_flame(false);
        run_until(&mut ctl, &mut rig, &mut link, now, now + 150);
        assert!(!handle.pump_on());
        assert!(handle.drive_idle());
    }

    #[test]
    fn test_cooldown_then_sweep_resumes() {
        let (mut ctl, mut rig, handle, mut link, _console) = setup();

        ctl.set_mode(Mode::Auto, 0, &mut rig, &mut link).unwrap();
        handle.set_flame(true);
        handle.set_target_distance_cm(50);
        let now = run_until(&mut ctl, &mut rig, &mut link, 0, 3000);

        handle.set_flame(false);
        let now = run_until(&mut ctl, &mut rig, &mut link, now, now + 200);
        let parked_angle = handle.scan_angle();

        // Cooldown holds the scan still
        let now = run_until(&mut ctl, &mut rig, &mut link, now, now + 700);
        assert_eq!(handle.scan_angle(), parked_angle);

        // Then the sweep picks up from where it stopped
        run_until(&mut ctl, &mut rig, &mut link, now, now + 200);
        assert_ne!(handle.scan_angle(), parked_angle);
    }
}
