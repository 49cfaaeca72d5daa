//! Application orchestration for the AgniIO daemon
//!
//! Wires the rig, the operator link, and the controllers together, and runs
//! the cooperative scheduler: one thread, one tick at a time. Each tick
//! drains at most one operator command, polls telemetry, and advances the
//! autonomous behavior one step. Nothing preempts anything; the only
//! cross-thread state is the shutdown flag set by the signal handler.

use crate::control::command::CommandProcessor;
use crate::control::mode::ModeController;
use crate::control::motion::MotionController;
use crate::control::params::TICK_MS;
use crate::control::scan;
use crate::control::telemetry::TelemetryReporter;
use crate::core::clock::Clock;
use crate::core::rig::RoverRig;
use crate::error::Result;
use crate::transport::CommandLink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Main application structure that owns all components
pub struct App<C: Clock> {
    rig: Box<dyn RoverRig>,
    link: CommandLink,
    clock: C,
    modes: ModeController,
    commands: CommandProcessor,
    telemetry: TelemetryReporter,
    shutdown: Arc<AtomicBool>,
}

impl<C: Clock> App<C> {
    pub fn new(
        rig: Box<dyn RoverRig>,
        link: CommandLink,
        clock: C,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            rig,
            link,
            clock,
            modes: ModeController::new(),
            commands: CommandProcessor::new(),
            telemetry: TelemetryReporter::new(),
            shutdown,
        }
    }

    /// Announce readiness and the command alphabet on the operator link.
    pub fn announce(&mut self) -> Result<()> {
        self.link.send_line("Agni rover ready")?;
        self.link
            .send_line("Commands: A=auto G=gesture N=normal F/B/L/R/S=drive P=pump D=distance")
    }

    /// Run one scheduler tick.
    pub fn tick(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        self.commands
            .poll(now, &mut self.link, &mut self.modes, self.rig.as_mut())?;
        self.telemetry
            .poll(now, self.rig.as_mut(), &mut self.link)?;
        self.modes.step(now, self.rig.as_mut(), &mut self.link)
    }

    /// Run the scheduler until the shutdown flag is raised.
    ///
    /// A failing tick is logged and the loop keeps going: sensor and link
    /// faults degrade, they do not halt the rover.
    pub fn run(&mut self) -> Result<()> {
        self.announce()?;
        log::info!("Control loop running ({} ms tick)", TICK_MS);

        while !self.shutdown.load(Ordering::Relaxed) {
            if let Err(e) = self.tick() {
                log::warn!("Tick failed: {}", e);
            }
            thread::sleep(Duration::from_millis(TICK_MS));
        }

        log::info!("Shutdown signal received, parking the rover");
        self.park();
        Ok(())
    }

    /// Leave the hardware in its idle posture on the way out.
    fn park(&mut self) {
        let motion = MotionController::new();
        if let Err(e) = motion.stop(self.rig.as_mut()) {
            log::error!("Failed to stop motors: {}", e);
        }
        if let Err(e) = self.rig.set_pump(false) {
            log::error!("Failed to release pump: {}", e);
        }
        if let Err(e) = scan::center_both(self.rig.as_mut()) {
            log::error!("Failed to center servos: {}", e);
        }
        if let Err(e) = self.rig.set_indicator(false) {
            log::error!("Failed to clear indicator: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::MockClock;
    use crate::devices::mock::{MockRig, MockRigHandle};
    use crate::transport::MockTransport;

    fn setup() -> (App<MockClock>, MockRigHandle, MockTransport, MockClock) {
        let (rig, handle) = MockRig::new();
        let console = MockTransport::new();
        let link = CommandLink::new(Box::new(console.clone()));
        let clock = MockClock::new();
        let app = App::new(
            Box::new(rig),
            link,
            clock.clone(),
            Arc::new(AtomicBool::new(false)),
        );
        (app, handle, console, clock)
    }

    #[test]
    fn test_announce_names_the_alphabet() {
        let (mut app, _handle, console, _clock) = setup();
        app.announce().unwrap();

        let lines = console.take_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ready"));
        for ch in ["A", "G", "N", "F/B/L/R/S", "P", "D"] {
            assert!(lines[1].contains(ch), "missing {} in banner", ch);
        }
    }

    #[test]
    fn test_tick_runs_all_stages() {
        let (mut app, handle, console, clock) = setup();
        handle.set_moisture(300);

        console.inject_read(b"G");
        app.tick().unwrap();
        assert_eq!(console.take_lines(), vec!["Mode: G"]);

        clock.set(5000);
        app.tick().unwrap();
        assert_eq!(console.take_lines(), vec!["Soil:300"]);
    }
}
