//! Operator command dispatch.
//!
//! One pending byte is consumed per scheduler tick. Mode selects are honored
//! in any state; drive and pump characters only act in the manual modes; the
//! distance request only in Auto. Everything else is dropped without a reply.

use crate::control::mode::ModeController;
use crate::control::motion::MotionController;
use crate::control::range;
use crate::core::rig::RoverRig;
use crate::core::types::{Command, DriveCommand, Mode};
use crate::error::Result;
use crate::transport::CommandLink;

/// Decodes operator bytes and routes them to the controllers.
#[derive(Debug, Default)]
pub struct CommandProcessor {
    motion: MotionController,
}

impl CommandProcessor {
    pub fn new() -> Self {
        Self {
            motion: MotionController::new(),
        }
    }

    /// Consume at most one pending command byte.
    pub fn poll(
        &mut self,
        now: u64,
        link: &mut CommandLink,
        modes: &mut ModeController,
        rig: &mut dyn RoverRig,
    ) -> Result<()> {
        let byte = match link.poll_byte()? {
            Some(byte) => byte,
            None => return Ok(()),
        };

        let command = match Command::parse(byte) {
            Some(command) => command,
            None => {
                log::trace!("CommandProcessor: dropping byte {:#04x}", byte);
                return Ok(());
            }
        };

        match command {
            Command::SetMode(mode) => modes.set_mode(mode, now, rig, link),
            Command::Drive(drive) if modes.mode().is_manual() => self.drive(drive, rig),
            Command::PumpOn if modes.mode().is_manual() => rig.set_pump(true),
            Command::DistanceRequest if modes.mode() == Mode::Auto => {
                let distance = range::distance_cm(rig)?;
                link.send_line(&format!("Dist:{}", distance))
            }
            // Valid character, wrong mode: dropped like an unknown one
            _ => Ok(()),
        }
    }

    fn drive(&mut self, drive: DriveCommand, rig: &mut dyn RoverRig) -> Result<()> {
        match drive {
            DriveCommand::Forward => self.motion.forward(rig),
            DriveCommand::Backward => self.motion.backward(rig),
            DriveCommand::TurnLeft => self.motion.turn_left(rig),
            DriveCommand::TurnRight => self.motion.turn_right(rig),
            DriveCommand::Stop => {
                // The console sends S on key release, pump key included
                self.motion.stop(rig)?;
                rig.set_pump(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rig::WheelDirection;
    use crate::devices::mock::{MockRig, MockRigHandle};
    use crate::transport::MockTransport;

    fn setup() -> (
        CommandProcessor,
        ModeController,
        MockRig,
        MockRigHandle,
        CommandLink,
        MockTransport,
    ) {
        let (rig, handle) = MockRig::new();
        let console = MockTransport::new();
        let link = CommandLink::new(Box::new(console.clone()));
        (
            CommandProcessor::new(),
            ModeController::new(),
            rig,
            handle,
            link,
            console,
        )
    }

    #[test]
    fn test_drive_characters_act_in_normal_mode() {
        let (mut cp, mut modes, mut rig, handle, mut link, console) = setup();
        handle.set_target_distance_cm(100);

        console.inject_read(b"F");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        let (left, _) = handle.wheels();
        assert_eq!(left.direction, WheelDirection::Forward);

        console.inject_read(b"S");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        assert!(handle.drive_idle());
    }

    #[test]
    fn test_stop_releases_the_pump() {
        let (mut cp, mut modes, mut rig, handle, mut link, console) = setup();

        console.inject_read(b"P");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        assert!(handle.pump_on());

        console.inject_read(b"S");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        assert!(!handle.pump_on());
    }

    #[test]
    fn test_drive_characters_ignored_in_auto() {
        let (mut cp, mut modes, mut rig, handle, mut link, console) = setup();

        console.inject_read(b"A");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        console.take_lines();
        handle.take_wheel_log();

        console.inject_read(b"FP");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        assert!(handle.take_wheel_log().is_empty());
        assert!(!handle.pump_on());
    }

    #[test]
    fn test_distance_request_only_in_auto() {
        let (mut cp, mut modes, mut rig, handle, mut link, console) = setup();
        handle.set_target_distance_cm(77);

        console.inject_read(b"D");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        assert!(console.take_lines().is_empty());

        console.inject_read(b"A");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        console.take_lines();

        console.inject_read(b"D");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        assert_eq!(console.take_lines(), vec!["Dist:77"]);
    }

    #[test]
    fn test_unknown_bytes_are_silently_dropped() {
        let (mut cp, mut modes, mut rig, handle, mut link, console) = setup();

        console.inject_read(b"zq\r\n");
        for _ in 0..4 {
            cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        }
        assert!(console.take_lines().is_empty());
        assert!(handle.take_wheel_log().is_empty());
    }

    #[test]
    fn test_one_byte_per_poll() {
        let (mut cp, mut modes, mut rig, _handle, mut link, console) = setup();

        console.inject_read(b"NG");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        assert_eq!(modes.mode(), Mode::Normal);
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        assert_eq!(modes.mode(), Mode::Gesture);
    }

    #[test]
    fn test_mode_select_works_mid_engagement() {
        let (mut cp, mut modes, mut rig, handle, mut link, console) = setup();

        console.inject_read(b"A");
        cp.poll(0, &mut link, &mut modes, &mut rig).unwrap();
        handle.set_flame(true);
        handle.set_target_distance_cm(50);

        let mut now = 0;
        while now < 3000 {
            modes.step(now, &mut rig, &mut link).unwrap();
            now += 10;
        }
        assert!(handle.pump_on());

        console.inject_read(b"N");
        cp.poll(now, &mut link, &mut modes, &mut rig).unwrap();
        assert_eq!(modes.mode(), Mode::Normal);
        assert!(!handle.pump_on());
        assert!(handle.drive_idle());
        assert!(console.take_lines().contains(&"Mode: N".to_string()));
    }
}
