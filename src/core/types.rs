//! Operating modes and the operator command alphabet.

/// Top-level operating mode, selected over the operator link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Direct drive commands from the operator console.
    Normal,
    /// Gesture-driven console control; same firmware behavior as Normal.
    Gesture,
    /// Autonomous flame seek and suppress.
    Auto,
}

impl Mode {
    /// Single-character code used in mode acknowledgements.
    pub fn code(&self) -> char {
        match self {
            Mode::Normal => 'N',
            Mode::Gesture => 'G',
            Mode::Auto => 'A',
        }
    }

    /// Modes in which the console drives the rover directly.
    pub fn is_manual(&self) -> bool {
        matches!(self, Mode::Normal | Mode::Gesture)
    }
}

/// Manual drive actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveCommand {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    Stop,
}

/// Decoded operator command.
///
/// The alphabet is closed: any byte outside it decodes to `None` and is
/// dropped without acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetMode(Mode),
    Drive(DriveCommand),
    PumpOn,
    DistanceRequest,
}

impl Command {
    pub fn parse(byte: u8) -> Option<Command> {
        match byte {
            b'A' => Some(Command::SetMode(Mode::Auto)),
            b'G' => Some(Command::SetMode(Mode::Gesture)),
            b'N' => Some(Command::SetMode(Mode::Normal)),
            b'F' => Some(Command::Drive(DriveCommand::Forward)),
            b'B' => Some(Command::Drive(DriveCommand::Backward)),
            b'L' => Some(Command::Drive(DriveCommand::TurnLeft)),
            b'R' => Some(Command::Drive(DriveCommand::TurnRight)),
            b'S' => Some(Command::Drive(DriveCommand::Stop)),
            b'P' => Some(Command::PumpOn),
            b'D' => Some(Command::DistanceRequest),
            _ => None,
        }
    }
}
