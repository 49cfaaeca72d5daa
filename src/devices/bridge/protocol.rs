//! Wire protocol for the pin-controller bridge board.
//!
//! The board owns the raw pins: H-bridge inputs, servo PWM, the pump relay,
//! the indicator output, the ultrasonic trigger/echo pair (it runs the
//! 2 us settle + 10 us trigger pulse and times the echo itself), the flame
//! input, and the moisture ADC. This module only frames commands for it.
//!
//! Frame layout, both directions:
//!
//! ```text
//! +--------+-----+-----+------------+----------+
//! | 0xA5   | reg | len | payload... | checksum |
//! +--------+-----+-----+------------+----------+
//! ```
//!
//! Checksum is the wrapping byte sum of reg, len, and payload.

use crate::core::rig::{WheelCommand, WheelDirection};
use crate::error::{Error, Result};

/// Frame header byte.
pub const HEADER: u8 = 0xA5;

/// Write registers.
pub const REG_WHEELS: u8 = 0x01;
pub const REG_SCAN_SERVO: u8 = 0x02;
pub const REG_NOZZLE_SERVO: u8 = 0x03;
pub const REG_PUMP: u8 = 0x04;
pub const REG_INDICATOR: u8 = 0x05;

/// Query registers; the board answers with a frame carrying the same
/// register id.
pub const REG_RANGE: u8 = 0x10;
pub const REG_FLAME: u8 = 0x11;
pub const REG_MOISTURE: u8 = 0x12;

/// Echo payload meaning "no echo within the timeout".
pub const RANGE_NO_ECHO: u16 = 0xFFFF;

fn checksum(reg: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(reg.wrapping_add(payload.len() as u8), |sum, b| {
            sum.wrapping_add(*b)
        })
}

/// Build one command frame.
pub fn frame(reg: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4 + payload.len());
    bytes.push(HEADER);
    bytes.push(reg);
    bytes.push(payload.len() as u8);
    bytes.extend_from_slice(payload);
    bytes.push(checksum(reg, payload));
    bytes
}

fn direction_code(direction: WheelDirection) -> u8 {
    match direction {
        WheelDirection::Idle => 0,
        WheelDirection::Forward => 1,
        WheelDirection::Reverse => 2,
    }
}

pub fn cmd_wheels(left: WheelCommand, right: WheelCommand) -> Vec<u8> {
    frame(
        REG_WHEELS,
        &[
            direction_code(left.direction),
            left.duty,
            direction_code(right.direction),
            right.duty,
        ],
    )
}

pub fn cmd_scan_servo(angle_deg: u8) -> Vec<u8> {
    frame(REG_SCAN_SERVO, &[angle_deg])
}

pub fn cmd_nozzle_servo(angle_deg: u8) -> Vec<u8> {
    frame(REG_NOZZLE_SERVO, &[angle_deg])
}

pub fn cmd_pump(on: bool) -> Vec<u8> {
    frame(REG_PUMP, &[on as u8])
}

pub fn cmd_indicator(on: bool) -> Vec<u8> {
    frame(REG_INDICATOR, &[on as u8])
}

pub fn cmd_query(reg: u8) -> Vec<u8> {
    frame(reg, &[])
}

/// Validate a response frame (header stripped) and return its payload.
///
/// `body` is `[reg, len, payload..., checksum]`.
pub fn parse_response(expected_reg: u8, body: &[u8]) -> Result<&[u8]> {
    if body.len() < 3 {
        return Err(Error::InvalidPacket(format!(
            "response too short: {} bytes",
            body.len()
        )));
    }
    let reg = body[0];
    let len = body[1] as usize;
    if reg != expected_reg {
        return Err(Error::InvalidPacket(format!(
            "unexpected register {:#04x}, wanted {:#04x}",
            reg, expected_reg
        )));
    }
    if body.len() != 3 + len {
        return Err(Error::InvalidPacket(format!(
            "bad length: {} payload bytes declared, {} present",
            len,
            body.len() - 3
        )));
    }
    let payload = &body[2..2 + len];
    let expected = checksum(reg, payload);
    let actual = body[2 + len];
    if expected != actual {
        return Err(Error::ChecksumError { expected, actual });
    }
    Ok(payload)
}
