//! Serial bridge to the pin-controller board.
//!
//! The rover's pins hang off a small controller board on a serial link; this
//! rig turns [`RoverRig`] calls into the register frames of
//! [`protocol`] and decodes the board's replies. Actuator writes are
//! fire-and-forget; sensor queries block until the reply or a deadline,
//! bounded well under one scheduler tick budget.

pub mod protocol;

use crate::core::rig::{RoverRig, WheelCommand};
use crate::error::{Error, Result};
use crate::transport::Transport;
use std::thread;
use std::time::{Duration, Instant};

/// Reply deadline per query. The ranging echo timeout is 30 ms; the rest is
/// serial latency margin.
const RESPONSE_DEADLINE: Duration = Duration::from_millis(60);

/// Rover rig backed by the bridge board.
pub struct BridgeRig {
    transport: Box<dyn Transport>,
}

impl BridgeRig {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.transport.write(bytes)?;
        self.transport.flush()
    }

    fn read_byte(&mut self, deadline: Instant) -> Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            if self.transport.read(&mut buf)? == 1 {
                return Ok(buf[0]);
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout);
            }
            thread::sleep(Duration::from_micros(200));
        }
    }

    /// Send a query and return the validated reply payload.
    fn query(&mut self, reg: u8) -> Result<Vec<u8>> {
        self.send(&protocol::cmd_query(reg))?;

        let deadline = Instant::now() + RESPONSE_DEADLINE;
        // Resynchronize on the header in case of line noise
        while self.read_byte(deadline)? != protocol::HEADER {}

        let reply_reg = self.read_byte(deadline)?;
        let len = self.read_byte(deadline)?;
        let mut body = vec![reply_reg, len];
        for _ in 0..len as usize + 1 {
            body.push(self.read_byte(deadline)?);
        }
        Ok(protocol::parse_response(reg, &body)?.to_vec())
    }

    fn query_u16(&mut self, reg: u8) -> Result<u16> {
        let payload = self.query(reg)?;
        if payload.len() != 2 {
            return Err(Error::InvalidPacket(format!(
                "register {:#04x}: expected 2 payload bytes, got {}",
                reg,
                payload.len()
            )));
        }
        Ok(u16::from_be_bytes([payload[0], payload[1]]))
    }
}

impl RoverRig for BridgeRig {
    fn set_wheels(&mut self, left: WheelCommand, right: WheelCommand) -> Result<()> {
        self.send(&protocol::cmd_wheels(left, right))
    }

    fn set_scan_angle(&mut self, angle_deg: u8) -> Result<()> {
        self.send(&protocol::cmd_scan_servo(angle_deg.min(180)))
    }

    fn set_nozzle_angle(&mut self, angle_deg: u8) -> Result<()> {
        self.send(&protocol::cmd_nozzle_servo(angle_deg.min(180)))
    }

    fn set_pump(&mut self, on: bool) -> Result<()> {
        self.send(&protocol::cmd_pump(on))
    }

    fn set_indicator(&mut self, on: bool) -> Result<()> {
        self.send(&protocol::cmd_indicator(on))
    }

    fn measure_echo(&mut self) -> Result<Option<Duration>> {
        match self.query_u16(protocol::REG_RANGE)? {
            protocol::RANGE_NO_ECHO => Ok(None),
            echo_us => Ok(Some(Duration::from_micros(echo_us as u64))),
        }
    }

    fn flame_detected(&mut self) -> Result<bool> {
        let payload = self.query(protocol::REG_FLAME)?;
        if payload.len() != 1 {
            return Err(Error::InvalidPacket(format!(
                "flame query: expected 1 payload byte, got {}",
                payload.len()
            )));
        }
        // The board reports the raw pin level. The sensor is assumed
        // active-low (LOW = flame present); not yet verified against the
        // production wiring, so do not invert anywhere else.
        Ok(payload[0] == 0)
    }

    fn read_moisture(&mut self) -> Result<u16> {
        self.query_u16(protocol::REG_MOISTURE)
    }
}
