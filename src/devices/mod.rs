//! Rig implementations

pub mod bridge;
pub mod mock;

use crate::config::Config;
use crate::core::rig::RoverRig;
use crate::error::{Error, Result};
use crate::transport::SerialTransport;
use bridge::BridgeRig;
use mock::MockRig;

/// Create a rover rig based on configuration
pub fn create_rig(config: &Config) -> Result<Box<dyn RoverRig>> {
    match config.device.device_type.as_str() {
        "bridge" => {
            let bridge = config.device.bridge.as_ref().ok_or_else(|| {
                Error::Config("bridge device requires a [device.bridge] section".to_string())
            })?;
            let transport = SerialTransport::open(&bridge.port, bridge.baud)?;
            Ok(Box::new(BridgeRig::new(Box::new(transport))))
        }
        "mock" => {
            log::info!("Using mock bench rig (no hardware attached)");
            let (rig, _handle) = MockRig::new();
            Ok(Box::new(rig))
        }
        _ => Err(Error::UnknownDevice(config.device.device_type.clone())),
    }
}
