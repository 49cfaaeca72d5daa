//! Configuration for the AgniIO daemon
//!
//! Loads configuration from a TOML file. Only hardware bindings live here:
//! control thresholds are fixed constants (see [`crate::control::params`]),
//! not tunable parameters.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub device: DeviceConfig,
    pub link: LinkConfig,
    pub logging: LoggingConfig,
}

/// Rig selection and device-specific settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Rig implementation: "bridge" (serial pin-controller board) or "mock"
    #[serde(rename = "type")]
    pub device_type: String,
    /// Human-readable device name for logs
    pub name: String,
    /// Bridge board settings (required when type = "bridge")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeConfig>,
}

/// Serial settings for the pin-controller bridge board
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Bridge board serial port (e.g. "/dev/ttyS3")
    pub port: String,
    /// Baud rate for the bridge link
    pub baud: u32,
}

/// Operator command link (byte-oriented serial line)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkConfig {
    /// Command link serial port (e.g. "/dev/ttyUSB0")
    pub port: String,
    /// Baud rate; the operator console expects 9600
    pub baud: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration for the rover's onboard wiring
    ///
    /// Suitable for testing and development. Deployments should use a
    /// proper TOML configuration file.
    pub fn rover_defaults() -> Self {
        Self {
            device: DeviceConfig {
                device_type: "bridge".to_string(),
                name: "Agni rover".to_string(),
                bridge: Some(BridgeConfig {
                    port: "/dev/ttyS3".to_string(),
                    baud: 115_200,
                }),
            },
            link: LinkConfig {
                port: "/dev/ttyUSB0".to_string(),
                baud: 9600,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::rover_defaults()
    }
}
