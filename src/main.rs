//! AgniIO - hardware control daemon for the Agni fire-suppression rover
//!
//! Loads the TOML configuration, builds the hardware rig and the operator
//! command link, and runs the cooperative control loop until SIGINT.

use agni_io::app::App;
use agni_io::core::clock::SystemClock;
use agni_io::devices::create_rig;
use agni_io::error::{Error, Result};
use agni_io::transport::{CommandLink, SerialTransport};
use agni_io::Config;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `agni-io <path>` (positional)
/// - `agni-io --config <path>` (flag-based)
/// - `agni-io -c <path>` (short flag)
///
/// Defaults to `/etc/agni-io.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    // Default path
    "/etc/agni-io.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = Config::load(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.logging.level),
    )
    .init();

    log::info!("AgniIO starting...");
    log::info!("Using config: {}", config_path);
    log::info!("Device: {} ({})", config.device.name, config.device.device_type);

    // Build the hardware rig and the operator link
    let rig = create_rig(&config)?;
    let link_transport = SerialTransport::open(&config.link.port, config.link.baud)?;
    let link = CommandLink::new(Box::new(link_transport));
    log::info!(
        "Operator link on {} at {} baud",
        config.link.port,
        config.link.baud
    );

    // Set up shutdown signal handler
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        flag.store(true, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    log::info!("AgniIO running. Press Ctrl-C to stop.");

    let mut app = App::new(rig, link, SystemClock::new(), shutdown);
    app.run()?;

    log::info!("AgniIO stopped");
    Ok(())
}
