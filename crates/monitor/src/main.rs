//! NMEA Monitor - Main Entry Point
//!
//! Usage: `nmea-monitor [config.toml]`. Settings can also be overridden with
//! `NMEA_`-prefixed environment variables.

use monitor::{replay_file, run_serial, MonitorConfig};
use nmea_receiver::{init_logging, load_settings};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config: MonitorConfig = load_settings(config_path.as_deref())?;
    init_logging(&config.log_level, config.json_logs)?;

    info!("=== NMEA Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    match &config.replay_file {
        Some(path) => {
            let summary = replay_file(path, &config)?;
            info!("Replay finished: {}", serde_json::to_string(&summary)?);
        }
        None => run_serial(&config).await?,
    }

    Ok(())
}
