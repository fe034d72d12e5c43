//! NMEA Monitor
//!
//! Front end for the receiver: reads a live serial port or replays a capture
//! file, logs each new fix as JSON and logs configured speed events.

use anyhow::{Context, Result};
use nmea_receiver::{
    init, EventKind, FixSnapshot, ProcessStatus, ReaderSource, Receiver, ReceiverConfig, ReceiverStats,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Monitor settings, loaded through [`nmea_receiver::load_settings`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Buffer sizing and decoding options
    pub receiver: ReceiverConfig,
    /// Serial device path
    pub device: String,
    pub baud_rate: u32,
    /// Interval between processing passes, also the serial read timeout
    pub poll_interval_ms: u64,
    pub log_level: String,
    pub json_logs: bool,
    /// Replay this capture instead of opening the serial port
    pub replay_file: Option<PathBuf>,
    /// Speed events to log
    pub callbacks: Vec<CallbackConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            receiver: ReceiverConfig::default(),
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            poll_interval_ms: 100,
            log_level: "info".to_string(),
            json_logs: false,
            replay_file: None,
            callbacks: Vec::new(),
        }
    }
}

/// One speed event to log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallbackConfig {
    pub event: EventKind,
    pub threshold: f64,
}

/// Final state of a replay
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub fix: FixSnapshot,
    pub stats: ReceiverStats,
}

/// Register a logging callback for every configured speed event
pub fn install_callbacks(receiver: &mut Receiver, callbacks: &[CallbackConfig]) -> Result<()> {
    for callback in callbacks {
        let kind = callback.event;
        receiver
            .register_callback(
                kind,
                move |fix: &FixSnapshot, _| {
                    info!("Speed event {}: {:.1} km/h at UTC {}", kind, fix.speed_kmph, fix.utc_time);
                },
                callback.threshold,
            )
            .with_context(|| format!("registering {} callback", kind))?;
    }
    Ok(())
}

/// Feed a whole capture through the receiver, one drain per processing pass
pub fn replay<R: Read>(reader: R, config: &MonitorConfig) -> Result<ReplaySummary> {
    let (mut intake, mut receiver) = init(ReaderSource::new(reader), &config.receiver)?;
    install_callbacks(&mut receiver, &config.callbacks)?;

    while !intake.is_exhausted() {
        intake.on_data_ready()?;
        log_status(receiver.process());
    }

    Ok(ReplaySummary {
        fix: receiver.fix(),
        stats: receiver.stats(),
    })
}

/// [`replay`] a capture file from disk
pub fn replay_file(path: &Path, config: &MonitorConfig) -> Result<ReplaySummary> {
    let file = File::open(path).with_context(|| format!("opening capture {}", path.display()))?;
    info!("Replaying {}", path.display());
    replay(BufReader::new(file), config)
}

/// Read the serial port until Ctrl-C or until the port fails.
///
/// The intake runs on a blocking thread, the processing pass on a tokio
/// interval.
pub async fn run_serial(config: &MonitorConfig) -> Result<()> {
    let poll = Duration::from_millis(config.poll_interval_ms.max(1));
    let port = tokio_serial::new(&config.device, config.baud_rate)
        .timeout(poll)
        .open()
        .with_context(|| format!("opening serial port {}", config.device))?;
    info!("Opened {} at {} baud", config.device, config.baud_rate);

    let (mut intake, mut receiver) = init(ReaderSource::new(port), &config.receiver)?;
    install_callbacks(&mut receiver, &config.callbacks)?;
    let reporter = tokio::spawn(report_fixes(receiver.subscribe()));

    let running = Arc::new(AtomicBool::new(true));
    let intake_running = Arc::clone(&running);
    let intake_task = tokio::task::spawn_blocking(move || {
        while intake_running.load(Ordering::Relaxed) && !intake.is_exhausted() {
            intake.on_data_ready()?;
        }
        Ok::<_, nmea_receiver::SourceError>(())
    });

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(poll);

    loop {
        tokio::select! {
            _ = ticker.tick() => log_status(receiver.process()),
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
        if intake_task.is_finished() {
            warn!("Serial intake stopped");
            break;
        }
    }

    running.store(false, Ordering::Relaxed);
    let intake_result = intake_task.await?;
    log_status(receiver.process());
    info!("Final statistics: {}", serde_json::to_string(&receiver.stats())?);

    drop(receiver);
    reporter.await?;
    intake_result?;
    Ok(())
}

/// Log every published fix until the receiver goes away; returns how many were logged
pub async fn report_fixes(mut updates: watch::Receiver<FixSnapshot>) -> usize {
    let mut reported = 0;
    while updates.changed().await.is_ok() {
        let fix = *updates.borrow_and_update();
        match serde_json::to_string(&fix) {
            Ok(json) => info!("Fix {}", json),
            Err(e) => warn!("Failed to serialise fix: {}", e),
        }
        reported += 1;
    }
    reported
}

fn log_status(status: ProcessStatus) {
    match status {
        ProcessStatus::Ok => {}
        ProcessStatus::ChecksumFailed => debug!("Processing pass rejected sentences with bad checksums"),
        ProcessStatus::LineTruncated => debug!("Processing pass skipped overlong lines"),
    }
}
