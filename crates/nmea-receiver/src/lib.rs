//! NMEA GPS Receiver
//!
//! Wires a byte source, the line ring, the sentence decoder and the speed
//! event engine into two halves:
//!
//! - [`Intake`]: called on every data-ready notification; drains the source
//!   into the ring and never parses.
//! - [`Receiver`]: the cooperative processing task; drains complete lines,
//!   updates the fix and runs speed callbacks.
//!
//! The halves share only the ring and a set of counters, so the intake can
//! run on an interrupt-like thread while the receiver runs on a task.

mod error;
mod intake;
mod receiver;
mod settings;
mod source;
mod stats;

pub use error::{ReceiverError, SourceError};
pub use intake::{Intake, IntakeReport, IntakeStatus};
pub use receiver::{LineOutcome, ProcessStatus, Receiver};
pub use settings::{load_settings, ReceiverConfig, ENV_PREFIX};
pub use source::{ByteSource, ReaderSource, SliceSource};
pub use stats::ReceiverStats;

pub use nmea_protocol::{FixSnapshot, SentenceKind};
pub use speed_events::{CallbackRegistry, EventKind};

use line_buffer::StagingLine;
use nmea_protocol::Decoder;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Build both halves of the receiver around `source`.
///
/// Every buffer is allocated here; nothing allocates per byte or per line
/// afterwards.
pub fn init<S: ByteSource>(source: S, config: &ReceiverConfig) -> Result<(Intake<S>, Receiver), ReceiverError> {
    config.validate()?;

    let (producer, consumer) = line_buffer::channel(config.ring_capacity)?;
    let stats = Arc::new(stats::Counters::default());

    let intake = Intake::new(source, config.intake_capacity, producer, Arc::clone(&stats));
    let receiver = Receiver::new(
        consumer,
        StagingLine::with_capacity(config.staging_capacity),
        Decoder::new(config.accept_any_talker),
        stats,
    );

    info!(
        "NMEA receiver initialised (intake {} B, ring {} B, staging {} B)",
        config.intake_capacity, config.ring_capacity, config.staging_capacity
    );
    Ok((intake, receiver))
}

/// Install the global tracing subscriber.
///
/// `level` is one of `trace`, `debug`, `info`, `warn`, `error`.
pub fn init_logging(level: &str, json: bool) -> Result<(), ReceiverError> {
    let level: tracing::Level = level
        .parse()
        .map_err(|_| ReceiverError::Logging(format!("unknown log level '{}'", level)))?;

    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);
    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| ReceiverError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_rejects_invalid_config() {
        let config = ReceiverConfig {
            ring_capacity: 16,
            intake_capacity: 32,
            ..Default::default()
        };
        assert!(matches!(
            init(SliceSource::new(), &config),
            Err(ReceiverError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_log_level() {
        assert!(matches!(
            init_logging("loud", false),
            Err(ReceiverError::Logging(_))
        ));
    }
}
