//! Lock-Free Line Ring
//!
//! Provides a single-producer/single-consumer byte ring that absorbs raw
//! serial chunks and hands complete, newline-terminated lines to a bounded
//! staging buffer. Overflow recovery only ever drops whole lines.

mod buffer;
mod staging;

pub use buffer::{channel, LineConsumer, LineProducer, LineRead, PushReport, PushStatus};
pub use staging::StagingLine;

use thiserror::Error;

/// Default ring capacity (twice the default intake transfer size)
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default staging capacity (one NMEA sentence is at most 82 bytes)
pub const DEFAULT_STAGING_CAPACITY: usize = 128;

/// Byte that terminates a line
pub const LINE_TERMINATOR: u8 = b'\n';

/// Ring construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// Capacity must hold at least one byte
    #[error("Ring capacity must be greater than zero")]
    ZeroCapacity,
}
