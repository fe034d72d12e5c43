//! Pipeline Counters
//!
//! Shared between the intake side and the processing task. Each counter is
//! also mirrored to the `metrics` facade at the point where it is bumped.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub bytes_received: AtomicU64,
    pub bytes_skipped: AtomicU64,
    pub overflows: AtomicU64,
    pub lines_discarded: AtomicU64,
    pub lines_processed: AtomicU64,
    pub lines_truncated: AtomicU64,
    pub checksum_failures: AtomicU64,
    pub sentences_decoded: AtomicU64,
    pub sentences_ignored: AtomicU64,
    pub events_fired: AtomicU64,
}

impl Counters {
    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ReceiverStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        ReceiverStats {
            bytes_received: load(&self.bytes_received),
            bytes_skipped: load(&self.bytes_skipped),
            overflows: load(&self.overflows),
            lines_discarded: load(&self.lines_discarded),
            lines_processed: load(&self.lines_processed),
            lines_truncated: load(&self.lines_truncated),
            checksum_failures: load(&self.checksum_failures),
            sentences_decoded: load(&self.sentences_decoded),
            sentences_ignored: load(&self.sentences_ignored),
            events_fired: load(&self.events_fired),
        }
    }
}

/// Point-in-time copy of the pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReceiverStats {
    /// Bytes drained from the source
    pub bytes_received: u64,
    /// Bytes dropped while resynchronising after an overflow
    pub bytes_skipped: u64,
    /// Overflow recoveries performed by the intake side
    pub overflows: u64,
    /// Complete lines dropped by overflow recovery
    pub lines_discarded: u64,
    /// Lines taken off the ring, truncated ones included
    pub lines_processed: u64,
    /// Lines longer than the staging buffer
    pub lines_truncated: u64,
    /// Lines rejected by checksum validation
    pub checksum_failures: u64,
    /// Valid sentences of a supported type
    pub sentences_decoded: u64,
    /// Valid sentences of an unsupported type or talker
    pub sentences_ignored: u64,
    /// Speed callbacks run
    pub events_fired: u64,
}
