//! Intake Side
//!
//! Runs in the context that is notified when the source has bytes ready
//! (interrupt handler, blocking serial thread). It never parses: it only
//! drains the source and appends to the ring.

use crate::error::SourceError;
use crate::source::ByteSource;
use crate::stats::Counters;
use line_buffer::{LineProducer, PushReport};
use std::sync::Arc;
use tracing::{trace, warn};

/// Overall outcome of one intake cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStatus {
    Ok,
    /// The ring filled up and buffered lines were dropped
    BufferOverflow,
}

/// Detailed outcome of one intake cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeReport {
    /// Bytes drained from the source
    pub bytes: usize,
    pub push: PushReport,
}

impl IntakeReport {
    pub fn status(&self) -> IntakeStatus {
        if self.push.overflowed() {
            IntakeStatus::BufferOverflow
        } else {
            IntakeStatus::Ok
        }
    }
}

/// Producer half of the receiver, bound to a byte source
pub struct Intake<S> {
    source: S,
    /// Transfer buffer the source drains into
    buffer: Box<[u8]>,
    producer: LineProducer,
    stats: Arc<Counters>,
}

impl<S: ByteSource> Intake<S> {
    pub(crate) fn new(source: S, capacity: usize, producer: LineProducer, stats: Arc<Counters>) -> Self {
        Self {
            source,
            buffer: vec![0u8; capacity].into_boxed_slice(),
            producer,
            stats,
        }
    }

    /// Data-ready notification: drain the source once and append the bytes.
    pub fn on_data_ready(&mut self) -> Result<IntakeReport, SourceError> {
        let n = self.source.drain(&mut self.buffer)?;
        if n == 0 {
            return Ok(IntakeReport::default());
        }

        let report = Self::append(&mut self.producer, &self.stats, &self.buffer[..n]);
        Ok(IntakeReport { bytes: n, push: report })
    }

    /// Append bytes that arrived by some other path than the bound source
    pub fn feed(&mut self, bytes: &[u8]) -> IntakeReport {
        let push = Self::append(&mut self.producer, &self.stats, bytes);
        IntakeReport {
            bytes: bytes.len(),
            push,
        }
    }

    fn append(producer: &mut LineProducer, stats: &Counters, bytes: &[u8]) -> PushReport {
        let report = producer.push_slice(bytes);
        trace!("Intake appended {} of {} bytes", report.stored, bytes.len());

        Counters::add(&stats.bytes_received, bytes.len());
        if report.skipped > 0 {
            Counters::add(&stats.bytes_skipped, report.skipped);
        }
        if report.overflowed() {
            warn!(
                "Ring buffer overflow: dropped {} line(s), {} byte(s), skipped {} byte(s)",
                report.discarded_lines, report.discarded_bytes, report.skipped
            );
            Counters::add(&stats.overflows, report.overflows);
            Counters::add(&stats.lines_discarded, report.discarded_lines);
            metrics::counter!("nmea_buffer_overflows_total").increment(report.overflows as u64);
        }
        report
    }

    /// Whether the bound source will produce no more bytes
    pub fn is_exhausted(&self) -> bool {
        self.source.is_exhausted()
    }

    /// Whether the ring is dropping bytes until the next line start
    pub fn is_resyncing(&self) -> bool {
        self.producer.is_resyncing()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
