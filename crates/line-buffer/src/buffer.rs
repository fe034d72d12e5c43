//! Lock-Free Line Ring Implementation

use crate::staging::StagingLine;
use crate::{RingError, LINE_TERMINATOR};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Shared storage behind a producer/consumer pair.
///
/// `head` and `tail` are free-running and indexed modulo `capacity`, so
/// `head - tail` is always the number of buffered bytes. `head` is only ever
/// stored by the producer. `tail` is advanced by the consumer when it commits
/// a line and by the producer during overflow recovery; both go through
/// `compare_exchange`, so a span is committed by exactly one side.
struct Ring {
    /// Pre-allocated storage
    cells: Box<[AtomicU8]>,
    /// Capacity of the ring
    capacity: usize,
    /// Write position (producer)
    head: AtomicUsize,
    /// Read position
    tail: AtomicUsize,
    /// Complete lines buffered and not yet extracted
    pending_lines: AtomicUsize,
}

impl Ring {
    fn cell(&self, position: usize) -> &AtomicU8 {
        &self.cells[position % self.capacity]
    }

    fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }
}

/// Create a ring of `capacity` bytes and split it into its two handles
pub fn channel(capacity: usize) -> Result<(LineProducer, LineConsumer), RingError> {
    if capacity == 0 {
        return Err(RingError::ZeroCapacity);
    }

    let cells: Vec<AtomicU8> = (0..capacity).map(|_| AtomicU8::new(0)).collect();
    let ring = Arc::new(Ring {
        cells: cells.into_boxed_slice(),
        capacity,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
        pending_lines: AtomicUsize::new(0),
    });

    debug!("Created line ring with capacity {}", capacity);

    Ok((
        LineProducer {
            ring: Arc::clone(&ring),
            resyncing: false,
        },
        LineConsumer { ring },
    ))
}

/// Outcome of pushing a single byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    /// Byte stored, nothing dropped
    Stored,
    /// Ring was full; whole lines were dropped from the read side first
    Overflowed {
        discarded_bytes: usize,
        discarded_lines: usize,
    },
    /// Ring was full of one unterminated run; it was dropped along with this
    /// byte, and bytes are skipped through the next terminator
    Resynced { discarded_bytes: usize },
    /// Byte dropped because it belongs to a line that no longer fits
    Skipped,
}

/// Accumulated outcome of pushing a chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Bytes written into the ring
    pub stored: usize,
    /// Bytes dropped while resynchronising to the next line start
    pub skipped: usize,
    /// Number of overflow recoveries
    pub overflows: usize,
    /// Bytes dropped from the read side by overflow recovery
    pub discarded_bytes: usize,
    /// Complete lines dropped by overflow recovery
    pub discarded_lines: usize,
}

impl PushReport {
    /// Whether any overflow recovery happened
    pub fn overflowed(&self) -> bool {
        self.overflows > 0
    }

    fn record(&mut self, status: PushStatus) {
        match status {
            PushStatus::Stored => self.stored += 1,
            PushStatus::Skipped => self.skipped += 1,
            PushStatus::Overflowed {
                discarded_bytes,
                discarded_lines,
            } => {
                self.overflows += 1;
                self.discarded_bytes += discarded_bytes;
                self.discarded_lines += discarded_lines;
                self.stored += 1;
            }
            PushStatus::Resynced { discarded_bytes } => {
                self.overflows += 1;
                self.discarded_bytes += discarded_bytes;
                self.skipped += 1;
            }
        }
    }
}

/// Write side of the ring. Not `Clone`: there is exactly one per ring.
pub struct LineProducer {
    ring: Arc<Ring>,
    /// Dropping bytes until the next terminator after an unframeable overflow
    resyncing: bool,
}

impl LineProducer {
    /// Push one byte at the head of the ring.
    ///
    /// When the ring is full, bytes are first dropped from the tail through
    /// the next line terminator, so the dropped span is always whole lines.
    pub fn push(&mut self, byte: u8) -> PushStatus {
        if self.resyncing {
            if byte == LINE_TERMINATOR {
                trace!("Resynchronised on line terminator");
                self.resyncing = false;
            }
            return PushStatus::Skipped;
        }

        let ring = &*self.ring;
        let head = ring.head.load(Ordering::Relaxed);
        let mut discarded_bytes = 0;
        let mut discarded_lines = 0;

        loop {
            let tail = ring.tail.load(Ordering::Acquire);
            if head.wrapping_sub(tail) < ring.capacity {
                break;
            }

            match self.find_terminator(tail, head) {
                Some(line_end) => {
                    if ring
                        .tail
                        .compare_exchange(tail, line_end, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        ring.pending_lines.fetch_sub(1, Ordering::AcqRel);
                        discarded_bytes += line_end.wrapping_sub(tail);
                        discarded_lines += 1;
                    }
                }
                None => {
                    // The whole ring is one unterminated run: nothing in it can
                    // ever become a line, so drop it and the rest of that run.
                    if ring
                        .tail
                        .compare_exchange(tail, head, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        let dropped = head.wrapping_sub(tail);
                        warn!(
                            "Line ring overflowed with no terminator in {} bytes, resynchronising",
                            dropped
                        );
                        self.resyncing = byte != LINE_TERMINATOR;
                        return PushStatus::Resynced { discarded_bytes: dropped };
                    }
                }
            }
        }

        ring.cell(head).store(byte, Ordering::Relaxed);
        if byte == LINE_TERMINATOR {
            // Count the line before publishing it, so the consumer never
            // commits a line whose increment it cannot see yet.
            ring.pending_lines.fetch_add(1, Ordering::AcqRel);
        }
        ring.head.store(head.wrapping_add(1), Ordering::Release);

        if discarded_lines > 0 {
            debug!(
                "Line ring overflow: dropped {} lines ({} bytes)",
                discarded_lines, discarded_bytes
            );
            PushStatus::Overflowed {
                discarded_bytes,
                discarded_lines,
            }
        } else {
            PushStatus::Stored
        }
    }

    /// Push a drained chunk byte by byte
    pub fn push_slice(&mut self, bytes: &[u8]) -> PushReport {
        let mut report = PushReport::default();
        for &byte in bytes {
            report.record(self.push(byte));
        }
        report
    }

    /// Position just past the first terminator in `[from, to)`
    fn find_terminator(&self, from: usize, to: usize) -> Option<usize> {
        let mut position = from;
        while position != to {
            let byte = self.ring.cell(position).load(Ordering::Relaxed);
            position = position.wrapping_add(1);
            if byte == LINE_TERMINATOR {
                return Some(position);
            }
        }
        None
    }

    /// Whether the producer is dropping the remainder of an oversized run
    pub fn is_resyncing(&self) -> bool {
        self.resyncing
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }
}

/// Result of extracting one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRead {
    /// A whole line, terminator included, of the given length
    Complete(usize),
    /// The line did not fit; `kept` bytes are in staging, `dropped` were skipped
    Truncated { kept: usize, dropped: usize },
}

/// Read side of the ring. Not `Clone`: there is exactly one per ring.
pub struct LineConsumer {
    ring: Arc<Ring>,
}

impl LineConsumer {
    /// Move the next complete line into `staging`.
    ///
    /// Returns `None` when no complete line is buffered. A line longer than
    /// the staging capacity is still consumed through its terminator and
    /// reported as truncated.
    pub fn pop_line(&mut self, staging: &mut StagingLine) -> Option<LineRead> {
        let ring = &*self.ring;

        loop {
            if ring.pending_lines.load(Ordering::Acquire) == 0 {
                return None;
            }

            staging.clear();
            let tail = ring.tail.load(Ordering::Acquire);
            let head = ring.head.load(Ordering::Acquire);

            let mut position = tail;
            let mut dropped = 0;
            let mut terminated = false;
            while position != head {
                let byte = ring.cell(position).load(Ordering::Relaxed);
                position = position.wrapping_add(1);
                if !staging.try_push(byte) {
                    dropped += 1;
                }
                if byte == LINE_TERMINATOR {
                    terminated = true;
                    break;
                }
            }

            if !terminated {
                if ring.tail.load(Ordering::Acquire) != tail {
                    // Producer dropped lines underneath us; start over
                    continue;
                }
                // Counted but not yet published by the producer
                staging.clear();
                return None;
            }

            if ring
                .tail
                .compare_exchange(tail, position, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                trace!("Line dropped by overflow recovery during extraction, retrying");
                continue;
            }
            ring.pending_lines.fetch_sub(1, Ordering::AcqRel);

            return Some(if dropped == 0 {
                LineRead::Complete(staging.len())
            } else {
                LineRead::Truncated {
                    kept: staging.len(),
                    dropped,
                }
            });
        }
    }

    /// Complete lines waiting to be extracted
    pub fn pending_lines(&self) -> usize {
        self.ring.pending_lines.load(Ordering::Acquire)
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }
}
