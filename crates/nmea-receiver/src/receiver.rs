//! Processing Task
//!
//! Consumer half of the receiver. Each call to [`Receiver::process`] drains
//! every complete line from the ring, validates and decodes it, and runs
//! the speed callbacks against the previous fix.

use crate::stats::{Counters, ReceiverStats};
use line_buffer::{LineConsumer, LineRead, StagingLine};
use nmea_protocol::{Decoder, FixSnapshot, NmeaError, SentenceKind};
use speed_events::{CallbackRegistry, EventEngine, EventError, EventKind, FiredEvents};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

/// Aggregate outcome of one processing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Every line was accepted (or there were none)
    Ok,
    /// At least one line failed checksum validation
    ChecksumFailed,
    /// At least one line was too long for the staging buffer, none failed validation
    LineTruncated,
}

/// Outcome of handling a single line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineOutcome {
    /// Sentence applied to the fix
    Decoded {
        kind: SentenceKind,
        fired: FiredEvents,
    },
    /// Valid sentence of a type or talker the decoder ignores
    Ignored,
}

pub struct Receiver {
    consumer: LineConsumer,
    staging: StagingLine,
    decoder: Decoder,
    fix: FixSnapshot,
    events: EventEngine,
    fix_tx: watch::Sender<FixSnapshot>,
    stats: Arc<Counters>,
}

impl Receiver {
    pub(crate) fn new(
        consumer: LineConsumer,
        staging: StagingLine,
        decoder: Decoder,
        stats: Arc<Counters>,
    ) -> Self {
        let (fix_tx, _) = watch::channel(FixSnapshot::default());
        Self {
            consumer,
            staging,
            decoder,
            fix: FixSnapshot::default(),
            events: EventEngine::new(),
            fix_tx,
            stats,
        }
    }

    /// Drain and handle every complete line currently buffered.
    ///
    /// A rejected line never stops the pass; the status reports the worst
    /// thing that happened.
    pub fn process(&mut self) -> ProcessStatus {
        let mut status = ProcessStatus::Ok;
        let mut decoded_any = false;

        while let Some(read) = self.consumer.pop_line(&mut self.staging) {
            Counters::add(&self.stats.lines_processed, 1);

            match self.handle_line(read) {
                Ok(LineOutcome::Decoded { .. }) => decoded_any = true,
                Ok(LineOutcome::Ignored) => {}
                Err(e) if e.is_checksum_failure() => status = ProcessStatus::ChecksumFailed,
                Err(_) => {
                    if status == ProcessStatus::Ok {
                        status = ProcessStatus::LineTruncated;
                    }
                }
            }
        }

        if decoded_any {
            self.fix_tx.send_replace(self.fix);
        }
        status
    }

    fn handle_line(&mut self, read: LineRead) -> Result<LineOutcome, NmeaError> {
        if let LineRead::Truncated { kept, dropped } = read {
            warn!("Discarding line longer than {} bytes ({} dropped)", kept, dropped);
            Counters::add(&self.stats.lines_truncated, 1);
            metrics::counter!("nmea_lines_truncated_total").increment(1);
            return Err(NmeaError::LineTruncated { kept, dropped });
        }

        let line = self.staging.as_bytes();
        if let Err(e) = nmea_protocol::validate(line) {
            debug!("Rejected line {:?}: {}", String::from_utf8_lossy(line).trim_end(), e);
            Counters::add(&self.stats.checksum_failures, 1);
            metrics::counter!("nmea_checksum_failures_total").increment(1);
            return Err(e);
        }

        let previous = self.fix;
        let Some(kind) = self.decoder.decode(line, &mut self.fix) else {
            trace!("Ignoring sentence {:?}", String::from_utf8_lossy(line).trim_end());
            Counters::add(&self.stats.sentences_ignored, 1);
            return Ok(LineOutcome::Ignored);
        };

        Counters::add(&self.stats.sentences_decoded, 1);
        metrics::counter!("nmea_sentences_decoded_total", "kind" => kind.as_str()).increment(1);

        let fired = self.events.evaluate(&previous, &self.fix);
        for event in fired.iter() {
            Counters::add(&self.stats.events_fired, 1);
            metrics::counter!("nmea_speed_events_total", "event" => event.as_str()).increment(1);
        }

        Ok(LineOutcome::Decoded { kind, fired })
    }

    /// Copy of the current fix
    pub fn fix(&self) -> FixSnapshot {
        self.fix
    }

    /// Watch the fix; a new value is published after each pass that decoded something
    pub fn subscribe(&self) -> watch::Receiver<FixSnapshot> {
        self.fix_tx.subscribe()
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats.snapshot()
    }

    /// Complete lines waiting in the ring
    pub fn pending_lines(&self) -> usize {
        self.consumer.pending_lines()
    }

    /// Install a speed callback; see [`CallbackRegistry::register`]
    pub fn register_callback<F>(&mut self, kind: EventKind, handler: F, threshold: f64) -> Result<(), EventError>
    where
        F: FnMut(&FixSnapshot, &mut CallbackRegistry) + Send + 'static,
    {
        self.events.register(kind, handler, threshold)
    }

    pub fn unregister_callback(&mut self, kind: EventKind) -> Result<(), EventError> {
        self.events.unregister(kind)
    }

    pub fn events(&self) -> &EventEngine {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use line_buffer::channel;

    fn receiver_with_ring(capacity: usize, staging: usize) -> (line_buffer::LineProducer, Receiver) {
        let (producer, consumer) = channel(capacity).unwrap();
        let receiver = Receiver::new(
            consumer,
            StagingLine::with_capacity(staging),
            Decoder::new(true),
            Arc::new(Counters::default()),
        );
        (producer, receiver)
    }

    #[test]
    fn test_empty_ring_is_ok() {
        let (_producer, mut receiver) = receiver_with_ring(64, 32);
        assert_eq!(receiver.process(), ProcessStatus::Ok);
        assert_eq!(receiver.stats(), ReceiverStats::default());
    }

    #[test]
    fn test_checksum_failure_outranks_truncation() {
        let (mut producer, mut receiver) = receiver_with_ring(256, 16);
        producer.push_slice(b"$GPGLL,4916.45,N,12311.12,W,225444,A*31\r\n");
        producer.push_slice(b"$GPGLL*00\r\n");

        assert_eq!(receiver.process(), ProcessStatus::ChecksumFailed);
        let stats = receiver.stats();
        assert_eq!(stats.lines_processed, 2);
        assert_eq!(stats.lines_truncated, 1);
        assert_eq!(stats.checksum_failures, 1);
    }

    #[test]
    fn test_line_without_checksum_suffix_fails_validation() {
        let (mut producer, mut receiver) = receiver_with_ring(256, 128);
        producer.push_slice(b"$GPGLL,4916.45,N\r\n");
        producer.push_slice(b"$GPGLL,4916.45,N*3\r\n");

        assert_eq!(receiver.process(), ProcessStatus::ChecksumFailed);
        assert_eq!(receiver.fix(), FixSnapshot::default());
        let stats = receiver.stats();
        assert_eq!(stats.checksum_failures, 2);
        assert_eq!(stats.sentences_decoded, 0);
    }

    #[test]
    fn test_ignored_sentence_leaves_fix() {
        let (mut producer, mut receiver) = receiver_with_ring(256, 128);
        producer.push_slice(b"$GPTXT,01,01,02,ANTENNA OK*36\r\n");

        assert_eq!(nmea_protocol::checksum(b"GPTXT,01,01,02,ANTENNA OK"), 0x36);
        assert_eq!(receiver.process(), ProcessStatus::Ok);
        assert_eq!(receiver.fix(), FixSnapshot::default());
        assert_eq!(receiver.stats().sentences_ignored, 1);
    }
}
