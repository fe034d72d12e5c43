//! Receiver Pipeline Tests
//!
//! Drives both halves end to end: byte source -> intake -> ring ->
//! processing task -> fix snapshot and speed callbacks.

use nmea_receiver::{
    init, EventKind, FixSnapshot, IntakeStatus, ProcessStatus, ReceiverConfig, SliceSource,
};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::thread;

const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
const RMC: &[u8] = b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";
const GLL: &[u8] = b"$GPGLL,4916.45,N,12311.12,W,225444,A*31\r\n";

fn vtg(speed: &str) -> Vec<u8> {
    let payload = format!("GPVTG,,T,,M,,N,{},K", speed);
    let sum = payload.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("${}*{:02X}\r\n", payload, sum).into_bytes()
}

/// Drain the source completely, processing after every transfer
fn run_to_end(
    intake: &mut nmea_receiver::Intake<SliceSource>,
    receiver: &mut nmea_receiver::Receiver,
) -> Vec<ProcessStatus> {
    let mut statuses = Vec::new();
    while !intake.is_exhausted() {
        intake.on_data_ready().unwrap();
        statuses.push(receiver.process());
    }
    statuses
}

#[test]
fn test_gga_sentence_updates_fix() {
    let source = SliceSource::from_stream(GGA, 16);
    let (mut intake, mut receiver) = init(source, &ReceiverConfig::default()).unwrap();

    let statuses = run_to_end(&mut intake, &mut receiver);
    assert!(statuses.iter().all(|s| *s == ProcessStatus::Ok));

    let fix = receiver.fix();
    assert_eq!(fix.utc_time, 123519.0);
    assert_eq!(fix.latitude, 4807.038);
    assert_eq!(fix.latitude_direction, Some('N'));
    assert_eq!(fix.longitude, 1131.0);
    assert_eq!(fix.longitude_direction, Some('E'));
    assert_eq!(fix.fix, 1);
    assert_eq!(fix.sat_in_use, 8);
    assert_eq!(fix.hdop, 0.9);
    assert_eq!(fix.altitude, 545.4);
    assert_eq!(fix.geoidal_separation, 46.9);
    assert!(fix.has_fix());
    assert_eq!(receiver.stats().sentences_decoded, 1);
}

#[test]
fn test_bad_checksum_does_not_stop_processing() {
    let mut stream = Vec::new();
    stream.extend_from_slice(b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*48\r\n");
    stream.extend_from_slice(RMC);

    let (mut intake, mut receiver) = init(SliceSource::new(), &ReceiverConfig::default()).unwrap();
    assert_eq!(intake.feed(&stream).status(), IntakeStatus::Ok);

    assert_eq!(receiver.process(), ProcessStatus::ChecksumFailed);
    let fix = receiver.fix();
    // Only the RMC sentence was applied
    assert_eq!(fix.fix, 0);
    assert_eq!(fix.ut_date, 230394);
    assert_eq!(fix.latitude, 4807.038);

    let stats = receiver.stats();
    assert_eq!(stats.checksum_failures, 1);
    assert_eq!(stats.sentences_decoded, 1);

    // Nothing left over for the next pass
    assert_eq!(receiver.process(), ProcessStatus::Ok);
}

#[test]
fn test_overlong_line_reported_and_skipped() {
    let config = ReceiverConfig {
        staging_capacity: 32,
        ..Default::default()
    };
    let (mut intake, mut receiver) = init(SliceSource::new(), &config).unwrap();
    intake.feed(GGA);
    intake.feed(&vtg("25.0"));

    assert_eq!(receiver.process(), ProcessStatus::LineTruncated);
    assert_eq!(receiver.fix().fix, 0);
    assert_eq!(receiver.fix().speed_kmph, 25.0);
    assert_eq!(receiver.stats().lines_truncated, 1);
}

#[test]
fn test_speed_callbacks_through_pipeline() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut source = SliceSource::new();
    for speed in ["5.0", "12.0", "8.0"] {
        source.push_chunk(vtg(speed));
    }

    let (mut intake, mut receiver) = init(source, &ReceiverConfig::default()).unwrap();
    for kind in [EventKind::SpeedRise, EventKind::SpeedFall] {
        let log = Arc::clone(&log);
        receiver
            .register_callback(kind, move |fix: &FixSnapshot, _| log.lock().unwrap().push((kind, fix.speed_kmph)), 10.0)
            .unwrap();
    }

    run_to_end(&mut intake, &mut receiver);

    assert_eq!(
        *log.lock().unwrap(),
        vec![(EventKind::SpeedRise, 12.0), (EventKind::SpeedFall, 8.0)]
    );
    assert_eq!(receiver.stats().events_fired, 2);
}

#[test]
fn test_lines_processed_in_one_pass_fire_per_sentence() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (mut intake, mut receiver) = init(SliceSource::new(), &ReceiverConfig::default()).unwrap();
    let delta_log = Arc::clone(&log);
    receiver
        .register_callback(EventKind::SpeedDelta, move |fix: &FixSnapshot, _| delta_log.lock().unwrap().push(fix.speed_kmph), 3.0)
        .unwrap();

    for speed in ["10.0", "11.0", "20.0", "15.0"] {
        intake.feed(&vtg(speed));
    }
    receiver.process();

    assert_eq!(*log.lock().unwrap(), vec![10.0, 20.0, 15.0]);
}

#[test]
fn test_overflow_drops_oldest_line() {
    let config = ReceiverConfig {
        intake_capacity: 64,
        ring_capacity: 128,
        ..Default::default()
    };
    let (mut intake, mut receiver) = init(SliceSource::new(), &config).unwrap();

    // Three GLL lines fill 123 of 128 bytes
    for _ in 0..3 {
        assert_eq!(intake.feed(GLL).status(), IntakeStatus::Ok);
    }
    let report = intake.feed(&vtg("42.0"));
    assert_eq!(report.status(), IntakeStatus::BufferOverflow);
    assert_eq!(report.push.discarded_lines, 1);

    assert_eq!(receiver.process(), ProcessStatus::Ok);
    assert_eq!(receiver.fix().latitude, 4916.45);
    assert_eq!(receiver.fix().speed_kmph, 42.0);

    let stats = receiver.stats();
    assert_eq!(stats.overflows, 1);
    assert_eq!(stats.lines_discarded, 1);
    assert_eq!(stats.sentences_decoded, 3);
}

#[test]
fn test_partial_line_waits_for_terminator() {
    let (mut intake, mut receiver) = init(SliceSource::new(), &ReceiverConfig::default()).unwrap();
    let (head, tail) = GLL.split_at(20);

    intake.feed(head);
    assert_eq!(receiver.process(), ProcessStatus::Ok);
    assert_eq!(receiver.stats().lines_processed, 0);

    intake.feed(tail);
    assert_eq!(receiver.process(), ProcessStatus::Ok);
    assert_eq!(receiver.fix().latitude, 4916.45);
    assert_eq!(receiver.fix().longitude_direction, Some('W'));
}

#[test]
fn test_gp_only_talker_filter() {
    let config = ReceiverConfig {
        accept_any_talker: false,
        ..Default::default()
    };
    let (mut intake, mut receiver) = init(SliceSource::new(), &config).unwrap();
    intake.feed(b"$GNGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*59\r\n");

    assert_eq!(receiver.process(), ProcessStatus::Ok);
    assert_eq!(receiver.fix(), FixSnapshot::default());
    assert_eq!(receiver.stats().sentences_ignored, 1);
}

#[tokio::test]
async fn test_subscriber_sees_new_fix() {
    let (mut intake, mut receiver) = init(SliceSource::new(), &ReceiverConfig::default()).unwrap();
    let mut updates = receiver.subscribe();

    intake.feed(GGA);
    receiver.process();

    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().sat_in_use, 8);

    // A pass that decodes nothing publishes nothing
    receiver.process();
    assert!(!updates.has_changed().unwrap());
}

#[test]
fn test_intake_and_processing_on_separate_threads() {
    const LINES: usize = 500;

    let mut stream = Vec::new();
    for i in 0..LINES {
        stream.extend_from_slice(&vtg(&format!("{}.0", i)));
    }

    let source = SliceSource::from_stream(&stream, 7);
    let config = ReceiverConfig {
        intake_capacity: 64,
        ring_capacity: 256,
        ..Default::default()
    };
    let (mut intake, mut receiver) = init(source, &config).unwrap();

    let producer = thread::spawn(move || {
        while !intake.is_exhausted() {
            intake.on_data_ready().unwrap();
            thread::yield_now();
        }
    });

    let mut last_speed = -1.0;
    loop {
        let done = producer.is_finished();
        let status = receiver.process();
        assert_ne!(status, ProcessStatus::ChecksumFailed);
        assert!(receiver.fix().speed_kmph >= last_speed);
        last_speed = receiver.fix().speed_kmph;
        if done && receiver.pending_lines() == 0 {
            break;
        }
        thread::yield_now();
    }
    producer.join().unwrap();
    receiver.process();

    let stats = receiver.stats();
    assert_eq!(stats.checksum_failures, 0);
    assert_eq!(stats.lines_truncated, 0);
    assert_eq!(stats.sentences_decoded + stats.lines_discarded, LINES as u64);
    assert_eq!(stats.bytes_received, stream.len() as u64);
}

proptest! {
    #[test]
    fn prop_transfer_size_does_not_change_result(chunk_len in 1usize..100, speeds in prop::collection::vec(0u32..300, 1..20)) {
        let mut stream = Vec::new();
        stream.extend_from_slice(GGA);
        for speed in &speeds {
            stream.extend_from_slice(&vtg(&format!("{}.5", speed)));
        }

        let source = SliceSource::from_stream(&stream, chunk_len);
        let (mut intake, mut receiver) = init(source, &ReceiverConfig::default()).unwrap();
        let statuses = run_to_end(&mut intake, &mut receiver);

        prop_assert!(statuses.iter().all(|s| *s == ProcessStatus::Ok));
        prop_assert_eq!(receiver.stats().sentences_decoded, speeds.len() as u64 + 1);
        prop_assert_eq!(receiver.fix().sat_in_use, 8);
        prop_assert_eq!(receiver.fix().speed_kmph, f64::from(*speeds.last().unwrap()) + 0.5);
    }
}
