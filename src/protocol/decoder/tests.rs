use super::*;
use crate::protocol::{
    source::bytes,
    wire::{GESTURE_MARKER, X_MARKER, Z_MARKER},
};

fn decode(data: &[u8]) -> Vec<Sample> {
    decode_frame(&mut bytes(data)).expect("frame should decode")
}

#[test]
fn marker_payload_pairs_yield_one_sample_each_in_order() {
    let samples = decode(&[
        X_MARKER, 10, Z_MARKER, 20, GESTURE_MARKER, 3, X_MARKER, 249, EOF,
    ]);
    assert_eq!(
        samples,
        vec![
            Sample::X(10),
            Sample::Z(20),
            Sample::Gesture(3),
            Sample::X(249)
        ]
    );
}

#[test]
fn unmarked_bytes_are_discarded_as_noise() {
    let mut source = bytes(&[7, 99, X_MARKER, 42, 13, 0, EOF]);
    let mut reader = FrameReader::default();
    let frame = reader.read_frame(&mut source).unwrap();
    assert_eq!(frame.as_slice(), &[Sample::X(42)]);
    assert_eq!(reader.stats().noise, 4);
}

#[test]
fn eof_never_becomes_a_sample() {
    let mut decoder = FrameDecoder::new();
    assert!(decoder.push(X_MARKER).is_empty());
    let output = decoder.push(EOF);
    assert!(output.is_end_of_frame());
    assert_eq!(output.sample(), None);
    assert_eq!(
        output.fault(),
        Some(FrameFault::StreamTruncated {
            marker: X_MARKER,
            next: EOF
        })
    );
}

#[test]
fn marker_followed_by_marker_drops_partial_sample() {
    let samples = decode(&[X_MARKER, Z_MARKER, 55, EOF]);
    assert_eq!(samples, vec![Sample::Z(55)]);

    let mut reader = FrameReader::default();
    let _ = reader
        .read_frame(&mut bytes(&[X_MARKER, Z_MARKER, 55, EOF]))
        .unwrap();
    assert_eq!(reader.stats().truncated, 1);
}

#[test]
fn zero_after_marker_is_a_payload_not_idle() {
    assert_eq!(decode(&[Z_MARKER, 0, EOF]), vec![Sample::Z(0)]);
}

#[test]
fn out_of_range_payload_is_dropped() {
    assert_eq!(decode(&[X_MARKER, 0xFD, X_MARKER, 5, EOF]), vec![Sample::X(5)]);
}

#[test]
fn truncated_stream_reports_closed_connection() {
    let err = decode_frame(&mut bytes(&[X_MARKER, 10, Z_MARKER])).unwrap_err();
    assert!(matches!(err, DecodeError::ConnectionClosed(_)));
}

#[test]
fn overflow_clears_pending_samples_under_low_noise() {
    let mut reader = FrameReader::default();
    for _ in 0..301 {
        assert!(reader.push(X_MARKER).is_none());
        assert!(reader.push(10).is_none());
    }
    assert_eq!(reader.pending_len(), 301);

    assert!(reader.push(10).is_none());
    assert_eq!(reader.pending_len(), 0);
    assert_eq!(reader.stats().overflows, 1);
    assert_eq!(
        reader.take_fault(),
        Some(FrameFault::BufferOverflow { discarded: 301 })
    );

    let frame = reader.read_frame(&mut bytes(&[X_MARKER, 7, EOF])).unwrap();
    assert_eq!(frame.as_slice(), &[Sample::X(7)]);
}

#[test]
fn high_bytes_do_not_trigger_overflow() {
    let mut reader = FrameReader::default();
    for _ in 0..301 {
        let _ = reader.push(X_MARKER);
        let _ = reader.push(245);
    }
    assert_eq!(reader.pending_len(), 301);
    assert_eq!(reader.stats().overflows, 0);
}

#[test]
fn idle_bytes_between_frames_are_skipped() {
    let data = [0, 0, X_MARKER, 1, EOF, 0, Z_MARKER, 2, EOF];
    let mut source = bytes(&data);
    let mut reader = FrameReader::default();
    let frames: Vec<_> = reader
        .frames(&mut source)
        .take_while(Result::is_ok)
        .map(|frame| frame.unwrap().to_vec())
        .collect();
    assert_eq!(frames, vec![vec![Sample::X(1)], vec![Sample::Z(2)]]);
    assert_eq!(reader.stats().idle, 3);
    assert_eq!(reader.stats().frames, 2);
}

#[test]
fn gesture_scan_ignores_interleaved_noise() {
    let data = [
        X_MARKER, 90, 17, Z_MARKER, 40, GESTURE_MARKER, 2, X_MARKER, 91, 3, EOF,
    ];
    let mut reader = GestureCodeReader::new();
    assert_eq!(reader.read_code(&mut bytes(&data)).unwrap(), Some(2));
}

#[test]
fn gesture_scan_returns_none_when_frame_ends_first() {
    let data = [X_MARKER, 90, EOF, GESTURE_MARKER, 1, EOF];
    let mut source = bytes(&data);
    let mut reader = GestureCodeReader::new();
    assert_eq!(reader.read_code(&mut source).unwrap(), None);
    assert_eq!(reader.read_code(&mut source).unwrap(), Some(1));
}

#[test]
fn gesture_marker_followed_by_eof_is_not_code_zero() {
    let mut reader = GestureCodeReader::new();
    assert_eq!(
        reader.read_code(&mut bytes(&[GESTURE_MARKER, EOF])).unwrap(),
        None
    );
}

#[test]
fn gesture_codes_above_range_mean_no_gesture() {
    let mut reader = GestureCodeReader::new();
    assert_eq!(
        reader
            .read_code(&mut bytes(&[GESTURE_MARKER, 245, EOF]))
            .unwrap(),
        None
    );
}

#[test]
fn consecutive_gesture_frames_each_yield_their_code() {
    let data = [
        GESTURE_MARKER, 1, X_MARKER, 80, EOF, GESTURE_MARKER, 4, 33, EOF,
    ];
    let mut source = bytes(&data);
    let mut reader = GestureCodeReader::new();
    assert_eq!(reader.read_code(&mut source).unwrap(), Some(1));
    assert_eq!(reader.read_code(&mut source).unwrap(), Some(4));
}

#[test]
fn gesture_params_are_collected_until_reserved_byte() {
    let data = [X_MARKER, 60, GESTURE_MARKER, 3, 12, 200, X_MARKER, 61, EOF];
    let mut reader = GestureCodeReader::new();
    let report = reader
        .read_code_with_params(&mut bytes(&data))
        .unwrap()
        .expect("report");
    assert_eq!(report.code, 3);
    assert_eq!(report.params.as_slice(), &[12, 200]);
}

#[test]
fn gesture_params_after_answered_frame_skip_its_tail() {
    let data = [
        GESTURE_MARKER, 1, 9, X_MARKER, 5, EOF, GESTURE_MARKER, 2, EOF,
    ];
    let mut source = bytes(&data);
    let mut reader = GestureCodeReader::new();
    let first = reader.read_code_with_params(&mut source).unwrap().unwrap();
    assert_eq!(first.code, 1);
    assert_eq!(first.params.as_slice(), &[9]);
    let second = reader.read_code_with_params(&mut source).unwrap().unwrap();
    assert_eq!(second.code, 2);
    assert!(second.params.is_empty());
}

#[test]
fn gesture_params_reads_keep_frame_stats() {
    let data = [
        GESTURE_MARKER, X_MARKER, 7, EOF, GESTURE_MARKER, 3, 12, EOF,
    ];
    let mut source = bytes(&data);
    let mut reader = GestureCodeReader::new();
    assert_eq!(reader.read_code_with_params(&mut source).unwrap(), None);
    let report = reader.read_code_with_params(&mut source).unwrap().unwrap();
    assert_eq!(report.code, 3);
    assert_eq!(report.params.as_slice(), &[12]);

    let stats = reader.stats();
    assert_eq!(stats.frames, 2);
    assert_eq!(stats.truncated, 1);
    assert_eq!(stats.samples, 2);
}
