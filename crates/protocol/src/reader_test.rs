//! Tests for the frame decoder

use crate::{encode_frame, FrameError, FrameReader, LogEntry, MAX_FRAME_LEN};

fn entry(line: &[u8]) -> LogEntry {
    LogEntry {
        source: "stdout".into(),
        time_nano: 1_700_000_000_000_000_000,
        line: line.to_vec(),
        partial: false,
    }
}

// =============================================================================
// Decoding
// =============================================================================

#[tokio::test]
async fn test_decodes_a_stream_of_frames() {
    let mut stream = Vec::new();
    stream.extend_from_slice(&encode_frame(&entry(b"first\n")));
    stream.extend_from_slice(&encode_frame(&entry(b"second\n")));

    let mut reader = FrameReader::new(stream.as_slice());

    let first = reader.next_entry().await.expect("first frame");
    assert_eq!(first.expect("some").line, b"first\n");

    let second = reader.next_entry().await.expect("second frame");
    assert_eq!(second.expect("some").line, b"second\n");

    assert!(reader.next_entry().await.expect("eof").is_none());
}

#[tokio::test]
async fn test_decodes_all_fields() {
    let sent = LogEntry {
        source: "stderr".into(),
        time_nano: 42,
        line: b"boom".to_vec(),
        partial: true,
    };
    let stream = encode_frame(&sent);

    let mut reader = FrameReader::new(stream.as_slice());
    let got = reader.next_entry().await.expect("frame").expect("some");

    assert_eq!(got, sent);
}

#[tokio::test]
async fn test_zero_length_payload_decodes_to_default_entry() {
    let stream = 0u32.to_be_bytes().to_vec();

    let mut reader = FrameReader::new(stream.as_slice());
    let got = reader.next_entry().await.expect("frame").expect("some");

    assert_eq!(got, LogEntry::default());
}

#[tokio::test]
async fn test_empty_line_is_preserved() {
    let stream = encode_frame(&entry(b""));

    let mut reader = FrameReader::new(stream.as_slice());
    let got = reader.next_entry().await.expect("frame").expect("some");

    assert!(got.line.is_empty());
    assert_eq!(got.source, "stdout");
}

// =============================================================================
// EOF handling
// =============================================================================

#[tokio::test]
async fn test_empty_stream_is_eof() {
    let mut reader = FrameReader::new(&b""[..]);
    assert!(reader.next_entry().await.expect("eof").is_none());
}

#[tokio::test]
async fn test_partial_length_prefix_is_eof() {
    let mut reader = FrameReader::new(&[0u8, 0][..]);
    assert!(reader.next_entry().await.expect("eof").is_none());
}

#[tokio::test]
async fn test_truncated_payload_is_eof() {
    let mut stream = 100u32.to_be_bytes().to_vec();
    stream.extend_from_slice(b"short");

    let mut reader = FrameReader::new(stream.as_slice());
    assert!(reader.next_entry().await.expect("eof").is_none());
}

// =============================================================================
// Frame size limit
// =============================================================================

/// Build an entry whose encoded payload is exactly `payload_len` bytes.
fn entry_with_payload_len(payload_len: usize) -> LogEntry {
    let mut probe = entry(&vec![b'a'; payload_len - 64]);
    let encoded = encode_frame(&probe).len() - 4;
    let line_len = probe.line.len() + (payload_len - encoded);
    probe.line = vec![b'a'; line_len];
    assert_eq!(encode_frame(&probe).len() - 4, payload_len);
    probe
}

#[tokio::test]
async fn test_payload_of_exactly_max_len_is_accepted() {
    let stream = encode_frame(&entry_with_payload_len(MAX_FRAME_LEN));

    let mut reader = FrameReader::new(stream.as_slice());
    let got = reader.next_entry().await.expect("frame").expect("some");

    assert_eq!(got.source, "stdout");
}

#[tokio::test]
async fn test_oversized_frame_is_skipped_and_next_frame_decodes() {
    let oversized = MAX_FRAME_LEN + 1;
    let mut stream = (oversized as u32).to_be_bytes().to_vec();
    stream.extend_from_slice(&vec![0u8; oversized]);
    stream.extend_from_slice(&encode_frame(&entry(b"after\n")));

    let mut reader = FrameReader::new(stream.as_slice());

    let err = reader.next_entry().await.expect_err("oversized");
    assert!(matches!(err, FrameError::Oversized { len } if len == oversized));

    let got = reader.next_entry().await.expect("next frame").expect("some");
    assert_eq!(got.line, b"after\n");
}

#[tokio::test]
async fn test_oversized_frame_truncated_by_eof() {
    let mut stream = (2 * MAX_FRAME_LEN as u32).to_be_bytes().to_vec();
    stream.extend_from_slice(&[0u8; 128]);

    let mut reader = FrameReader::new(stream.as_slice());

    let err = reader.next_entry().await.expect_err("oversized");
    assert!(matches!(err, FrameError::Oversized { .. }));
    assert!(reader.next_entry().await.expect("eof").is_none());
}

// =============================================================================
// Malformed payloads
// =============================================================================

#[tokio::test]
async fn test_malformed_payload_is_consumed_and_next_frame_decodes() {
    // 0xff opens a field with wire type 7, which does not exist.
    let garbage = [0xffu8; 8];
    let mut stream = (garbage.len() as u32).to_be_bytes().to_vec();
    stream.extend_from_slice(&garbage);
    stream.extend_from_slice(&encode_frame(&entry(b"after\n")));

    let mut reader = FrameReader::new(stream.as_slice());

    let err = reader.next_entry().await.expect_err("malformed");
    assert!(matches!(err, FrameError::Decode(_)));

    let got = reader.next_entry().await.expect("next frame").expect("some");
    assert_eq!(got.line, b"after\n");
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_encode_frame_prefixes_payload_length() {
    let frame = encode_frame(&entry(b"hello\n"));
    let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;

    assert_eq!(len, frame.len() - 4);
}
