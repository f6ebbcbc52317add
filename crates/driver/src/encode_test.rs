//! Tests for the envelope encoding

use std::collections::HashMap;

use chrono::DateTime;
use logship_protocol::LogEntry;

use crate::{encode_entry, ContainerInfo, Envelope};

fn info() -> ContainerInfo {
    ContainerInfo {
        id: "c1".into(),
        name: "web".into(),
        image_name: "nginx:latest".into(),
        created: DateTime::from_timestamp(1_700_000_000, 123_456_789).expect("timestamp"),
        log_path: String::new(),
        config: HashMap::new(),
    }
}

fn entry(line: &[u8]) -> LogEntry {
    LogEntry {
        source: "stdout".into(),
        time_nano: 1_700_000_000_000_000_000,
        line: line.to_vec(),
        partial: false,
    }
}

// =============================================================================
// Envelope shape
// =============================================================================

#[test]
fn test_envelope_wire_shape() {
    let payload = encode_entry(&entry(b"hello\n"), &info()).expect("encode");

    let expected = concat!(
        r#"{"source":"stdout","message":"hello","#,
        r#""containerID":"c1","containerName":"web","#,
        r#""containerImageName":"nginx:latest","#,
        r#""containerCreated":"2023-11-14T22:13:20.123456789Z"}"#,
        "\n",
    );
    assert_eq!(payload, expected.as_bytes());
}

#[test]
fn test_envelope_is_valid_json_with_exact_field_names() {
    let payload = encode_entry(&entry(b"hello\n"), &info()).expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&payload).expect("json");

    let object = value.as_object().expect("object");
    let keys: Vec<_> = object.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "source",
            "message",
            "containerID",
            "containerName",
            "containerImageName",
            "containerCreated",
        ]
    );
}

#[test]
fn test_envelope_ends_with_single_newline() {
    let payload = encode_entry(&entry(b"hello"), &info()).expect("encode");

    assert_eq!(payload.last(), Some(&b'\n'));
    assert!(!payload[..payload.len() - 1].contains(&b'\n'));
}

#[test]
fn test_attr_and_err_are_emitted_when_present() {
    let attrs = HashMap::from([("env".to_string(), "prod".to_string())]);
    let container = info();
    let envelope = Envelope {
        source: "stderr",
        message: "boom",
        container_id: &container.id,
        container_name: &container.name,
        container_image_name: &container.image_name,
        container_created: &container.created,
        attr: Some(&attrs),
        err: Some("short read".into()),
    };

    let value = serde_json::to_value(&envelope).expect("json");
    assert_eq!(value["attr"]["env"], "prod");
    assert_eq!(value["err"], "short read");
}

// =============================================================================
// Message trimming
// =============================================================================

#[test]
fn test_message_is_trimmed_on_both_ends() {
    let payload = encode_entry(&entry(b"  hi  "), &info()).expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&payload).expect("json");

    assert_eq!(value["message"], "hi");
}

#[test]
fn test_trimming_covers_unicode_whitespace() {
    let payload = encode_entry(&entry("\u{2009}hi\u{00a0}\n".as_bytes()), &info()).expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&payload).expect("json");

    assert_eq!(value["message"], "hi");
}

#[test]
fn test_trimming_is_idempotent() {
    let once = encode_entry(&entry(b"  hi  \n"), &info()).expect("encode");
    let twice = encode_entry(&entry(b"hi"), &info()).expect("encode");

    assert_eq!(once, twice);
}

#[test]
fn test_empty_line_still_produces_an_envelope() {
    let payload = encode_entry(&entry(b""), &info()).expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&payload).expect("json");

    assert_eq!(value["message"], "");
}

#[test]
fn test_whitespace_only_line_becomes_empty_message() {
    let payload = encode_entry(&entry(b" \t \n"), &info()).expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&payload).expect("json");

    assert_eq!(value["message"], "");
}

#[test]
fn test_interior_whitespace_is_preserved() {
    let payload = encode_entry(&entry(b"GET /index.html 200\n"), &info()).expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&payload).expect("json");

    assert_eq!(value["message"], "GET /index.html 200");
}
