//! Golden vector compatibility test for the v1 protocol.
//!
//! Golden vectors live in `crates/protocol/golden/*.jsonl` and are the source
//! of truth for the wire format. If this test fails, fix the types, not the
//! vectors.

use std::fs;
use std::path::PathBuf;

use griya_core::{City, Furnishing};
use griya_protocol::{ClientMessage, DisplayResult, ServerMessage, PROTOCOL_VERSION};
use griya_recon::{EncodingKind, SchemaVerdict};
use serde_json::Value;

fn golden_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden")
}

fn load_golden_lines(filename: &str) -> Vec<String> {
    let path = golden_dir().join(filename);
    let contents = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect()
}

/// Re-serializing must reproduce the vector field for field.
fn assert_round_trip<T: serde::Serialize + serde::de::DeserializeOwned>(line: &str) {
    let parsed: T = serde_json::from_str(line).unwrap_or_else(|e| panic!("{e}: {line}"));
    let original: Value = serde_json::from_str(line).unwrap();
    assert_eq!(serde_json::to_value(&parsed).unwrap(), original, "drift in {line}");
}

#[test]
fn test_hello_ok() {
    let lines = load_golden_lines("hello_ok.jsonl");
    assert_eq!(lines.len(), 2);

    match serde_json::from_str(&lines[0]).unwrap() {
        ClientMessage::Hello(hello) => {
            assert_eq!(hello.client, "griya-web");
            assert_eq!(hello.protocol_version, PROTOCOL_VERSION);
        }
        other => panic!("Expected Hello, got {other:?}"),
    }
    match serde_json::from_str(&lines[1]).unwrap() {
        ServerMessage::Welcome(welcome) => {
            assert!(welcome.capabilities.contains(&"submit".to_string()));
            assert!(welcome.model_fingerprint.starts_with("sha256:"));
        }
        other => panic!("Expected Welcome, got {other:?}"),
    }
}

#[test]
fn test_submit_ok() {
    let lines = load_golden_lines("submit_ok.jsonl");

    match serde_json::from_str(&lines[0]).unwrap() {
        ClientMessage::Submit(submit) => {
            assert_eq!(submit.record.city, City::JakartaSelatan);
            assert_eq!(submit.record.furnishing, Furnishing::SemiFurnished);
            assert!(!submit.record.has_extras());
        }
        other => panic!("Expected Submit, got {other:?}"),
    }
    match serde_json::from_str(&lines[1]).unwrap() {
        ServerMessage::Result(result) => {
            assert_eq!(result.id, "1");
            assert_eq!(
                result.result,
                DisplayResult::Ok { price: 2_270_000_000.0, display: "Rp 2,270,000,000.00".into() }
            );
        }
        other => panic!("Expected Result, got {other:?}"),
    }
}

#[test]
fn test_submit_full_profile() {
    let lines = load_golden_lines("submit_full_profile.jsonl");

    match serde_json::from_str(&lines[0]).unwrap() {
        ClientMessage::Submit(submit) => {
            assert_eq!(submit.record.carports, Some(2));
            assert_eq!(submit.record.building_age, Some(5));
            assert_eq!(submit.record.garages, Some(1));
        }
        other => panic!("Expected Submit, got {other:?}"),
    }
    match serde_json::from_str(&lines[1]).unwrap() {
        ServerMessage::Result(result) => assert!(!result.result.is_ok()),
        other => panic!("Expected Result, got {other:?}"),
    }
}

#[test]
fn test_schema() {
    let lines = load_golden_lines("schema.jsonl");
    assert!(matches!(serde_json::from_str(&lines[0]).unwrap(), ClientMessage::Schema(_)));

    match serde_json::from_str(&lines[1]).unwrap() {
        ServerMessage::SchemaResult(schema) => {
            assert_eq!(schema.expected_columns.map(|c| c.len()), Some(7));
            assert_eq!(schema.verdict, Some(SchemaVerdict::RawExpected));
            assert_eq!(schema.declared_encoding, None);
        }
        other => panic!("Expected SchemaResult, got {other:?}"),
    }
    match serde_json::from_str(&lines[2]).unwrap() {
        ServerMessage::SchemaResult(schema) => {
            assert!(schema.expected_columns.is_none());
            assert_eq!(schema.declared_encoding, Some(EncodingKind::OneHot));
        }
        other => panic!("Expected SchemaResult, got {other:?}"),
    }
}

#[test]
fn test_errors() {
    let lines = load_golden_lines("errors.jsonl");
    let codes: Vec<String> = lines[..3]
        .iter()
        .map(|line| match serde_json::from_str(line).unwrap() {
            ServerMessage::Error(e) => e.code,
            other => panic!("Expected Error, got {other:?}"),
        })
        .collect();
    assert_eq!(codes, ["parse_error", "message_too_large", "unsupported_version"]);
    assert!(matches!(serde_json::from_str(&lines[3]).unwrap(), ServerMessage::Pong(_)));
}

#[test]
fn test_server_vectors_do_not_drift() {
    for file in ["hello_ok.jsonl", "submit_ok.jsonl", "submit_full_profile.jsonl", "schema.jsonl", "errors.jsonl"] {
        for line in load_golden_lines(file) {
            let v: Value = serde_json::from_str(&line).unwrap();
            let ty = v["type"].as_str().unwrap_or_default();
            if matches!(ty, "hello" | "submit" | "schema" | "ping") {
                assert_round_trip::<ClientMessage>(&line);
            } else {
                assert_round_trip::<ServerMessage>(&line);
            }
        }
    }
}
