//! Griya Prediction Server Protocol (v1 Wire Format)
//!
//! Canonical message types shared by `griya serve` and its clients.
//! The wire format is JSONL (newline-delimited JSON) over TCP localhost.
//!
//! # Protocol Version
//!
//! This is **protocol v1**. Changes require:
//! 1. Version bump in PROTOCOL_VERSION
//! 2. New golden vectors in `crates/protocol/golden/`
//! 3. Backward compatibility handling
//!
//! # Usage
//!
//! ```ignore
//! use griya_protocol::{ClientMessage, ServerMessage, PingMessage};
//!
//! let msg = ClientMessage::Ping(PingMessage { id: "1".into() });
//! let json = serde_json::to_string(&msg)?;
//!
//! let response: ServerMessage = serde_json::from_str(&line)?;
//! ```

use griya_core::PropertyRecord;
use griya_recon::{EncodingKind, SchemaVerdict};
use serde::{Deserialize, Serialize};

/// Current protocol version. Increment for breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// =============================================================================
// Client → Server Messages
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Hello(HelloMessage),
    Submit(SubmitMessage),
    Schema(SchemaMessage),
    Ping(PingMessage),
}

/// Optional handshake. Clients may submit without one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    pub id: String,
    #[serde(default)]
    pub client: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u32,
}

fn default_protocol_version() -> u32 {
    1
}

/// One form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMessage {
    pub id: String,
    pub record: PropertyRecord,
}

/// Ask what the loaded model expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaMessage {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingMessage {
    pub id: String,
}

impl ClientMessage {
    pub fn id(&self) -> &str {
        match self {
            Self::Hello(m) => &m.id,
            Self::Submit(m) => &m.id,
            Self::Schema(m) => &m.id,
            Self::Ping(m) => &m.id,
        }
    }
}

// =============================================================================
// Server → Client Messages
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome(WelcomeMessage),
    Result(ResultMessage),
    SchemaResult(SchemaResultMessage),
    Pong(PongMessage),
    Error(ErrorMessage),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    pub id: String,
    pub protocol_version: u32,
    /// Fingerprint of the model every submission is scored against.
    pub model_fingerprint: String,
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMessage {
    pub id: String,
    pub result: DisplayResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaResultMessage {
    pub id: String,
    /// `None` when the model records no input columns.
    pub expected_columns: Option<Vec<String>>,
    pub verdict: Option<SchemaVerdict>,
    pub declared_encoding: Option<EncodingKind>,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    pub id: String,
}

/// Protocol-level failure. Prediction failures travel inside `ResultMessage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub id: String,
    pub code: String,
    pub message: String,
}

/// Error codes carried by `ErrorMessage::code`.
pub mod error_codes {
    pub const PARSE_ERROR: &str = "parse_error";
    pub const MESSAGE_TOO_LARGE: &str = "message_too_large";
    pub const UNSUPPORTED_VERSION: &str = "unsupported_version";
    pub const TOO_MANY_CONNECTIONS: &str = "too_many_connections";
}

// =============================================================================
// Display result
// =============================================================================

/// What the form shows after a submission: a formatted price or a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DisplayResult {
    Ok { price: f64, display: String },
    Error { message: String },
}

impl DisplayResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_client_message_exposes_its_id() {
        for line in [
            r#"{"type":"hello","id":"h"}"#,
            r#"{"type":"schema","id":"s"}"#,
            r#"{"type":"ping","id":"p"}"#,
        ] {
            let msg: ClientMessage = serde_json::from_str(line).unwrap();
            assert_eq!(msg.id(), &line[line.len() - 3..line.len() - 2]);
        }
    }

    #[test]
    fn submit_carries_record_fields_inline() {
        let line = r#"{"type":"submit","id":"7","record":{"bedrooms":3,"bathrooms":2,"land_size_m2":100,"building_size_m2":90,"floors":2,"city":"Bekasi","furnishing":"unfurnished"}}"#;
        let msg: ClientMessage = serde_json::from_str(line).unwrap();
        match msg {
            ClientMessage::Submit(s) => {
                assert_eq!(s.id, "7");
                assert_eq!(s.record, PropertyRecord::default());
            }
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[test]
    fn hello_defaults_protocol_version() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"hello","id":"h"}"#).unwrap();
        match msg {
            ClientMessage::Hello(h) => assert_eq!(h.protocol_version, PROTOCOL_VERSION),
            other => panic!("expected hello, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"train","id":"1"}"#).is_err());
    }

    #[test]
    fn display_result_is_status_tagged() {
        let ok = DisplayResult::Ok { price: 1.5e9, display: "Rp 1,500,000,000.00".into() };
        assert_eq!(
            serde_json::to_value(ServerMessage::Result(ResultMessage { id: "1".into(), result: ok })).unwrap(),
            json!({
                "type": "result",
                "id": "1",
                "result": { "status": "ok", "price": 1.5e9, "display": "Rp 1,500,000,000.00" }
            })
        );
        assert_eq!(
            serde_json::to_value(DisplayResult::error("boom")).unwrap(),
            json!({ "status": "error", "message": "boom" })
        );
    }

    #[test]
    fn schema_result_serializes_verdict_snake_case() {
        let msg = ServerMessage::SchemaResult(SchemaResultMessage {
            id: "s".into(),
            expected_columns: Some(vec!["bedrooms".into()]),
            verdict: Some(SchemaVerdict::RawExpected),
            declared_encoding: Some(EncodingKind::OneHot),
            fingerprint: "sha256:00".into(),
        });
        let v = serde_json::to_value(msg).unwrap();
        assert_eq!(v["verdict"], "raw_expected");
        assert_eq!(v["declared_encoding"], "one_hot");
    }
}
