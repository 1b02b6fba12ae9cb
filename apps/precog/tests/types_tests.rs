//! Unit tests for API types serialization/deserialization.

#![allow(clippy::unwrap_used, clippy::panic)]

use precog::api::{
    ChatRequest, ErrorResponse, FlushResponse, HealthResponse, MAX_CHAT_MESSAGE_BYTES,
    StatusResponse,
};
use precog_core::{ChatOutcome, EntityId, FlushOutcome, PrecogError, SessionStats, TickReport};
use serde_json::json;

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let health: HealthResponse =
        serde_json::from_str(r#"{"status":"ok","version":"9.9.9"}"#).unwrap();
    assert_eq!(health.version, "9.9.9");
}

// =============================================================================
// STATUS RESPONSE TESTS
// =============================================================================

#[test]
fn test_status_response_shape() {
    let status = StatusResponse {
        session_id: "session_1".to_string(),
        output: "precognition_data/action_sequences.jsonl".to_string(),
        tick: 12,
        tracked_entities: 3,
        buffered_lines: 7,
        stats: SessionStats {
            samples_captured: 18,
            ..SessionStats::default()
        },
    };

    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["session_id"], "session_1");
    assert_eq!(value["tracked_entities"], 3);
    assert_eq!(value["stats"]["samples_captured"], 18);
    assert_eq!(value["stats"]["flush_failures"], 0);
}

// =============================================================================
// CHAT REQUEST TESTS
// =============================================================================

#[test]
fn test_chat_request_timestamp_optional() {
    let request: ChatRequest = serde_json::from_str(r#"{"message":"<Steve> hi"}"#).unwrap();
    let message = request.to_message().unwrap();
    assert_eq!(message.message, "<Steve> hi");
    assert_eq!(message.timestamp_ms, None);
}

#[test]
fn test_chat_request_size_limit() {
    let at_limit = ChatRequest {
        message: "a".repeat(MAX_CHAT_MESSAGE_BYTES),
        timestamp_ms: Some(1),
    };
    assert!(at_limit.to_message().is_ok());

    let over = ChatRequest {
        message: "a".repeat(MAX_CHAT_MESSAGE_BYTES + 1),
        timestamp_ms: None,
    };
    assert!(matches!(over.to_message(), Err(PrecogError::InvalidFrame(_))));
}

#[test]
fn test_chat_outcome_tagging() {
    let recorded = ChatOutcome::Recorded {
        entity: EntityId::new("uuid-steve"),
        sender: "Steve".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&recorded).unwrap(),
        json!({"outcome": "recorded", "entity": "uuid-steve", "sender": "Steve"})
    );
    assert_eq!(
        serde_json::to_value(ChatOutcome::Ignored).unwrap(),
        json!({"outcome": "ignored"})
    );
}

// =============================================================================
// TICK & FLUSH TESTS
// =============================================================================

#[test]
fn test_tick_report_omits_absent_flush() {
    let report = TickReport {
        tick: 4,
        processed: true,
        sampled: true,
        samples: 2,
        ..TickReport::default()
    };

    let value = serde_json::to_value(&report).unwrap();
    assert!(value.get("flush").is_none());
    assert_eq!(value["evicted"], json!([]));

    let with_flush = TickReport {
        flush: Some(FlushOutcome::Failed {
            error: "disk full".to_string(),
        }),
        ..report
    };
    let value = serde_json::to_value(&with_flush).unwrap();
    assert_eq!(value["flush"], json!({"status": "failed", "error": "disk full"}));
}

#[test]
fn test_flush_response_constructors() {
    let ok = FlushResponse::written(5);
    assert!(ok.success);
    assert_eq!(ok.buffered_lines, 0);
    assert!(!serde_json::to_string(&ok).unwrap().contains("error"));

    let failed = FlushResponse::failed(5, "Flush failed: denied");
    assert!(!failed.success);
    assert_eq!(failed.lines_written, 0);
    assert_eq!(failed.error.as_deref(), Some("Flush failed: denied"));
}

#[test]
fn test_error_response_serialization() {
    let json = serde_json::to_string(&ErrorResponse::new("bad")).unwrap();
    assert_eq!(json, r#"{"error":"bad"}"#);
}
