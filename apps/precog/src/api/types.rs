//! # API Request/Response Types
//!
//! JSON bodies of the ingest API. Tick frames and chat messages use the
//! core wire types directly; these cover everything else.

use precog_core::{ChatMessage, PrecogError, SessionStats};
use serde::{Deserialize, Serialize};

/// Maximum accepted chat message length in bytes.
pub const MAX_CHAT_MESSAGE_BYTES: usize = 4096;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Collector status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session_id: String,
    pub output: String,
    pub tick: u64,
    pub tracked_entities: usize,
    pub buffered_lines: usize,
    pub stats: SessionStats,
}

// =============================================================================
// CHAT REQUEST
// =============================================================================

/// Raw chat line as posted by the client mod.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
}

impl ChatRequest {
    /// Convert to a core chat message, rejecting oversized input.
    pub fn to_message(&self) -> Result<ChatMessage, PrecogError> {
        if self.message.len() > MAX_CHAT_MESSAGE_BYTES {
            return Err(PrecogError::InvalidFrame(format!(
                "chat message of {} bytes exceeds {} bytes",
                self.message.len(),
                MAX_CHAT_MESSAGE_BYTES
            )));
        }
        Ok(ChatMessage {
            message: self.message.clone(),
            timestamp_ms: self.timestamp_ms,
        })
    }
}

// =============================================================================
// FLUSH RESPONSE
// =============================================================================

/// Result of a forced flush.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushResponse {
    pub success: bool,
    pub lines_written: usize,
    /// Lines still waiting after the attempt.
    pub buffered_lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlushResponse {
    #[must_use]
    pub fn written(lines_written: usize) -> Self {
        Self {
            success: true,
            lines_written,
            buffered_lines: 0,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(buffered_lines: usize, error: impl Into<String>) -> Self {
        Self {
            success: false,
            lines_written: 0,
            buffered_lines,
            error: Some(error.into()),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of any non-2xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
