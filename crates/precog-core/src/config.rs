//! # Collector Configuration
//!
//! Tunables for a [`Session`](crate::session::Session). Defaults equal
//! the constants in [`primitives`](crate::primitives); the binary loads
//! overrides from a TOML file.

use crate::PrecogError;
use crate::primitives::{
    CHAT_CONTEXT_WINDOW_MS, CHAT_WINDOW, DEFAULT_DATA_DIR, DEFAULT_OUTPUT_FILE, FLUSH_THRESHOLD,
    SEQUENCE_WINDOW, SESSION_PREFIX, TICK_INTERVAL, WRITE_TRIGGER,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration of one collector session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectorConfig {
    /// Directory holding the output file. Created if absent.
    pub data_dir: PathBuf,
    /// Output file name inside `data_dir`.
    pub output_file: String,
    /// Prefix of the generated session id.
    pub session_prefix: String,
    /// Host ticks between samples.
    pub tick_interval: u64,
    /// Samples kept per entity.
    pub sequence_window: usize,
    /// Chat side-events kept per entity.
    pub chat_window: usize,
    /// Samples since last drain that fire a pairing batch.
    pub write_trigger: u32,
    /// Chat enrichment window before `action1`, in milliseconds.
    pub chat_context_ms: i64,
    /// Buffered lines that make a flush due.
    pub flush_threshold: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            session_prefix: SESSION_PREFIX.to_string(),
            tick_interval: TICK_INTERVAL,
            sequence_window: SEQUENCE_WINDOW,
            chat_window: CHAT_WINDOW,
            write_trigger: WRITE_TRIGGER,
            chat_context_ms: CHAT_CONTEXT_WINDOW_MS,
            flush_threshold: FLUSH_THRESHOLD,
        }
    }
}

impl CollectorConfig {
    /// Full path of the output file.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(&self.output_file)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), PrecogError> {
        if self.output_file.trim().is_empty() {
            return Err(PrecogError::InvalidConfig(
                "output_file must not be empty".to_string(),
            ));
        }
        if self.tick_interval == 0 {
            return Err(PrecogError::InvalidConfig(
                "tick_interval must be at least 1".to_string(),
            ));
        }
        if self.sequence_window < 2 {
            return Err(PrecogError::InvalidConfig(format!(
                "sequence_window {} cannot hold a pair of samples",
                self.sequence_window
            )));
        }
        if self.chat_window == 0 {
            return Err(PrecogError::InvalidConfig(
                "chat_window must be at least 1".to_string(),
            ));
        }
        if self.write_trigger == 0 {
            return Err(PrecogError::InvalidConfig(
                "write_trigger must be at least 1".to_string(),
            ));
        }
        if self.chat_context_ms < 0 {
            return Err(PrecogError::InvalidConfig(format!(
                "chat_context_ms {} is negative",
                self.chat_context_ms
            )));
        }
        if self.flush_threshold == 0 {
            return Err(PrecogError::InvalidConfig(
                "flush_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
