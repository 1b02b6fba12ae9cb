//! # Innate Primitives
//!
//! Hardcoded defaults for the Precog sequencing core.
//!
//! Every value here is the default of the matching [`CollectorConfig`]
//! field; the session reads the config, never these constants directly.
//!
//! ## Cadence
//!
//! The host simulation runs at 20 ticks per second. Sampling every
//! `TICK_INTERVAL` ticks gives a 10 Hz capture rate, so a
//! `WRITE_TRIGGER` of 50 samples emits one batch roughly every 5 seconds.
//!
//! [`CollectorConfig`]: crate::config::CollectorConfig

/// Host ticks between two samples of the same entity.
pub const TICK_INTERVAL: u64 = 2;

/// Maximum number of samples retained per entity (FIFO eviction).
pub const SEQUENCE_WINDOW: usize = 100;

/// Maximum number of chat side-events retained per entity (FIFO eviction).
pub const CHAT_WINDOW: usize = 20;

/// Samples recorded since the last drain before a batch is paired.
pub const WRITE_TRIGGER: u32 = 50;

/// Trailing window (ms) before `action1` in which chat enriches a record.
///
/// Inclusive on both ends: a message exactly this old still qualifies.
pub const CHAT_CONTEXT_WINDOW_MS: i64 = 5000;

/// Buffered output lines that make a flush due.
pub const FLUSH_THRESHOLD: usize = 50;

/// Colon-style chat prefixes must be strictly shorter than this, counted
/// in UTF-16 code units as the game client measures names.
pub const MAX_SENDER_NAME_LEN: usize = 16;

/// Prefix of the per-process session id (`session_<epoch seconds>`).
pub const SESSION_PREFIX: &str = "session_";

/// Directory the output file lives in, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "precognition_data";

/// Output file name inside [`DEFAULT_DATA_DIR`].
pub const DEFAULT_OUTPUT_FILE: &str = "action_sequences.jsonl";

/// Namespace stripped from item, biome, dimension and block identifiers.
pub const DEFAULT_NAMESPACE: &str = "minecraft:";

/// Sentinel for "no nearby player" in distance and angle fields.
pub const NO_PLAYER_SENTINEL: f64 = -1.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_rate_is_ten_hertz() {
        // 20 host ticks per second
        assert_eq!(20 / TICK_INTERVAL, 10);
    }

    #[test]
    fn trigger_fits_inside_window() {
        assert!((WRITE_TRIGGER as usize) <= SEQUENCE_WINDOW);
    }
}
