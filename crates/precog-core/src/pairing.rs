//! # Pairing Module
//!
//! Turns a drained sample batch into Action1 -> Action2 transition records.
//!
//! - N samples yield exactly N-1 records, in input order
//! - Deltas are plain differences; negative values are emitted as-is
//! - Each record carries the side-events from the trailing window
//!   before its `action1`, in buffer order
//! - Side-events are only read, never consumed: the same chat line can
//!   enrich records in several batches

use crate::{EntityRef, Sample, SideEvent};

/// A pair of temporally adjacent samples plus derived context.
///
/// Borrowed from the drained batch and consumed immediately by the
/// encoder; it has no lifecycle of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRecord<'a> {
    pub session_id: &'a str,
    pub entity: &'a EntityRef,
    pub action1: &'a Sample,
    pub action2: &'a Sample,
    pub time_delta_ms: i64,
    pub tick_delta: i64,
    /// Empty when no side-event falls in the window; the encoder then
    /// omits the key entirely.
    pub recent_side_events: Vec<&'a SideEvent>,
}

/// Builds transition records with trailing-window enrichment.
#[derive(Debug, Clone, Copy)]
pub struct PairingEngine {
    window_ms: i64,
}

impl PairingEngine {
    #[must_use]
    pub const fn new(window_ms: i64) -> Self {
        Self { window_ms }
    }

    #[must_use]
    pub const fn window_ms(&self) -> i64 {
        self.window_ms
    }

    /// Pair adjacent samples.
    ///
    /// Fewer than two samples produce nothing.
    #[must_use]
    pub fn pair<'a>(
        &self,
        session_id: &'a str,
        entity: &'a EntityRef,
        samples: &'a [Sample],
        side_events: &'a [SideEvent],
    ) -> Vec<TransitionRecord<'a>> {
        samples
            .windows(2)
            .map(|pair| {
                let (action1, action2) = (&pair[0], &pair[1]);
                TransitionRecord {
                    session_id,
                    entity,
                    action1,
                    action2,
                    time_delta_ms: action2.timestamp.saturating_sub(action1.timestamp),
                    tick_delta: action2.tick.saturating_sub(action1.tick),
                    recent_side_events: self.recent_side_events(action1.timestamp, side_events),
                }
            })
            .collect()
    }

    /// Side-events at most `window_ms` before `timestamp`, bounds inclusive.
    ///
    /// Events after `timestamp` are excluded.
    #[must_use]
    pub fn recent_side_events<'a>(
        &self,
        timestamp: i64,
        side_events: &'a [SideEvent],
    ) -> Vec<&'a SideEvent> {
        side_events
            .iter()
            .filter(|event| {
                let age = timestamp.saturating_sub(event.timestamp);
                (0..=self.window_ms).contains(&age)
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
