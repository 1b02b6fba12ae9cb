//! # Session Module
//!
//! The tick driver: one `Session` per collector process.
//!
//! Each host tick:
//! 1. Skip entirely when no world is loaded or the game is paused
//! 2. Advance the tick counter
//! 3. Every `tick_interval` ticks, sample each observed entity; when an
//!    entity's trigger fires, pair its window and buffer the lines
//! 4. Evict entities missing from the current population
//! 5. Flush when the output buffer reached its threshold
//!
//! Chat arrives out of band through [`Session::on_chat`]. Chat without its
//! own timestamp takes the last frame's, so side-events and samples share
//! one timebase. Chat arriving while the last frame was inactive is ignored.
//!
//! ## Failure Containment
//!
//! Neither path returns an error. A failed capture skips one entity, a
//! failed encode skips one record, a failed flush keeps its lines for
//! the next attempt. All of it is logged and counted in [`SessionStats`].

use crate::chat::parse_chat;
use crate::clock::{Clock, SystemClock};
use crate::config::CollectorConfig;
use crate::encoding::encode_record;
use crate::frame::ChatMessage;
use crate::output::{FileSink, LineSink, OutputBuffer};
use crate::pairing::PairingEngine;
use crate::sequence::SequenceStore;
use crate::{EntityId, PrecogError, Sample, SideEvent, WorldView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// REPORTS
// =============================================================================

/// Running counters for the whole session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub ticks_seen: u64,
    pub active_ticks: u64,
    pub samples_captured: u64,
    pub capture_failures: u64,
    pub triggers_fired: u64,
    pub records_emitted: u64,
    pub encode_failures: u64,
    pub entities_evicted: u64,
    pub flushes: u64,
    pub flush_failures: u64,
    pub lines_flushed: u64,
    pub chat_recorded: u64,
    pub chat_untracked: u64,
    pub chat_ignored: u64,
}

/// Result of a flush attempt made by a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlushOutcome {
    Written { lines: usize },
    Failed { error: String },
}

/// What one call to [`Session::on_tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Session tick after this call.
    pub tick: u64,
    /// False when the host was inactive or paused.
    pub processed: bool,
    /// Whether this tick was a sampling tick.
    pub sampled: bool,
    pub samples: usize,
    pub capture_failures: usize,
    pub triggers: usize,
    pub records: usize,
    pub evicted: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush: Option<FlushOutcome>,
}

/// What happened to a chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChatOutcome {
    /// Attached to a tracked entity's side-event buffer.
    Recorded { entity: EntityId, sender: String },
    /// Sender parsed but not tracked; dropped.
    Untracked { sender: String },
    /// No sender could be identified, or no world is loaded; dropped.
    Ignored,
}

// =============================================================================
// SESSION
// =============================================================================

/// A collector session: sequence store, output buffer and sink.
pub struct Session {
    session_id: String,
    config: CollectorConfig,
    tick: u64,
    /// Host timestamp of the last active frame, if it carried one.
    last_frame_ms: Option<i64>,
    host_inactive: bool,
    sequences: SequenceStore,
    pairing: PairingEngine,
    output: OutputBuffer,
    sink: Box<dyn LineSink>,
    clock: Box<dyn Clock>,
    stats: SessionStats,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("tick", &self.tick)
            .field("tracked", &self.sequences.len())
            .field("buffered", &self.output.len())
            .field("sink", &self.sink.describe())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session writing to the configured output file.
    ///
    /// The output directory is created if absent; failure to do so is
    /// logged and the session starts anyway.
    pub fn new(config: CollectorConfig) -> Result<Self, PrecogError> {
        let sink = FileSink::new(config.output_path());
        Self::with_parts(config, Box::new(sink), Box::new(SystemClock))
    }

    /// Create a session with an explicit sink and clock.
    pub fn with_parts(
        config: CollectorConfig,
        sink: Box<dyn LineSink>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, PrecogError> {
        config.validate()?;
        let session_id = format!("{}{}", config.session_prefix, clock.now_secs());

        tracing::info!(
            session = %session_id,
            output = %sink.describe(),
            "Collector session started"
        );

        Ok(Self {
            session_id,
            tick: 0,
            last_frame_ms: None,
            host_inactive: false,
            sequences: SequenceStore::new(
                config.sequence_window,
                config.chat_window,
                config.write_trigger,
            ),
            pairing: PairingEngine::new(config.chat_context_ms),
            output: OutputBuffer::new(config.flush_threshold),
            sink,
            clock,
            stats: SessionStats::default(),
            config,
        })
    }

    // =========================================================================
    // TICK PATH
    // =========================================================================

    /// Process one host tick.
    pub fn on_tick(&mut self, view: &dyn WorldView) -> TickReport {
        self.stats.ticks_seen += 1;
        self.host_inactive = !view.is_active();

        if !view.is_active() || view.is_paused() {
            return TickReport {
                tick: self.tick,
                ..TickReport::default()
            };
        }

        self.tick += 1;
        self.stats.active_ticks += 1;
        self.last_frame_ms = view.timestamp_ms();

        let mut report = TickReport {
            tick: self.tick,
            processed: true,
            sampled: self.tick % self.config.tick_interval == 0,
            ..TickReport::default()
        };

        let population = view.population();

        if report.sampled {
            let timestamp = self.last_frame_ms.unwrap_or_else(|| self.clock.now_ms());
            let tick = tick_value(self.tick);

            for entity in &population {
                let snapshot = match view.capture(entity) {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        tracing::warn!(entity = %entity.id, error = %e, "Capture failed");
                        report.capture_failures += 1;
                        self.stats.capture_failures += 1;
                        continue;
                    }
                };

                self.sequences
                    .record(entity, Sample::new(timestamp, tick, snapshot));
                report.samples += 1;
                self.stats.samples_captured += 1;

                if self.sequences.should_trigger(&entity.id) {
                    report.triggers += 1;
                    self.stats.triggers_fired += 1;
                    report.records += self.emit_batch(&entity.id);
                }
            }
        }

        let current: BTreeSet<EntityId> = population.into_iter().map(|entity| entity.id).collect();
        report.evicted = self.sequences.evict_stale(&current);
        if !report.evicted.is_empty() {
            tracing::debug!(count = report.evicted.len(), "Evicted stale entities");
            self.stats.entities_evicted += report.evicted.len() as u64;
        }

        if self.output.should_flush() {
            report.flush = Some(match self.flush() {
                Ok(lines) => FlushOutcome::Written { lines },
                Err(e) => FlushOutcome::Failed {
                    error: e.to_string(),
                },
            });
        }

        report
    }

    /// Drain one entity, pair its window and buffer the encoded lines.
    ///
    /// Returns the number of lines buffered.
    fn emit_batch(&mut self, id: &EntityId) -> usize {
        let Some(batch) = self.sequences.drain_for_pairing(id) else {
            return 0;
        };

        let records = self.pairing.pair(
            &self.session_id,
            &batch.entity,
            &batch.samples,
            &batch.side_events,
        );

        let mut emitted = 0;
        for record in &records {
            match encode_record(record) {
                Ok(line) => {
                    self.output.append(line);
                    emitted += 1;
                }
                Err(e) => {
                    tracing::warn!(entity = %id, error = %e, "Dropping unencodable record");
                    self.stats.encode_failures += 1;
                }
            }
        }

        tracing::debug!(entity = %id, samples = batch.samples.len(), records = emitted, "Paired batch");
        self.stats.records_emitted += emitted as u64;
        emitted
    }

    // =========================================================================
    // CHAT PATH
    // =========================================================================

    /// Attribute a raw chat line to a tracked entity.
    pub fn on_chat(&mut self, message: &ChatMessage) -> ChatOutcome {
        if self.host_inactive {
            self.stats.chat_ignored += 1;
            return ChatOutcome::Ignored;
        }

        let Some(parsed) = parse_chat(&message.message) else {
            self.stats.chat_ignored += 1;
            return ChatOutcome::Ignored;
        };

        let Some(sequence) = self.sequences.find_by_name(&parsed.sender) else {
            self.stats.chat_untracked += 1;
            return ChatOutcome::Untracked {
                sender: parsed.sender,
            };
        };

        let id = sequence.entity().id.clone();
        let event = SideEvent {
            timestamp: message
                .timestamp_ms
                .or(self.last_frame_ms)
                .unwrap_or_else(|| self.clock.now_ms()),
            tick: tick_value(self.tick),
            origin_name: parsed.sender.clone(),
            origin_id: Some(id.clone()),
            content: parsed.content,
            origin_position: sequence.latest_sample().map(|s| s.snapshot.position),
        };

        self.sequences.record_side_event(&id, event);
        self.stats.chat_recorded += 1;
        ChatOutcome::Recorded {
            entity: id,
            sender: parsed.sender,
        }
    }

    // =========================================================================
    // OUTPUT
    // =========================================================================

    /// Write all buffered lines to the sink.
    ///
    /// On failure the lines stay buffered for the next attempt.
    pub fn flush(&mut self) -> Result<usize, PrecogError> {
        if self.output.is_empty() {
            return Ok(0);
        }

        match self.output.flush(self.sink.as_mut()) {
            Ok(lines) => {
                tracing::info!(lines, "Wrote {} action sequences", lines);
                self.stats.flushes += 1;
                self.stats.lines_flushed += lines as u64;
                Ok(lines)
            }
            Err(e) => {
                tracing::warn!(
                    buffered = self.output.len(),
                    error = %e,
                    "Failed to write data, keeping lines for retry"
                );
                self.stats.flush_failures += 1;
                Err(e)
            }
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn sequences(&self) -> &SequenceStore {
        &self.sequences
    }

    pub fn buffered_lines(&self) -> &[String] {
        self.output.lines()
    }

    pub fn sink_description(&self) -> String {
        self.sink.describe()
    }
}

fn tick_value(tick: u64) -> i64 {
    i64::try_from(tick).unwrap_or(i64::MAX)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::frame::{FrameEntity, TickFrame};
    use crate::output::MemorySink;
    use crate::{EntityRef, Snapshot};

    fn session_with(config: CollectorConfig) -> (Session, MemorySink, ManualClock) {
        let sink = MemorySink::new();
        let clock = ManualClock::starting_at(1_700_000_000_000);
        let session = Session::with_parts(config, Box::new(sink.clone()), Box::new(clock.clone()))
            .expect("session");
        (session, sink, clock)
    }

    fn frame(names: &[&str]) -> TickFrame {
        TickFrame::active(
            names
                .iter()
                .map(|name| FrameEntity {
                    id: EntityId::new(format!("uuid-{}", name.to_lowercase())),
                    name: (*name).to_string(),
                    snapshot: Snapshot::default(),
                })
                .collect(),
        )
    }

    #[test]
    fn session_id_uses_prefix_and_epoch_seconds() {
        let (session, _, _) = session_with(CollectorConfig::default());
        assert_eq!(session.session_id(), "session_1700000000");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = CollectorConfig {
            write_trigger: 0,
            ..CollectorConfig::default()
        };
        let result = Session::with_parts(
            config,
            Box::new(MemorySink::new()),
            Box::new(ManualClock::default()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn paused_or_inactive_ticks_are_skipped() {
        let (mut session, _, _) = session_with(CollectorConfig::default());

        let mut paused = frame(&["Steve"]);
        paused.paused = true;
        let report = session.on_tick(&paused);
        assert!(!report.processed);

        let mut inactive = frame(&["Steve"]);
        inactive.active = false;
        session.on_tick(&inactive);

        assert_eq!(session.tick(), 0);
        assert_eq!(session.stats().ticks_seen, 2);
        assert!(session.sequences().is_empty());
    }

    #[test]
    fn samples_every_interval() {
        let (mut session, _, _) = session_with(CollectorConfig::default());
        let steve = frame(&["Steve"]);

        let first = session.on_tick(&steve);
        let second = session.on_tick(&steve);

        assert!(!first.sampled);
        assert!(second.sampled);
        assert_eq!(second.samples, 1);
        let sequence = session
            .sequences()
            .get(&EntityId::new("uuid-steve"))
            .expect("tracked");
        assert_eq!(sequence.latest_sample().map(|s| s.tick), Some(2));
    }

    #[test]
    fn trigger_emits_window_minus_one_lines() {
        let (mut session, sink, clock) = session_with(CollectorConfig {
            flush_threshold: 1_000,
            ..CollectorConfig::default()
        });
        let steve = frame(&["Steve"]);

        let mut records = 0;
        for _ in 0..100 {
            clock.advance(50);
            records += session.on_tick(&steve).records;
        }

        // 50 samples, one trigger
        assert_eq!(session.stats().triggers_fired, 1);
        assert_eq!(records, 49);
        assert_eq!(session.buffered_lines().len(), 49);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn flush_happens_when_threshold_reached() {
        let (mut session, sink, _) = session_with(CollectorConfig::default());
        let steve = frame(&["Steve"]);

        let mut flushes = Vec::new();
        for _ in 0..100 {
            if let Some(flush) = session.on_tick(&steve).flush {
                flushes.push(flush);
            }
        }

        // 49 lines stay below the default threshold of 50
        assert!(flushes.is_empty());
        assert_eq!(session.flush().expect("manual flush"), 49);
        assert_eq!(sink.lines().len(), 49);
        assert!(session.buffered_lines().is_empty());
    }

    #[test]
    fn failed_flush_keeps_lines_and_reports() {
        let (mut session, sink, _) = session_with(CollectorConfig {
            write_trigger: 3,
            flush_threshold: 2,
            ..CollectorConfig::default()
        });
        sink.set_failing(true);
        let steve = frame(&["Steve"]);

        let mut last = TickReport::default();
        for _ in 0..6 {
            last = session.on_tick(&steve);
        }

        assert!(matches!(last.flush, Some(FlushOutcome::Failed { .. })));
        assert_eq!(session.buffered_lines().len(), 2);
        assert_eq!(session.stats().flush_failures, 1);

        sink.set_failing(false);
        assert_eq!(session.flush().expect("retry"), 2);
        assert_eq!(sink.lines().len(), 2);
    }

    #[test]
    fn departed_entities_are_evicted() {
        let (mut session, _, _) = session_with(CollectorConfig::default());

        session.on_tick(&frame(&["Steve", "Alex"]));
        session.on_tick(&frame(&["Steve", "Alex"]));
        assert_eq!(session.sequences().len(), 2);

        let report = session.on_tick(&frame(&["Alex"]));
        assert_eq!(report.evicted, vec![EntityId::new("uuid-steve")]);
        assert_eq!(session.sequences().len(), 1);

        session.on_tick(&frame(&[]));
        assert!(session.sequences().is_empty());
    }

    #[test]
    fn chat_is_attributed_to_tracked_sender() {
        let (mut session, _, _) = session_with(CollectorConfig::default());
        session.on_tick(&frame(&["Steve"]));
        session.on_tick(&frame(&["Steve"]));

        let outcome = session.on_chat(&ChatMessage::new("<steve> anyone got iron?"));
        assert_eq!(
            outcome,
            ChatOutcome::Recorded {
                entity: EntityId::new("uuid-steve"),
                sender: "steve".to_string(),
            }
        );

        let sequence = session
            .sequences()
            .get(&EntityId::new("uuid-steve"))
            .expect("tracked");
        let event = sequence.side_events().next().expect("event");
        assert_eq!(event.content, "anyone got iron?");
        assert_eq!(event.tick, 2);
        assert!(event.origin_position.is_some());
    }

    #[test]
    fn chat_from_unknown_or_unparseable_sender_is_dropped() {
        let (mut session, _, _) = session_with(CollectorConfig::default());
        session.on_tick(&frame(&["Steve"]));

        assert_eq!(
            session.on_chat(&ChatMessage::new("<Herobrine> boo")),
            ChatOutcome::Untracked {
                sender: "Herobrine".to_string()
            }
        );
        assert_eq!(
            session.on_chat(&ChatMessage::new("Steve joined the game")),
            ChatOutcome::Ignored
        );
        assert_eq!(session.stats().chat_untracked, 1);
        assert_eq!(session.stats().chat_ignored, 1);
    }

    #[test]
    fn capture_failure_skips_only_that_entity() {
        struct Flaky;

        impl WorldView for Flaky {
            fn is_active(&self) -> bool {
                true
            }
            fn is_paused(&self) -> bool {
                false
            }
            fn population(&self) -> Vec<EntityRef> {
                vec![EntityRef::new("ok", "Ok"), EntityRef::new("bad", "Bad")]
            }
            fn capture(&self, entity: &EntityRef) -> Result<Snapshot, PrecogError> {
                if entity.id.as_str() == "bad" {
                    Err(PrecogError::UnknownEntity(entity.id.clone()))
                } else {
                    Ok(Snapshot::default())
                }
            }
        }

        let (mut session, _, _) = session_with(CollectorConfig::default());
        session.on_tick(&Flaky);
        let report = session.on_tick(&Flaky);

        assert_eq!(report.samples, 1);
        assert_eq!(report.capture_failures, 1);
        assert!(session.sequences().get(&EntityId::new("ok")).is_some());
        assert!(session.sequences().get(&EntityId::new("bad")).is_none());
    }

    #[test]
    fn chat_while_inactive_is_ignored() {
        let (mut session, _, _) = session_with(CollectorConfig::default());
        session.on_tick(&frame(&["Steve"]));
        session.on_tick(&frame(&["Steve"]));

        let mut unloaded = frame(&["Steve"]);
        unloaded.active = false;
        session.on_tick(&unloaded);
        assert_eq!(
            session.on_chat(&ChatMessage::new("<Steve> hello?")),
            ChatOutcome::Ignored
        );

        // paused worlds still take chat
        let mut paused = frame(&["Steve"]);
        paused.paused = true;
        session.on_tick(&paused);
        assert!(matches!(
            session.on_chat(&ChatMessage::new("<Steve> brb")),
            ChatOutcome::Recorded { .. }
        ));
        assert_eq!(session.stats().chat_ignored, 1);
        assert_eq!(session.stats().chat_recorded, 1);
    }

    #[test]
    fn unstamped_chat_takes_last_frame_time() {
        let (mut session, _, _) = session_with(CollectorConfig::default());
        session.on_tick(&frame(&["Steve"]).at(4_000));
        session.on_tick(&frame(&["Steve"]).at(4_050));

        session.on_chat(&ChatMessage::new("<Steve> here"));

        let event = session
            .sequences()
            .get(&EntityId::new("uuid-steve"))
            .and_then(|s| s.side_events().next().cloned())
            .expect("event");
        assert_eq!(event.timestamp, 4_050);
    }
}
