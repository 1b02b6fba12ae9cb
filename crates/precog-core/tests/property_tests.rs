//! # Property-Based Tests
//!
//! Invariants of buffering, pairing, encoding and chat parsing under
//! arbitrary input.

use precog_core::{
    EntityRef, PairingEngine, Sample, SequenceStore, SideEvent, Snapshot, encode_record,
    inspect_line, parse_chat,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn steve() -> EntityRef {
    EntityRef::new("uuid-steve", "Steve")
}

fn chat_at(timestamp: i64, content: &str) -> SideEvent {
    SideEvent {
        timestamp,
        tick: 0,
        origin_name: "Steve".to_string(),
        origin_id: None,
        content: content.to_string(),
        origin_position: None,
    }
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A window never holds more than its capacity, whatever the input length.
    #[test]
    fn window_never_exceeds_capacity(count in 0usize..400, window in 2usize..120) {
        let mut store = SequenceStore::new(window, 20, u32::MAX);
        for i in 0..count {
            store.record(&steve(), Sample::new(i as i64, i as i64, Snapshot::default()));
        }

        let held = store.get(&steve().id).map_or(0, |s| s.samples().len());
        prop_assert_eq!(held, count.min(window));
    }

    /// N samples always produce N-1 records with exact deltas.
    #[test]
    fn pairing_yields_n_minus_one(stamps in vec((any::<i32>(), any::<i32>()), 0..80)) {
        let samples: Vec<Sample> = stamps
            .iter()
            .map(|&(ts, tick)| Sample::new(i64::from(ts), i64::from(tick), Snapshot::default()))
            .collect();
        let entity = steve();
        let records = PairingEngine::new(5000).pair("s", &entity, &samples, &[]);

        prop_assert_eq!(records.len(), samples.len().saturating_sub(1));
        for (record, pair) in records.iter().zip(samples.windows(2)) {
            prop_assert_eq!(record.time_delta_ms, pair[1].timestamp - pair[0].timestamp);
            prop_assert_eq!(record.tick_delta, pair[1].tick - pair[0].tick);
        }
    }

    /// Attached side-events are exactly those within the trailing window.
    #[test]
    fn enrichment_respects_window(
        action_ts in 0i64..100_000,
        chat_ts in vec(0i64..100_000, 0..20),
        window in 0i64..10_000,
    ) {
        let events: Vec<SideEvent> = chat_ts.iter().map(|&ts| chat_at(ts, "x")).collect();
        let engine = PairingEngine::new(window);
        let attached = engine.recent_side_events(action_ts, &events);

        let expected = chat_ts
            .iter()
            .filter(|&&ts| ts <= action_ts && action_ts - ts <= window)
            .count();
        prop_assert_eq!(attached.len(), expected);
    }

    /// Every encoded record is one line that passes verification.
    #[test]
    fn encoded_lines_verify(
        x in -30_000_000.0f64..30_000_000.0,
        yaw in -180.0f32..180.0,
        content in "[ -~\n]{0,40}",
        ts in 0i64..1_000_000,
    ) {
        let mut snapshot = Snapshot::default();
        snapshot.position.x = x;
        snapshot.rotation.yaw = yaw;
        let samples = vec![
            Sample::new(ts, 2, snapshot.clone()),
            Sample::new(ts + 100, 4, snapshot),
        ];
        let events = vec![chat_at(ts, &content)];
        let entity = steve();
        let records = PairingEngine::new(5000).pair("session_1", &entity, &samples, &events);

        let line = encode_record(&records[0]).expect("encode");
        prop_assert!(line.ends_with('\n'));
        prop_assert_eq!(line.matches('\n').count(), 1);

        let summary = inspect_line(1, &line).expect("verify");
        prop_assert_eq!(summary.time_delta_ms, 100);
        prop_assert_eq!(summary.tick_delta, 2);
        prop_assert_eq!(summary.chat_count, 1);
    }

    /// Angle-bracket senders always parse back to the trimmed name.
    #[test]
    fn bracket_sender_roundtrip(name in "[A-Za-z0-9_]{1,16}", body in "[ -~]{0,30}") {
        let parsed = parse_chat(&format!("<{}> {}", name, body)).expect("sender");
        prop_assert_eq!(parsed.sender, name);
        prop_assert_eq!(parsed.content, body.trim());
    }

    /// Parsing never panics and never yields an empty sender.
    #[test]
    fn parse_chat_total(raw in "\\PC{0,60}") {
        if let Some(parsed) = parse_chat(&raw) {
            prop_assert!(!parsed.sender.is_empty());
        }
    }
}
