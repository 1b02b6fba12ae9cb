//! # Line Encoding
//!
//! The stable JSONL format of transition records.
//!
//! Format: one JSON object per line, `\n` terminated. Field order is
//! fixed by the wire structs below and is part of the format, so output
//! is byte-for-byte reproducible for the same input.
//!
//! ## Numbers
//!
//! Floats in position (3 places), rotation (2), velocity (6) and combat
//! distance/angle (2) are written as fixed-point decimal text, never in
//! exponent form. A non-finite value is written as `null` so the line
//! stays valid JSON. Health uses the shortest round-trip representation.
//!
//! ## Strings
//!
//! Embedded newlines become a single space before JSON escaping.

use crate::pairing::TransitionRecord;
use crate::{PrecogError, Sample, SideEvent};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::Value;
use serde_json::value::RawValue;
use std::borrow::Cow;

// =============================================================================
// FIELD HELPERS
// =============================================================================

/// A float written with exactly `P` decimal places.
#[derive(Debug, Clone, Copy)]
struct Fixed<const P: usize>(f64);

impl<const P: usize> Serialize for Fixed<P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !self.0.is_finite() {
            return serializer.serialize_none();
        }
        let raw = RawValue::from_string(format!("{:.*}", P, self.0)).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }
}

fn clean(s: &str) -> Cow<'_, str> {
    if s.contains('\n') {
        Cow::Owned(s.replace('\n', " "))
    } else {
        Cow::Borrowed(s)
    }
}

// =============================================================================
// WIRE STRUCTS
// =============================================================================

#[derive(Serialize)]
struct RecordLine<'a> {
    session_id: Cow<'a, str>,
    player_uuid: Cow<'a, str>,
    player_name: Cow<'a, str>,
    action1: ActionLine<'a>,
    action2: ActionLine<'a>,
    time_delta_ms: i64,
    tick_delta: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    recent_chat: Vec<ChatLine<'a>>,
}

#[derive(Serialize)]
struct ActionLine<'a> {
    timestamp: i64,
    tick: i64,
    position: PositionLine,
    rotation: RotationLine,
    velocity: VelocityLine,
    state: StateLine<'a>,
    environment: EnvironmentLine<'a>,
    combat: CombatLine,
}

#[derive(Serialize)]
struct PositionLine {
    x: Fixed<3>,
    y: Fixed<3>,
    z: Fixed<3>,
}

#[derive(Serialize)]
struct RotationLine {
    yaw: Fixed<2>,
    pitch: Fixed<2>,
}

#[derive(Serialize)]
struct VelocityLine {
    x: Fixed<6>,
    y: Fixed<6>,
    z: Fixed<6>,
    speed: Fixed<6>,
}

#[derive(Serialize)]
struct StateLine<'a> {
    health: f32,
    hunger: i32,
    sprinting: bool,
    sneaking: bool,
    flying: bool,
    on_ground: bool,
    in_water: bool,
    held_item: Cow<'a, str>,
    swinging: bool,
}

#[derive(Serialize)]
struct EnvironmentLine<'a> {
    biome: Cow<'a, str>,
    light_level: i32,
    dimension: Cow<'a, str>,
    block_below: Cow<'a, str>,
}

#[derive(Serialize)]
struct CombatLine {
    nearby_players: i32,
    nearest_distance: Fixed<2>,
    nearest_angle_diff: Fixed<2>,
    in_combat: bool,
    time_since_damage: i32,
}

#[derive(Serialize)]
struct ChatLine<'a> {
    message: Cow<'a, str>,
    time_before_action: i64,
}

impl<'a> From<&'a Sample> for ActionLine<'a> {
    fn from(sample: &'a Sample) -> Self {
        let s = &sample.snapshot;
        Self {
            timestamp: sample.timestamp,
            tick: sample.tick,
            position: PositionLine {
                x: Fixed(s.position.x),
                y: Fixed(s.position.y),
                z: Fixed(s.position.z),
            },
            rotation: RotationLine {
                yaw: Fixed(f64::from(s.rotation.yaw)),
                pitch: Fixed(f64::from(s.rotation.pitch)),
            },
            velocity: VelocityLine {
                x: Fixed(s.velocity.x),
                y: Fixed(s.velocity.y),
                z: Fixed(s.velocity.z),
                speed: Fixed(s.velocity.speed),
            },
            state: StateLine {
                health: s.state.health,
                hunger: s.state.hunger,
                sprinting: s.state.sprinting,
                sneaking: s.state.sneaking,
                flying: s.state.flying,
                on_ground: s.state.on_ground,
                in_water: s.state.in_water,
                held_item: clean(&s.state.held_item),
                swinging: s.state.swinging,
            },
            environment: EnvironmentLine {
                biome: clean(&s.environment.biome),
                light_level: s.environment.light_level,
                dimension: clean(&s.environment.dimension),
                block_below: clean(&s.environment.block_below),
            },
            combat: CombatLine {
                nearby_players: s.combat.nearby_players,
                nearest_distance: Fixed(s.combat.nearest_distance),
                nearest_angle_diff: Fixed(s.combat.nearest_angle_diff),
                in_combat: s.combat.in_combat,
                time_since_damage: s.combat.time_since_damage,
            },
        }
    }
}

fn chat_line<'a>(action1: &Sample, event: &'a SideEvent) -> ChatLine<'a> {
    ChatLine {
        message: clean(&event.content),
        time_before_action: action1.timestamp.saturating_sub(event.timestamp),
    }
}

// =============================================================================
// ENCODE
// =============================================================================

/// Encode one transition record as a `\n`-terminated JSON line.
pub fn encode_record(record: &TransitionRecord<'_>) -> Result<String, PrecogError> {
    let line = RecordLine {
        session_id: clean(record.session_id),
        player_uuid: clean(record.entity.id.as_str()),
        player_name: clean(&record.entity.name),
        action1: ActionLine::from(record.action1),
        action2: ActionLine::from(record.action2),
        time_delta_ms: record.time_delta_ms,
        tick_delta: record.tick_delta,
        recent_chat: record
            .recent_side_events
            .iter()
            .map(|event| chat_line(record.action1, event))
            .collect(),
    };

    let mut json =
        serde_json::to_string(&line).map_err(|e| PrecogError::Serialization(e.to_string()))?;
    json.push('\n');
    Ok(json)
}

// =============================================================================
// INSPECT
// =============================================================================

/// Top-level keys of a record line, in order. `recent_chat` is optional.
pub const RECORD_KEYS: [&str; 8] = [
    "session_id",
    "player_uuid",
    "player_name",
    "action1",
    "action2",
    "time_delta_ms",
    "tick_delta",
    "recent_chat",
];

/// Keys of an `action1`/`action2` object, in order.
pub const ACTION_KEYS: [&str; 8] = [
    "timestamp",
    "tick",
    "position",
    "rotation",
    "velocity",
    "state",
    "environment",
    "combat",
];

/// What a verified line contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSummary {
    pub session_id: String,
    pub player_uuid: String,
    pub time_delta_ms: i64,
    pub tick_delta: i64,
    pub chat_count: usize,
}

/// Parse and check one output line.
///
/// Verifies key order, the action shape, that both deltas equal the
/// action differences exactly, and that `recent_chat` (when present) is
/// a non-empty list of messages. `line_no` is 1-based and only used in
/// error reports.
pub fn inspect_line(line_no: usize, line: &str) -> Result<LineSummary, PrecogError> {
    let invalid = |reason: String| PrecogError::InvalidRecord {
        line: line_no,
        reason,
    };

    let value: Value =
        serde_json::from_str(line).map_err(|e| invalid(format!("not valid JSON: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| invalid("not a JSON object".to_string()))?;

    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    let expected = if object.contains_key("recent_chat") {
        &RECORD_KEYS[..]
    } else {
        &RECORD_KEYS[..RECORD_KEYS.len() - 1]
    };
    if keys != expected {
        return Err(invalid(format!("unexpected keys {:?}", keys)));
    }

    let text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| invalid(format!("{} is not a string", key)))
    };
    let int = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| invalid(format!("{} is not an integer", key)))
    };

    let session_id = text("session_id")?;
    let player_uuid = text("player_uuid")?;
    text("player_name")?;
    let time_delta_ms = int("time_delta_ms")?;
    let tick_delta = int("tick_delta")?;

    let (ts1, tick1) = action_stamp(object.get("action1"), "action1").map_err(&invalid)?;
    let (ts2, tick2) = action_stamp(object.get("action2"), "action2").map_err(&invalid)?;

    if time_delta_ms != ts2.saturating_sub(ts1) {
        return Err(invalid(format!(
            "time_delta_ms {} != {} - {}",
            time_delta_ms, ts2, ts1
        )));
    }
    if tick_delta != tick2.saturating_sub(tick1) {
        return Err(invalid(format!(
            "tick_delta {} != {} - {}",
            tick_delta, tick2, tick1
        )));
    }

    let chat_count = match object.get("recent_chat") {
        None => 0,
        Some(Value::Array(entries)) if !entries.is_empty() => {
            for entry in entries {
                let well_formed = entry.get("message").is_some_and(Value::is_string)
                    && entry.get("time_before_action").is_some_and(Value::is_i64);
                if !well_formed {
                    return Err(invalid("malformed recent_chat entry".to_string()));
                }
            }
            entries.len()
        }
        Some(_) => return Err(invalid("recent_chat must be a non-empty array".to_string())),
    };

    Ok(LineSummary {
        session_id,
        player_uuid,
        time_delta_ms,
        tick_delta,
        chat_count,
    })
}

fn action_stamp(value: Option<&Value>, name: &str) -> Result<(i64, i64), String> {
    let action = value
        .and_then(Value::as_object)
        .ok_or_else(|| format!("{} is not an object", name))?;

    let keys: Vec<&str> = action.keys().map(String::as_str).collect();
    if keys != ACTION_KEYS {
        return Err(format!("{} has unexpected keys {:?}", name, keys));
    }

    let timestamp = action
        .get("timestamp")
        .and_then(Value::as_i64)
        .ok_or_else(|| format!("{}.timestamp is not an integer", name))?;
    let tick = action
        .get("tick")
        .and_then(Value::as_i64)
        .ok_or_else(|| format!("{}.tick is not an integer", name))?;
    Ok((timestamp, tick))
}

// =============================================================================
// TESTS
// =============================================================================
