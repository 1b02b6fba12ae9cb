//! # Host Frames
//!
//! Wire form of what the in-game client mod reports each host tick.
//!
//! A [`TickFrame`] is a ready-made [`WorldView`]: the mod has already run
//! the world queries, so capture is a lookup. Recorded sessions are
//! JSONL files of [`FrameLine`]s, one tick or chat message per line.

use crate::primitives::DEFAULT_NAMESPACE;
use crate::{EntityId, EntityRef, PrecogError, Snapshot, WorldView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn default_true() -> bool {
    true
}

/// One observed entity in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEntity {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub snapshot: Snapshot,
}

/// Everything the host knows at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickFrame {
    /// A player and world are loaded.
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub paused: bool,
    /// Host wall clock; the session clock is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    #[serde(default)]
    pub entities: Vec<FrameEntity>,
}

impl TickFrame {
    /// An active, unpaused frame.
    #[must_use]
    pub fn active(entities: Vec<FrameEntity>) -> Self {
        Self {
            active: true,
            paused: false,
            timestamp_ms: None,
            entities,
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }
}

impl WorldView for TickFrame {
    fn is_active(&self) -> bool {
        self.active
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn timestamp_ms(&self) -> Option<i64> {
        self.timestamp_ms
    }

    /// Entities in frame order. A repeated id is observed once, by its
    /// first entry.
    fn population(&self) -> Vec<EntityRef> {
        let mut seen = BTreeSet::new();
        self.entities
            .iter()
            .filter(|entity| seen.insert(&entity.id))
            .map(|entity| EntityRef {
                id: entity.id.clone(),
                name: entity.name.clone(),
            })
            .collect()
    }

    fn capture(&self, entity: &EntityRef) -> Result<Snapshot, PrecogError> {
        self.entities
            .iter()
            .find(|candidate| candidate.id == entity.id)
            .map(|found| strip_namespaces(found.snapshot.clone()))
            .ok_or_else(|| PrecogError::UnknownEntity(entity.id.clone()))
    }
}

/// Drop the default `minecraft:` namespace from registry identifiers.
fn strip_namespaces(mut snapshot: Snapshot) -> Snapshot {
    for field in [
        &mut snapshot.state.held_item,
        &mut snapshot.environment.biome,
        &mut snapshot.environment.dimension,
        &mut snapshot.environment.block_below,
    ] {
        if field.contains(DEFAULT_NAMESPACE) {
            *field = field.replace(DEFAULT_NAMESPACE, "");
        }
    }
    snapshot
}

// =============================================================================
// CHAT & RECORDED LINES
// =============================================================================

/// A raw chat line as received by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp_ms: None,
        }
    }
}

/// One line of a recorded session file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameLine {
    Tick(TickFrame),
    Chat(ChatMessage),
}

impl FrameLine {
    /// Parse one line of a recorded session.
    pub fn parse(line: &str) -> Result<Self, PrecogError> {
        serde_json::from_str(line).map_err(|e| PrecogError::InvalidFrame(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_defaults_to_active() {
        let frame: TickFrame = serde_json::from_str(r#"{"entities":[]}"#).expect("parse");
        assert!(frame.is_active());
        assert!(!frame.is_paused());
        assert_eq!(frame.timestamp_ms(), None);
    }

    #[test]
    fn capture_strips_namespace() {
        let json = r#"{
            "entities": [{
                "id": "uuid-steve",
                "name": "Steve",
                "snapshot": {
                    "state": {"held_item": "minecraft:diamond_pickaxe"},
                    "environment": {"biome": "minecraft:plains", "dimension": "minecraft:overworld", "block_below": "Stone"}
                }
            }]
        }"#;
        let frame: TickFrame = serde_json::from_str(json).expect("parse");
        let population = frame.population();
        let snapshot = frame.capture(&population[0]).expect("capture");

        assert_eq!(snapshot.state.held_item, "diamond_pickaxe");
        assert_eq!(snapshot.environment.biome, "plains");
        assert_eq!(snapshot.environment.dimension, "overworld");
        assert_eq!(snapshot.environment.block_below, "Stone");
    }

    #[test]
    fn capture_unknown_entity_fails() {
        let frame = TickFrame::active(Vec::new());
        let ghost = EntityRef::new("ghost", "Ghost");
        assert!(matches!(
            frame.capture(&ghost),
            Err(PrecogError::UnknownEntity(_))
        ));
    }

    #[test]
    fn repeated_id_is_observed_once() {
        let entity = |name: &str| FrameEntity {
            id: EntityId::new("uuid-steve"),
            name: name.to_string(),
            snapshot: Snapshot::default(),
        };
        let frame = TickFrame::active(vec![entity("Steve"), entity("Steve2")]);

        let population = frame.population();
        assert_eq!(population.len(), 1);
        assert_eq!(population[0].name, "Steve");
    }

    #[test]
    fn frame_lines_are_tagged() {
        let tick = FrameLine::parse(r#"{"kind":"tick","timestamp_ms":5,"entities":[]}"#)
            .expect("tick");
        assert!(matches!(tick, FrameLine::Tick(ref f) if f.timestamp_ms == Some(5)));

        let chat = FrameLine::parse(r#"{"kind":"chat","message":"<Steve> hi"}"#).expect("chat");
        assert_eq!(chat, FrameLine::Chat(ChatMessage::new("<Steve> hi")));

        assert!(matches!(
            FrameLine::parse(r#"{"kind":"dance"}"#),
            Err(PrecogError::InvalidFrame(_))
        ));
    }
}
