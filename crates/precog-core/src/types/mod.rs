//! # Core Type Definitions
//!
//! This module contains all core types for the Precog sequencing core:
//! - Entity identifiers (`EntityId`, `EntityRef`)
//! - Sampled state (`Snapshot` and its parts, `Sample`)
//! - Out-of-band context (`SideEvent`)
//! - The capture adapter seam (`WorldView`)
//! - Error types (`PrecogError`)
//!
//! ## Ownership
//!
//! A `Sample` is created once per entity per sampling tick and never
//! mutated afterwards. It is owned by the entity's sequence buffer until
//! FIFO eviction drops it; pairing only ever sees snapshot copies.

use crate::primitives::NO_PLAYER_SENTINEL;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ENTITY IDENTIFIERS
// =============================================================================

/// Stable identifier of a tracked entity (a player UUID in practice).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Create a new entity id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An entity as seen in the current population: id plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    pub name: String,
}

impl EntityRef {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(id),
            name: name.into(),
        }
    }
}

// =============================================================================
// SNAPSHOT PARTS
// =============================================================================

/// World position in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// View rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    pub yaw: f32,
    pub pitch: f32,
}

/// Movement delta per tick. `speed` is the horizontal magnitude as
/// reported by the capture adapter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub speed: f64,
}

/// Discrete player state flags.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    pub health: f32,
    pub hunger: i32,
    pub sprinting: bool,
    pub sneaking: bool,
    pub flying: bool,
    pub on_ground: bool,
    pub in_water: bool,
    pub held_item: String,
    pub swinging: bool,
}

/// Surroundings of the entity's block position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub biome: String,
    pub light_level: i32,
    pub dimension: String,
    pub block_below: String,
}

/// Proximity and combat metrics.
///
/// `nearest_distance` and `nearest_angle_diff` hold
/// [`NO_PLAYER_SENTINEL`] (-1) when no other player is nearby.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Combat {
    pub nearby_players: i32,
    pub nearest_distance: f64,
    pub nearest_angle_diff: f64,
    pub in_combat: bool,
    pub time_since_damage: i32,
}

impl Default for Combat {
    fn default() -> Self {
        Self {
            nearby_players: 0,
            nearest_distance: NO_PLAYER_SENTINEL,
            nearest_angle_diff: NO_PLAYER_SENTINEL,
            in_combat: false,
            time_since_damage: 0,
        }
    }
}

// =============================================================================
// SNAPSHOT & SAMPLE
// =============================================================================

/// Everything the capture adapter reports about one entity at one tick.
///
/// The core never inspects these values beyond encoding them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub position: Position,
    pub rotation: Rotation,
    pub velocity: Velocity,
    pub state: PlayerState,
    pub environment: Environment,
    pub combat: Combat,
}

/// A snapshot stamped with wall-clock time and the session tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Session tick counter at capture time.
    pub tick: i64,
    pub snapshot: Snapshot,
}

impl Sample {
    /// Stamp a captured snapshot.
    #[must_use]
    pub fn new(timestamp: i64, tick: i64, snapshot: Snapshot) -> Self {
        Self {
            timestamp,
            tick,
            snapshot,
        }
    }
}

// =============================================================================
// SIDE EVENT
// =============================================================================

/// An out-of-band occurrence attributed to a tracked entity (chat).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideEvent {
    pub timestamp: i64,
    pub tick: i64,
    pub origin_name: String,
    pub origin_id: Option<EntityId>,
    pub content: String,
    pub origin_position: Option<Position>,
}

// =============================================================================
// WORLD VIEW (capture adapter seam)
// =============================================================================

/// The interface between the host game and the core.
///
/// Implementors answer world queries for a single host tick. The core
/// never looks up entities, biomes or blocks itself; it only consumes
/// what the view hands it.
pub trait WorldView {
    /// Whether a player session and world are loaded.
    fn is_active(&self) -> bool;

    /// Whether the host simulation is paused.
    fn is_paused(&self) -> bool;

    /// Host-supplied wall clock for this tick, if any.
    ///
    /// When `None` the session falls back to its own clock.
    fn timestamp_ms(&self) -> Option<i64> {
        None
    }

    /// Every entity currently observed.
    fn population(&self) -> Vec<EntityRef>;

    /// Capture the state of one observed entity.
    fn capture(&self, entity: &EntityRef) -> Result<Snapshot, PrecogError>;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Precog system.
///
/// None of these ever escape the tick or chat paths of a session; they
/// are logged and counted there. CLI and config paths propagate them.
#[derive(Debug, Error)]
pub enum PrecogError {
    /// Output directory or file could not be prepared.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Buffered lines could not be written to the sink.
    #[error("Flush failed: {0}")]
    Flush(String),

    /// An I/O error outside of flushing.
    #[error("I/O error: {0}")]
    Io(String),

    /// A record could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A host frame could not be decoded.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// The capture adapter does not know the entity.
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// A configuration value is out of range.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// An output line does not match the transition record format.
    #[error("Invalid record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

// =============================================================================
// TESTS
// =============================================================================
