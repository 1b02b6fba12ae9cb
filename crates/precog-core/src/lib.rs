//! # precog-core
//!
//! The collector engine for Precog: per-entity sample windows, transition
//! pairing and JSONL output.
//!
//! ## Data Flow
//!
//! ```text
//! WorldView ──tick──▶ Session ──record──▶ SequenceStore
//!                        │                      │ trigger
//!      chat ────────────▶│                      ▼
//!                        │              PairingEngine ──▶ encode_record
//!                        ▼                                     │
//!                   LineSink ◀──────flush────── OutputBuffer ◀─┘
//! ```
//!
//! ## Constraints
//!
//! - No async and no network: hosts drive the [`Session`] synchronously
//! - All per-entity state is keyed in `BTreeMap`s, so iteration order is
//!   stable across runs
//! - The collector never fails its host: errors are logged and counted

// =============================================================================
// MODULES
// =============================================================================

pub mod chat;
pub mod clock;
pub mod config;
pub mod encoding;
pub mod frame;
pub mod output;
pub mod pairing;
pub mod primitives;
pub mod sequence;
pub mod session;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    Combat, EntityId, EntityRef, Environment, PlayerState, Position, PrecogError, Rotation,
    Sample, SideEvent, Snapshot, Velocity, WorldView,
};

// =============================================================================
// RE-EXPORTS: Collector
// =============================================================================

pub use chat::{ParsedChat, parse_chat};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CollectorConfig;
pub use encoding::{LineSummary, encode_record, inspect_line};
pub use frame::{ChatMessage, FrameEntity, FrameLine, TickFrame};
pub use output::{FileSink, LineSink, MemorySink, OutputBuffer};
pub use pairing::{PairingEngine, TransitionRecord};
pub use sequence::{DrainedSequence, EntitySequence, SequenceStore};
pub use session::{ChatOutcome, FlushOutcome, Session, SessionStats, TickReport};
