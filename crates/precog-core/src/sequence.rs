//! # Sequence Module
//!
//! Bounded rolling history per tracked entity.
//!
//! - Each entity keeps its most recent samples and chat side-events
//! - Both buffers evict oldest-first once past their window
//! - A write counter counts samples since the last drain
//! - Entities absent from the current population are discarded outright
//!
//! Draining does NOT clear the sample buffer: every batch is paired from
//! the full current window, so consecutive batches overlap when the
//! window is larger than the trigger.

use crate::{EntityId, EntityRef, Sample, SideEvent};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// =============================================================================
// ENTITY SEQUENCE
// =============================================================================

/// Rolling history of one tracked entity.
#[derive(Debug, Clone)]
pub struct EntitySequence {
    entity: EntityRef,
    samples: VecDeque<Sample>,
    side_events: VecDeque<SideEvent>,
    write_counter: u32,
    sample_window: usize,
    side_event_window: usize,
}

impl EntitySequence {
    /// Create an empty sequence for a newly observed entity.
    #[must_use]
    pub fn new(entity: EntityRef, sample_window: usize, side_event_window: usize) -> Self {
        Self {
            entity,
            samples: VecDeque::with_capacity(sample_window.saturating_add(1)),
            side_events: VecDeque::with_capacity(side_event_window.saturating_add(1)),
            write_counter: 0,
            sample_window,
            side_event_window,
        }
    }

    /// Append a sample, evicting the oldest past the window.
    pub fn push_sample(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.sample_window {
            self.samples.pop_front();
        }
        self.write_counter = self.write_counter.saturating_add(1);
    }

    /// Append a side-event, evicting the oldest past the window.
    pub fn push_side_event(&mut self, event: SideEvent) {
        self.side_events.push_back(event);
        while self.side_events.len() > self.side_event_window {
            self.side_events.pop_front();
        }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn samples(&self) -> impl ExactSizeIterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn side_events(&self) -> impl ExactSizeIterator<Item = &SideEvent> {
        self.side_events.iter()
    }

    pub fn latest_sample(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn write_counter(&self) -> u32 {
        self.write_counter
    }
}

// =============================================================================
// DRAINED BATCH
// =============================================================================

/// Snapshot copy of an entity's buffers taken when its trigger fires.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainedSequence {
    pub entity: EntityRef,
    pub samples: Vec<Sample>,
    pub side_events: Vec<SideEvent>,
}

// =============================================================================
// SEQUENCE STORE
// =============================================================================

/// All tracked entities, keyed by id.
///
/// Uses BTreeMap so iteration (and therefore output order across
/// entities) is deterministic.
#[derive(Debug, Clone)]
pub struct SequenceStore {
    sequences: BTreeMap<EntityId, EntitySequence>,
    sample_window: usize,
    side_event_window: usize,
    write_trigger: u32,
}

impl SequenceStore {
    #[must_use]
    pub fn new(sample_window: usize, side_event_window: usize, write_trigger: u32) -> Self {
        Self {
            sequences: BTreeMap::new(),
            sample_window,
            side_event_window,
            write_trigger,
        }
    }

    /// Record a sample, creating the entity's sequence on first sight.
    pub fn record(&mut self, entity: &EntityRef, sample: Sample) {
        let sample_window = self.sample_window;
        let side_event_window = self.side_event_window;
        self.sequences
            .entry(entity.id.clone())
            .or_insert_with(|| {
                tracing::debug!(entity = %entity.id, name = %entity.name, "Tracking new entity");
                EntitySequence::new(entity.clone(), sample_window, side_event_window)
            })
            .push_sample(sample);
    }

    /// Record a side-event for a tracked entity.
    ///
    /// Returns `false` (and drops the event) if the entity is not tracked.
    pub fn record_side_event(&mut self, id: &EntityId, event: SideEvent) -> bool {
        match self.sequences.get_mut(id) {
            Some(sequence) => {
                sequence.push_side_event(event);
                true
            }
            None => false,
        }
    }

    /// Whether the entity's batch is due.
    ///
    /// True exactly when the write counter reached the trigger and at
    /// least two samples are buffered. Checking has no side effects.
    #[must_use]
    pub fn should_trigger(&self, id: &EntityId) -> bool {
        self.sequences.get(id).is_some_and(|sequence| {
            sequence.write_counter >= self.write_trigger && sequence.samples.len() >= 2
        })
    }

    /// Copy out the entity's buffers and reset its write counter.
    ///
    /// Call at most once per trigger; every call re-arms the counter.
    /// Returns `None` for an untracked entity.
    pub fn drain_for_pairing(&mut self, id: &EntityId) -> Option<DrainedSequence> {
        let sequence = self.sequences.get_mut(id)?;
        sequence.write_counter = 0;
        Some(DrainedSequence {
            entity: sequence.entity.clone(),
            samples: sequence.samples.iter().cloned().collect(),
            side_events: sequence.side_events.iter().cloned().collect(),
        })
    }

    /// Discard every tracked entity not in `current`.
    ///
    /// Returns the evicted ids. Their history is gone for good.
    pub fn evict_stale(&mut self, current: &BTreeSet<EntityId>) -> Vec<EntityId> {
        let stale: Vec<EntityId> = self
            .sequences
            .keys()
            .filter(|id| !current.contains(*id))
            .cloned()
            .collect();
        for id in &stale {
            self.sequences.remove(id);
        }
        stale
    }

    /// Find a tracked entity by display name, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&EntitySequence> {
        self.sequences
            .values()
            .find(|sequence| eq_ignore_case(&sequence.entity.name, name))
    }

    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&EntitySequence> {
        self.sequences.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySequence> {
        self.sequences.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// Per-character Unicode case folding, as display names are compared in game.
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars().count() == b.chars().count()
        && a.chars().zip(b.chars()).all(|(x, y)| {
            x == y
                || x.to_uppercase().eq(y.to_uppercase())
                || x.to_lowercase().eq(y.to_lowercase())
        })
}

// =============================================================================
// TESTS
// =============================================================================
