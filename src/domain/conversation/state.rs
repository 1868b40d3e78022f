//! Per-conversation booking state.
//!
//! Every mutation returns a new value; callers swap it in only once it has
//! been persisted, so a failed turn can never leave a half-applied commit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::foundation::{StateMachine, ThreadId, Timestamp};
use crate::domain::slots::{Candidate, LookupConstraints, Slot, SlotName, SlotRegistry};

use super::phase::BookingPhase;

/// Whether re-committing an unchanged value still clears downstream slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    /// Every commit clears the dependents, even when the value is unchanged.
    #[default]
    Always,
    /// Committing the same candidate id again leaves dependents in place.
    OnChange,
}

/// A broken structural guarantee of [`ConversationState`].
///
/// These indicate programming errors or corrupt storage, never user error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Slot '{0}' is not part of the registry")]
    UnknownSlot(SlotName),

    #[error("Slot '{filled}' is filled while upstream slot '{missing}' is empty")]
    SkippedAhead { filled: SlotName, missing: SlotName },

    #[error("Phase {phase:?} does not match fill status (all filled: {all_filled})")]
    PhaseMismatch { phase: BookingPhase, all_filled: bool },

    #[error("Invalid phase transition: {0}")]
    Transition(String),
}

/// Result of committing a value to a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// State after the commit and cascade.
    pub state: ConversationState,
    /// Downstream slots whose values were removed, in fill order.
    pub cleared: Vec<SlotName>,
    /// False when the slot already held the same candidate id.
    pub changed: bool,
}

/// Mutable state of one booking conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    thread_id: ThreadId,
    filled_slots: BTreeMap<SlotName, Candidate>,
    phase: BookingPhase,
    last_updated: Timestamp,
}

impl ConversationState {
    /// Creates an empty conversation.
    pub fn new(thread_id: ThreadId) -> Self {
        Self {
            thread_id,
            filled_slots: BTreeMap::new(),
            phase: BookingPhase::AwaitingSlot,
            last_updated: Timestamp::now(),
        }
    }

    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    pub fn phase(&self) -> BookingPhase {
        self.phase
    }

    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    pub fn filled_slots(&self) -> &BTreeMap<SlotName, Candidate> {
        &self.filled_slots
    }

    pub fn value_of(&self, slot: &SlotName) -> Option<&Candidate> {
        self.filled_slots.get(slot)
    }

    pub fn is_filled(&self, slot: &SlotName) -> bool {
        self.filled_slots.contains_key(slot)
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_complete()
    }

    /// First slot in fill order without a value.
    pub fn next_unfilled<'r>(&self, registry: &'r SlotRegistry) -> Option<&'r Slot> {
        registry
            .ordered_slots()
            .iter()
            .find(|slot| !self.is_filled(slot.name()))
    }

    /// Committed values of the slots that scope lookups for `slot`.
    pub fn constraints_for(&self, slot: &Slot) -> LookupConstraints {
        slot.dependencies()
            .iter()
            .filter_map(|name| {
                self.filled_slots
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    /// Filled slots paired with their definitions, in fill order.
    pub fn summary<'a>(&'a self, registry: &'a SlotRegistry) -> Vec<(&'a Slot, &'a Candidate)> {
        registry
            .ordered_slots()
            .iter()
            .filter_map(|slot| self.filled_slots.get(slot.name()).map(|value| (slot, value)))
            .collect()
    }

    /// Sets `slot` to `value` and clears its dependents in one step.
    ///
    /// The receiver is left untouched; the caller decides when the returned
    /// state replaces it.
    pub fn commit(
        &self,
        registry: &SlotRegistry,
        slot: &SlotName,
        value: Candidate,
        policy: CascadePolicy,
    ) -> Result<Commit, InvariantViolation> {
        let dependents = registry
            .dependents_of(slot)
            .map_err(|_| InvariantViolation::UnknownSlot(slot.clone()))?;

        let changed = self
            .filled_slots
            .get(slot)
            .map_or(true, |current| current.id != value.id);

        let mut next = self.clone();
        next.filled_slots.insert(slot.clone(), value);

        let mut cleared = Vec::new();
        if changed || policy == CascadePolicy::Always {
            for dependent in dependents {
                if next.filled_slots.remove(dependent).is_some() {
                    cleared.push(dependent.clone());
                }
            }
        }

        next.refresh_phase(registry)?;
        next.last_updated = Timestamp::now();
        next.verify(registry)?;

        Ok(Commit {
            state: next,
            cleared,
            changed,
        })
    }

    /// Returns an empty booking for the same thread.
    pub fn restarted(&self) -> Self {
        Self {
            thread_id: self.thread_id.clone(),
            filled_slots: BTreeMap::new(),
            phase: BookingPhase::AwaitingSlot,
            last_updated: Timestamp::now(),
        }
    }

    /// Marks the conversation as active now without changing the booking.
    pub fn touch(&mut self) {
        self.last_updated = Timestamp::now();
    }

    /// Checks the structural invariants against a registry.
    pub fn verify(&self, registry: &SlotRegistry) -> Result<(), InvariantViolation> {
        if let Some(unknown) = self.filled_slots.keys().find(|name| !registry.contains(name)) {
            return Err(InvariantViolation::UnknownSlot(unknown.clone()));
        }

        let mut first_empty: Option<&SlotName> = None;
        for slot in registry.ordered_slots() {
            match (self.is_filled(slot.name()), first_empty) {
                (false, None) => first_empty = Some(slot.name()),
                (true, Some(missing)) => {
                    return Err(InvariantViolation::SkippedAhead {
                        filled: slot.name().clone(),
                        missing: missing.clone(),
                    })
                }
                _ => {}
            }
        }

        let all_filled = first_empty.is_none();
        if self.phase != BookingPhase::for_fill(all_filled) {
            return Err(InvariantViolation::PhaseMismatch {
                phase: self.phase,
                all_filled,
            });
        }
        Ok(())
    }

    fn refresh_phase(&mut self, registry: &SlotRegistry) -> Result<(), InvariantViolation> {
        let all_filled = registry
            .ordered_slots()
            .iter()
            .all(|slot| self.is_filled(slot.name()));
        let target = BookingPhase::for_fill(all_filled);
        if target != self.phase {
            self.phase = self
                .phase
                .transition_to(target)
                .map_err(|e| InvariantViolation::Transition(e.to_string()))?;
        }
        Ok(())
    }
}
