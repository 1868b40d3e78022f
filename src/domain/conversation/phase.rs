//! Booking phase of a conversation.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Where a booking conversation stands between turns.
///
/// - `AwaitingSlot`: at least one slot is still empty
/// - `Complete`: every registered slot holds a value
///
/// A completed booking reopens when the user changes a slot, so neither
/// phase is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingPhase {
    #[default]
    AwaitingSlot,
    Complete,
}

impl BookingPhase {
    /// The phase implied by whether every slot is filled.
    pub fn for_fill(all_filled: bool) -> Self {
        if all_filled {
            Self::Complete
        } else {
            Self::AwaitingSlot
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Short label for wire messages and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AwaitingSlot => "awaiting_slot",
            Self::Complete => "complete",
        }
    }
}

impl StateMachine for BookingPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use BookingPhase::*;
        matches!(
            (self, target),
            // Last slot committed
            (AwaitingSlot, Complete) |
            // Change-intent or restart reopens the booking
            (Complete, AwaitingSlot)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BookingPhase::*;
        match self {
            AwaitingSlot => vec![Complete],
            Complete => vec![AwaitingSlot],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phase_is_awaiting_slot() {
        assert_eq!(BookingPhase::default(), BookingPhase::AwaitingSlot);
    }

    #[test]
    fn serializes_to_snake_case() {
        let json = serde_json::to_string(&BookingPhase::AwaitingSlot).unwrap();
        assert_eq!(json, "\"awaiting_slot\"");
        let phase: BookingPhase = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(phase, BookingPhase::Complete);
    }

    #[test]
    fn for_fill_maps_completeness() {
        assert_eq!(BookingPhase::for_fill(true), BookingPhase::Complete);
        assert_eq!(BookingPhase::for_fill(false), BookingPhase::AwaitingSlot);
    }

    #[test]
    fn complete_can_reopen() {
        assert!(BookingPhase::Complete.can_transition_to(&BookingPhase::AwaitingSlot));
        assert!(!BookingPhase::Complete.is_terminal());
    }

    #[test]
    fn self_transitions_are_not_state_changes() {
        assert!(BookingPhase::AwaitingSlot
            .transition_to(BookingPhase::AwaitingSlot)
            .is_err());
    }

    #[test]
    fn labels_match_serialized_form() {
        for phase in [BookingPhase::AwaitingSlot, BookingPhase::Complete] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json.trim_matches('"'), phase.label());
        }
    }
}
