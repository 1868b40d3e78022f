//! Turn state machine.
//!
//! One inbound message advances a conversation through
//! `detect_intent → process_slot → prompt_slot` and parks it in either
//! `awaiting_slot` or `complete`. The transition function is pure; the
//! turn handler feeds it events and performs the side effects.

use serde::Serialize;
use thiserror::Error;

use super::phase::BookingPhase;

/// Where a conversation is within (or between) turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStage {
    /// No stored state yet for the thread.
    Init,
    DetectIntent,
    ProcessSlot,
    PromptSlot,
    /// Parked between turns with at least one empty slot.
    AwaitingSlot,
    /// Parked between turns with every slot filled.
    Complete,
}

/// Coarse intent classification, as far as routing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentClass {
    /// Continue or change-slot: a value must be processed.
    Fill,
    Restart,
    Unrecognized,
}

/// Inputs to the turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    Initialized,
    MessageReceived,
    Classified(IntentClass),
    Committed,
    Rejected,
    Prompted { complete: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No transition from {stage:?} on {event:?}")]
pub struct TurnTransitionError {
    pub stage: TurnStage,
    pub event: TurnEvent,
}

impl TurnStage {
    /// The stage a turn starts from.
    pub fn entry(stored: Option<BookingPhase>) -> Self {
        match stored {
            None => Self::Init,
            Some(phase) => Self::parked(phase),
        }
    }

    /// The stage a conversation rests in between turns.
    pub fn parked(phase: BookingPhase) -> Self {
        match phase {
            BookingPhase::AwaitingSlot => Self::AwaitingSlot,
            BookingPhase::Complete => Self::Complete,
        }
    }

    pub fn is_parked(&self) -> bool {
        matches!(self, Self::AwaitingSlot | Self::Complete)
    }

    /// Applies an event.
    ///
    /// Every stage accepts exactly the events that can follow it; anything
    /// else is a sequencing bug in the caller.
    pub fn on(self, event: TurnEvent) -> Result<Self, TurnTransitionError> {
        use IntentClass::*;
        use TurnEvent::*;
        use TurnStage::*;

        let next = match (self, event) {
            (Init, Initialized) => DetectIntent,
            (AwaitingSlot | Complete, MessageReceived) => DetectIntent,
            (DetectIntent, Classified(Fill)) => ProcessSlot,
            (DetectIntent, Classified(Restart | Unrecognized)) => PromptSlot,
            (ProcessSlot, Committed | Rejected) => PromptSlot,
            (PromptSlot, Prompted { complete: true }) => TurnStage::Complete,
            (PromptSlot, Prompted { complete: false }) => AwaitingSlot,
            (stage, event) => return Err(TurnTransitionError { stage, event }),
        };
        Ok(next)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::DetectIntent => "detect_intent",
            Self::ProcessSlot => "process_slot",
            Self::PromptSlot => "prompt_slot",
            Self::AwaitingSlot => "awaiting_slot",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for TurnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STAGES: [TurnStage; 6] = [
        TurnStage::Init,
        TurnStage::DetectIntent,
        TurnStage::ProcessSlot,
        TurnStage::PromptSlot,
        TurnStage::AwaitingSlot,
        TurnStage::Complete,
    ];

    const ALL_EVENTS: [TurnEvent; 9] = [
        TurnEvent::Initialized,
        TurnEvent::MessageReceived,
        TurnEvent::Classified(IntentClass::Fill),
        TurnEvent::Classified(IntentClass::Restart),
        TurnEvent::Classified(IntentClass::Unrecognized),
        TurnEvent::Committed,
        TurnEvent::Rejected,
        TurnEvent::Prompted { complete: true },
        TurnEvent::Prompted { complete: false },
    ];

    fn run(start: TurnStage, events: &[TurnEvent]) -> TurnStage {
        events
            .iter()
            .fold(start, |stage, event| stage.on(*event).unwrap())
    }

    #[test]
    fn first_message_runs_from_init() {
        assert_eq!(TurnStage::entry(None), TurnStage::Init);
        let end = run(
            TurnStage::Init,
            &[
                TurnEvent::Initialized,
                TurnEvent::Classified(IntentClass::Fill),
                TurnEvent::Committed,
                TurnEvent::Prompted { complete: false },
            ],
        );
        assert_eq!(end, TurnStage::AwaitingSlot);
    }

    #[test]
    fn unrecognized_skips_processing() {
        let end = run(
            TurnStage::AwaitingSlot,
            &[
                TurnEvent::MessageReceived,
                TurnEvent::Classified(IntentClass::Unrecognized),
                TurnEvent::Prompted { complete: false },
            ],
        );
        assert_eq!(end, TurnStage::AwaitingSlot);
    }

    #[test]
    fn rejection_still_prompts() {
        assert_eq!(
            TurnStage::ProcessSlot.on(TurnEvent::Rejected),
            Ok(TurnStage::PromptSlot)
        );
    }

    #[test]
    fn complete_accepts_new_messages() {
        assert_eq!(
            TurnStage::entry(Some(BookingPhase::Complete)),
            TurnStage::Complete
        );
        let end = run(
            TurnStage::Complete,
            &[
                TurnEvent::MessageReceived,
                TurnEvent::Classified(IntentClass::Restart),
                TurnEvent::Prompted { complete: false },
            ],
        );
        assert_eq!(end, TurnStage::AwaitingSlot);
    }

    #[test]
    fn out_of_sequence_events_are_errors() {
        let err = TurnStage::Init.on(TurnEvent::Committed).unwrap_err();
        assert_eq!(err.stage, TurnStage::Init);
        assert!(TurnStage::DetectIntent.on(TurnEvent::Prompted { complete: true }).is_err());
    }

    #[test]
    fn transition_function_is_total_and_deterministic() {
        for stage in ALL_STAGES {
            for event in ALL_EVENTS {
                // Either a single successor or a typed error, identically every time.
                assert_eq!(stage.on(event), stage.on(event));
            }
        }
    }

    #[test]
    fn every_stage_has_a_successor() {
        for stage in ALL_STAGES {
            let successors = ALL_EVENTS
                .iter()
                .filter_map(|event| stage.on(*event).ok())
                .count();
            assert!(successors > 0, "{} has no successor", stage);
        }
    }
}
