//! Conversation domain module.
//!
//! The slot-filling state machine: per-thread booking state, intent
//! classification, value processing with cascade resets, and reply
//! rendering.

mod engine;
mod intent;
mod phase;
mod processor;
mod prompt;
mod state;

pub use engine::{IntentClass, TurnEvent, TurnStage, TurnTransitionError};
pub use intent::{Intent, PatternIntentResolver, UnrecognizedReason};
pub use phase::BookingPhase;
pub use processor::{FailureReason, ProcessError, SlotOutcome, SlotProcessor, ValidationFailed};
pub use prompt::{Prompt, PromptGenerator, PromptNotice};
pub use state::{CascadePolicy, Commit, ConversationState, InvariantViolation};
