//! Conversation command handlers.
//!
//! Processes booking turns with per-thread serialization.

mod process_turn;
mod thread_locks;

pub use process_turn::{
    ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler, TurnOutcome, TurnReply,
    TurnSettings, MAX_MESSAGE_LENGTH,
};
pub use thread_locks::ThreadLocks;
