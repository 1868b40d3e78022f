//! Application handlers.
//!
//! Command handlers that orchestrate domain operations across ports.

pub mod conversation;

pub use conversation::{
    ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler, ThreadLocks, TurnOutcome, TurnReply,
    TurnSettings,
};
