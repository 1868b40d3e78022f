//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary of the booking domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{ErrorCode, ValidationError};
pub use ids::{ConnectionId, ThreadId, MAX_THREAD_ID_LENGTH};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
