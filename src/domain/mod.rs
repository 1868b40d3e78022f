//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machines)
//! - `slots` - Slot definitions, the registry, and candidate resolution
//! - `conversation` - Booking state, intent classification, slot processing and prompts

pub mod conversation;
pub mod foundation;
pub mod slots;
