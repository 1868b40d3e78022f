//! Slots domain module.
//!
//! Describes what a booking conversation collects (the slot registry) and
//! the values those slots can take (candidates resolved from the catalog).

mod candidate;
mod registry;
mod slot;

pub use candidate::{Candidate, LookupConstraints, Resolution};
pub use registry::{SlotRegistry, SlotRegistryError};
pub use slot::{LookupKind, Slot, SlotName};
