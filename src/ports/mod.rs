//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the booking engine and the outside world. Adapters implement these ports.
//!
//! - `LookupGateway` - Catalog of hospitals, specialties, doctors and timeslots
//! - `ConversationStore` - Keyed persistence of per-thread conversation state
//! - `IntentResolver` - Classification of user utterances
//! - `TokenVerifier` - Transport authentication check

mod conversation_store;
mod intent_resolver;
mod lookup_gateway;
mod token_verifier;

pub use conversation_store::{ConversationStore, StoreError};
pub use intent_resolver::IntentResolver;
pub use lookup_gateway::{LookupError, LookupGateway};
pub use token_verifier::{TokenError, TokenVerifier};
