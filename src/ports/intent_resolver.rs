//! Intent Resolver Port - Classifies what a user message is trying to do.
//!
//! The engine only depends on the [`Intent`] contract. Matching may be
//! pattern based (see `PatternIntentResolver`) or delegated to an external
//! extraction service.

use async_trait::async_trait;

use crate::domain::conversation::{ConversationState, Intent};
use crate::domain::slots::SlotRegistry;

/// Port for classifying an utterance against the current conversation.
#[async_trait]
pub trait IntentResolver: Send + Sync {
    /// Classify an utterance.
    ///
    /// Never fails: anything that cannot be classified is
    /// [`Intent::Unrecognized`]. A `ChangeSlot` result always names a slot
    /// present in `registry`.
    async fn classify(
        &self,
        utterance: &str,
        state: &ConversationState,
        registry: &SlotRegistry,
    ) -> Intent;
}
