//! Conversation Store Port - Interface for persisting conversation state.
//!
//! The store is a plain keyed load/save contract. Serializing turns on the
//! same thread is the engine's job (see `ThreadLocks`), so any key-value
//! backend can sit behind this port.

use async_trait::async_trait;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::ThreadId;

/// Errors that can occur during conversation storage operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Conversation store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize state: {0}")]
    SerializationFailed(String),

    #[error("Stored state for thread {thread_id} is corrupted: {reason}")]
    Corrupted { thread_id: ThreadId, reason: String },
}

/// Port for persisting and loading conversation state
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Find the stored state of a thread
    ///
    /// # Returns
    /// `None` if the thread has never been saved
    ///
    /// # Errors
    /// Returns `StoreError` if the backend cannot be read
    async fn find(&self, thread_id: &ThreadId) -> Result<Option<ConversationState>, StoreError>;

    /// Save conversation state
    ///
    /// Must not return `Ok` unless the state is durably stored.
    ///
    /// # Errors
    /// Returns `StoreError` if save fails
    async fn save(&self, thread_id: &ThreadId, state: &ConversationState)
        -> Result<(), StoreError>;

    /// Load conversation state, creating an empty one if absent
    ///
    /// The created state is not saved until the caller saves it.
    async fn load(&self, thread_id: &ThreadId) -> Result<ConversationState, StoreError> {
        Ok(self
            .find(thread_id)
            .await?
            .unwrap_or_else(|| ConversationState::new(thread_id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyStore;

    #[async_trait]
    impl ConversationStore for EmptyStore {
        async fn find(&self, _: &ThreadId) -> Result<Option<ConversationState>, StoreError> {
            Ok(None)
        }

        async fn save(&self, _: &ThreadId, _: &ConversationState) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn load_creates_default_state_when_absent() {
        let thread_id = ThreadId::new("fresh").unwrap();
        let state = EmptyStore.load(&thread_id).await.unwrap();
        assert_eq!(state.thread_id(), &thread_id);
        assert!(state.filled_slots().is_empty());
    }

    #[test]
    fn corrupted_error_names_thread() {
        let err = StoreError::Corrupted {
            thread_id: ThreadId::new("t-7").unwrap(),
            reason: "bad yaml".to_string(),
        };
        assert!(err.to_string().contains("t-7"));
    }
}
