//! In-Memory Conversation Store Adapter
//!
//! Keeps conversation state in a process-local map.
//! Useful for testing, development and single-instance deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::{ThreadId, Timestamp};
use crate::ports::{ConversationStore, StoreError};

/// In-memory storage for conversation state
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    states: Arc<RwLock<HashMap<ThreadId, ConversationState>>>,
}

impl InMemoryConversationStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data (useful for tests)
    pub async fn clear(&self) {
        self.states.write().await.clear();
    }

    /// Get the number of stored conversations
    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }

    /// Drop conversations not updated since `cutoff`.
    ///
    /// # Returns
    /// The number of conversations evicted
    pub async fn evict_older_than(&self, cutoff: Timestamp) -> usize {
        let mut states = self.states.write().await;
        let before = states.len();
        states.retain(|_, state| !state.last_updated().is_before(&cutoff));
        let evicted = before - states.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle conversations");
        }
        evicted
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn find(&self, thread_id: &ThreadId) -> Result<Option<ConversationState>, StoreError> {
        let states = self.states.read().await;
        Ok(states.get(thread_id).cloned())
    }

    async fn save(
        &self,
        thread_id: &ThreadId,
        state: &ConversationState,
    ) -> Result<(), StoreError> {
        let mut states = self.states.write().await;
        states.insert(thread_id.clone(), state.clone());
        Ok(())
    }
}
