//! Redis-backed conversation store for multi-instance deployments.
//!
//! State is stored as JSON under `{prefix}:{thread_id}` with an optional
//! expiry, so idle conversations are garbage-collected by Redis itself.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::ThreadId;
use crate::ports::{ConversationStore, StoreError};

const DEFAULT_KEY_PREFIX: &str = "slot_booking:conversation";

/// Redis-backed storage for conversation state.
#[derive(Clone)]
pub struct RedisConversationStore {
    conn: MultiplexedConnection,
    key_prefix: String,
    ttl_secs: Option<u64>,
}

impl RedisConversationStore {
    /// Create a new Redis store without expiry.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl_secs: None,
        }
    }

    /// Expire conversations `ttl_secs` after their last save.
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = Some(ttl_secs).filter(|ttl| *ttl > 0);
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn key(&self, thread_id: &ThreadId) -> String {
        redis_key(&self.key_prefix, thread_id)
    }
}

fn redis_key(prefix: &str, thread_id: &ThreadId) -> String {
    format!("{}:{}", prefix, thread_id)
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    async fn find(&self, thread_id: &ThreadId) -> Result<Option<ConversationState>, StoreError> {
        let mut conn = self.conn.clone();

        let json: Option<String> = conn
            .get(self.key(thread_id))
            .await
            .map_err(|e: redis::RedisError| StoreError::Unavailable(e.to_string()))?;

        json.map(|json| {
            serde_json::from_str(&json).map_err(|e| StoreError::Corrupted {
                thread_id: thread_id.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    async fn save(
        &self,
        thread_id: &ThreadId,
        state: &ConversationState,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.key(thread_id)).arg(json);
        if let Some(ttl) = self.ttl_secs {
            cmd.arg("EX").arg(ttl);
        }

        cmd.query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(())
    }
}
