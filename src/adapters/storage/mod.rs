//! Storage Adapters
//!
//! Implementations of the ConversationStore port.
//!
//! ## Available Adapters
//!
//! - **InMemoryConversationStore** - Process-local map (testing/development)
//! - **FileConversationStore** - One YAML file per thread on disk
//! - **RedisConversationStore** - JSON values in Redis with optional expiry
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileConversationStore, InMemoryConversationStore};
//!
//! // Local runs: file-based storage
//! let store = FileConversationStore::new("./data/conversations");
//!
//! // Testing: in-memory storage
//! let store = InMemoryConversationStore::new();
//! ```

mod file_conversation_store;
mod in_memory_conversation_store;
mod redis_conversation_store;

pub use file_conversation_store::FileConversationStore;
pub use in_memory_conversation_store::InMemoryConversationStore;
pub use redis_conversation_store::RedisConversationStore;
