//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - Token verification
//! - `catalog` - Lookup gateway implementations
//! - `storage` - Conversation store implementations
//! - `websocket` - Real-time transport
//! - `http` - Router assembly, banner and health endpoints

pub mod auth;
pub mod catalog;
pub mod http;
pub mod storage;
pub mod websocket;
