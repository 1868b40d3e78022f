//! Token Verifier Port - Transport-level authentication check.
//!
//! Runs before the engine is invoked; the engine itself never sees tokens.

use async_trait::async_trait;

use crate::domain::foundation::ThreadId;

/// Errors returned when a token is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Missing authentication token")]
    Missing,

    #[error("Invalid authentication token")]
    Invalid,
}

/// Port for validating the token sent alongside each message.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Accept or reject a token for a thread.
    async fn verify(&self, thread_id: &ThreadId, token: &str) -> Result<(), TokenError>;
}
