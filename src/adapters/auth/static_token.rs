//! Static token verification.
//!
//! Implements the `TokenVerifier` port without an external identity
//! provider. With no tokens registered any non-blank token is accepted;
//! once tokens are registered only those pass.
//!
//! # Example
//!
//! ```ignore
//! use slot_booking::adapters::auth::StaticTokenVerifier;
//!
//! let verifier = StaticTokenVerifier::new().with_token("secret");
//! assert!(verifier.verify(&thread_id, "secret").await.is_ok());
//! ```

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::foundation::ThreadId;
use crate::ports::{TokenError, TokenVerifier};

/// Token verifier backed by an in-process allowlist.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    allowed: HashSet<String>,
}

impl StaticTokenVerifier {
    /// Creates a verifier that accepts any non-blank token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts accepted tokens, adding `token` to the allowlist.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.allowed.insert(token.into());
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, thread_id: &ThreadId, token: &str) -> Result<(), TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Missing);
        }
        if !self.allowed.is_empty() && !self.allowed.contains(token) {
            tracing::debug!(thread_id = %thread_id, "Token rejected");
            return Err(TokenError::Invalid);
        }
        Ok(())
    }
}
