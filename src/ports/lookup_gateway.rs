//! Lookup Gateway Port - Interface to the catalog of bookable values.
//!
//! The gateway both enumerates the choices for a slot and validates what a
//! user typed. Implementations range from a static in-memory catalog to a
//! live hospital information system client.

use async_trait::async_trait;

use crate::domain::slots::{Candidate, LookupConstraints, LookupKind, Resolution};

/// Errors that can occur while querying the catalog.
///
/// Both variants are transient from the caller's point of view: the turn
/// fails, state is left as it was, and the client may retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Lookup for '{kind}' timed out after {timeout_ms} ms")]
    Timeout { kind: LookupKind, timeout_ms: u64 },

    #[error("Lookup service unavailable: {0}")]
    Unavailable(String),
}

impl LookupError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Port for enumerating and resolving slot values.
#[async_trait]
pub trait LookupGateway: Send + Sync {
    /// List the valid candidates for a slot kind, in presentation order.
    ///
    /// # Arguments
    /// * `kind` - Which catalog query to run
    /// * `constraints` - Committed upstream values scoping the query
    ///
    /// # Errors
    /// Returns `LookupError` if the backend cannot answer
    async fn enumerate(
        &self,
        kind: &LookupKind,
        constraints: &LookupConstraints,
    ) -> Result<Vec<Candidate>, LookupError>;

    /// Resolve user text to a candidate.
    ///
    /// Must be deterministic for identical inputs. The default matches the
    /// text against [`LookupGateway::enumerate`] with [`Resolution::match_text`].
    async fn resolve(
        &self,
        kind: &LookupKind,
        text: &str,
        constraints: &LookupConstraints,
    ) -> Result<Resolution, LookupError> {
        let candidates = self.enumerate(kind, constraints).await?;
        Ok(Resolution::match_text(text, &candidates))
    }
}
