//! Slot processing: resolve, validate, commit and cascade.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::slots::{Candidate, Resolution, SlotName, SlotRegistry};
use crate::ports::{LookupError, LookupGateway};

use super::state::{CascadePolicy, Commit, ConversationState, InvariantViolation};

/// Why a proposed value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No candidate matches the text.
    NoMatch,
    /// More than one candidate matches; listed in catalog order.
    Ambiguous { candidates: Vec<Candidate> },
    /// An upstream slot must be filled before this one.
    PrerequisiteMissing { missing: SlotName },
}

/// A user supplied value that could not be committed.
///
/// Recovered locally: the turn re-prompts and state stays as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailed {
    pub slot: SlotName,
    pub text: String,
    pub reason: FailureReason,
}

/// Result of processing one proposed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    /// The value was committed; `commit.state` is the state to persist.
    Committed {
        slot: SlotName,
        candidate: Candidate,
        commit: Commit,
    },
    Rejected(ValidationFailed),
}

/// Failures that abort the turn instead of re-prompting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Validates proposed values against the lookup gateway and commits them.
///
/// The same rules apply whether the slot is the next one to fill or was
/// targeted by a change request.
#[derive(Clone)]
pub struct SlotProcessor {
    registry: Arc<SlotRegistry>,
    gateway: Arc<dyn LookupGateway>,
    policy: CascadePolicy,
}

impl SlotProcessor {
    pub fn new(
        registry: Arc<SlotRegistry>,
        gateway: Arc<dyn LookupGateway>,
        policy: CascadePolicy,
    ) -> Self {
        Self {
            registry,
            gateway,
            policy,
        }
    }

    pub fn policy(&self) -> CascadePolicy {
        self.policy
    }

    /// Resolves `text` for `target` and commits it on a unique match.
    ///
    /// `state` is never modified. On success the returned commit carries
    /// the new state with the cascade already applied.
    ///
    /// # Errors
    ///
    /// - `Lookup` if the gateway fails
    /// - `Invariant` if `target` is not registered or the commit would
    ///   break the state's structural guarantees
    pub async fn process(
        &self,
        state: &ConversationState,
        target: &SlotName,
        text: &str,
    ) -> Result<SlotOutcome, ProcessError> {
        let slot = self
            .registry
            .slot_by_name(target)
            .map_err(|_| InvariantViolation::UnknownSlot(target.clone()))?;

        if let Some(next) = state.next_unfilled(&self.registry) {
            if next.order() < slot.order() {
                return Ok(self.reject(
                    target,
                    text,
                    FailureReason::PrerequisiteMissing {
                        missing: next.name().clone(),
                    },
                ));
            }
        }

        let constraints = state.constraints_for(slot);
        let resolution = self
            .gateway
            .resolve(slot.lookup_kind(), text, &constraints)
            .await?;

        let candidate = match resolution {
            Resolution::Unique(candidate) => candidate,
            Resolution::NotFound => return Ok(self.reject(target, text, FailureReason::NoMatch)),
            Resolution::Ambiguous(candidates) => {
                return Ok(self.reject(target, text, FailureReason::Ambiguous { candidates }))
            }
        };

        let commit = state.commit(&self.registry, target, candidate.clone(), self.policy)?;
        tracing::debug!(
            thread_id = %state.thread_id(),
            slot = %target,
            candidate = %candidate.id,
            cleared = commit.cleared.len(),
            "Slot committed"
        );

        Ok(SlotOutcome::Committed {
            slot: target.clone(),
            candidate,
            commit,
        })
    }

    fn reject(&self, slot: &SlotName, text: &str, reason: FailureReason) -> SlotOutcome {
        tracing::debug!(slot = %slot, text = %text, reason = ?reason, "Slot value rejected");
        SlotOutcome::Rejected(ValidationFailed {
            slot: slot.clone(),
            text: text.to_string(),
            reason,
        })
    }
}

impl std::fmt::Debug for SlotProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotProcessor")
            .field("slots", &self.registry.len())
            .field("policy", &self.policy)
            .finish()
    }
}
