//! ProcessTurn command handler.
//!
//! Runs one user message through the booking state machine: classify the
//! intent, validate and commit the value, render the reply, persist the
//! state. Turns on the same thread are serialized with [`ThreadLocks`].

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::conversation::{
    BookingPhase, CascadePolicy, ConversationState, Intent, IntentClass, InvariantViolation,
    ProcessError, PromptGenerator, PromptNotice, SlotOutcome, SlotProcessor, TurnEvent, TurnStage,
    TurnTransitionError, UnrecognizedReason,
};
use crate::domain::foundation::{ErrorCode, ThreadId, ValidationError};
use crate::domain::slots::{SlotName, SlotRegistry};
use crate::ports::{ConversationStore, IntentResolver, LookupError, LookupGateway, StoreError};

use super::thread_locks::ThreadLocks;

/// Longest message accepted in a single turn.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Command to process one user message.
#[derive(Debug, Clone)]
pub struct ProcessTurnCommand {
    pub thread_id: ThreadId,
    pub message: String,
}

impl ProcessTurnCommand {
    /// Creates a command, validating the thread id and message size.
    pub fn new(
        thread_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, ProcessTurnError> {
        let thread_id = ThreadId::new(thread_id)?;
        let message = message.into();
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ValidationError::invalid_format(
                "message",
                format!("must be at most {} characters", MAX_MESSAGE_LENGTH),
            )
            .into());
        }
        Ok(Self { thread_id, message })
    }
}

/// What the turn did, for clients and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Re-prompted without classifying a value (unrecognized input).
    Unrecognized,
    /// The next slot in order was filled.
    Committed,
    /// A change request set a previously filled slot.
    Changed,
    /// A value was rejected; state is unchanged.
    Rejected,
    /// The turn filled the last empty slot.
    Completed,
    /// A finished booking was discarded.
    Restarted,
}

/// Reply to a processed turn.
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub thread_id: ThreadId,
    pub message: String,
    pub phase: BookingPhase,
    pub outcome: TurnOutcome,
    /// The persisted state after the turn.
    pub state: ConversationState,
}

/// Errors that fail a turn. State is left exactly as it was before the turn.
#[derive(Debug, Clone, Error)]
pub enum ProcessTurnError {
    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] ValidationError),

    #[error("Intent classification timed out after {timeout_ms} ms")]
    IntentTimeout { timeout_ms: u64 },

    #[error("Lookup timed out after {timeout_ms} ms")]
    LookupTimeout { timeout_ms: u64 },

    #[error("Lookup service unavailable: {0}")]
    LookupUnavailable(String),

    #[error("Conversation store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Conversation invariant violated: {0}")]
    InvariantViolated(String),
}

impl ProcessTurnError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ProcessTurnError::InvalidCommand(_) => ErrorCode::ValidationFailed,
            ProcessTurnError::IntentTimeout { .. } => ErrorCode::IntentTimeout,
            ProcessTurnError::LookupTimeout { .. } => ErrorCode::LookupTimeout,
            ProcessTurnError::LookupUnavailable(_) => ErrorCode::LookupUnavailable,
            ProcessTurnError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            ProcessTurnError::InvariantViolated(_) => ErrorCode::InvariantViolated,
        }
    }

    /// True if the same message may be sent again unchanged.
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

impl From<LookupError> for ProcessTurnError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Timeout { timeout_ms, .. } => ProcessTurnError::LookupTimeout { timeout_ms },
            LookupError::Unavailable(msg) => ProcessTurnError::LookupUnavailable(msg),
        }
    }
}

impl From<StoreError> for ProcessTurnError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupted { .. } => ProcessTurnError::InvariantViolated(err.to_string()),
            other => ProcessTurnError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<ProcessError> for ProcessTurnError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Lookup(e) => e.into(),
            ProcessError::Invariant(e) => e.into(),
        }
    }
}

impl From<InvariantViolation> for ProcessTurnError {
    fn from(err: InvariantViolation) -> Self {
        ProcessTurnError::InvariantViolated(err.to_string())
    }
}

impl From<TurnTransitionError> for ProcessTurnError {
    fn from(err: TurnTransitionError) -> Self {
        ProcessTurnError::InvariantViolated(err.to_string())
    }
}

/// Tunables for the turn handler.
#[derive(Debug, Clone, Copy)]
pub struct TurnSettings {
    /// Bound on intent classification.
    pub intent_timeout: Duration,
    /// Bound on each gateway-backed step (processing, prompt rendering).
    pub lookup_timeout: Duration,
    /// Bound on each store call.
    pub store_timeout: Duration,
    pub cascade_policy: CascadePolicy,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            intent_timeout: Duration::from_millis(2000),
            lookup_timeout: Duration::from_millis(2000),
            store_timeout: Duration::from_millis(2000),
            cascade_policy: CascadePolicy::Always,
        }
    }
}

/// Handler for processing conversation turns.
#[derive(Clone)]
pub struct ProcessTurnHandler {
    registry: Arc<SlotRegistry>,
    store: Arc<dyn ConversationStore>,
    intents: Arc<dyn IntentResolver>,
    processor: SlotProcessor,
    prompts: PromptGenerator,
    locks: ThreadLocks,
    settings: TurnSettings,
}

/// State, notice and outcome produced by the intent/process stages.
struct Step {
    state: ConversationState,
    notice: Option<PromptNotice>,
    outcome: TurnOutcome,
}

impl ProcessTurnHandler {
    pub fn new(
        registry: Arc<SlotRegistry>,
        gateway: Arc<dyn LookupGateway>,
        store: Arc<dyn ConversationStore>,
        intents: Arc<dyn IntentResolver>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            processor: SlotProcessor::new(
                Arc::clone(&registry),
                Arc::clone(&gateway),
                settings.cascade_policy,
            ),
            prompts: PromptGenerator::new(Arc::clone(&registry), gateway),
            registry,
            store,
            intents,
            locks: ThreadLocks::new(),
            settings,
        }
    }

    /// The per-thread locks, for periodic pruning.
    pub fn locks(&self) -> &ThreadLocks {
        &self.locks
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    /// Processes one message.
    ///
    /// The reply is only returned once the resulting state is saved. On
    /// error nothing is saved and the stored state is untouched.
    ///
    /// # Errors
    ///
    /// - `IntentTimeout` if the intent resolver does not answer in time (retryable)
    /// - `LookupTimeout` / `LookupUnavailable` if the gateway fails (retryable)
    /// - `StoreUnavailable` if state cannot be read or saved (retryable)
    /// - `InvariantViolated` if stored state is corrupt
    pub async fn handle(&self, cmd: ProcessTurnCommand) -> Result<TurnReply, ProcessTurnError> {
        let thread_id = cmd.thread_id;
        let _guard = self.locks.acquire(&thread_id).await;

        let stored = self.bounded_store(self.store.find(&thread_id)).await?;
        let mut stage = TurnStage::entry(stored.as_ref().map(ConversationState::phase));
        let state = match stored {
            Some(state) => {
                state.verify(&self.registry)?;
                stage = self.advance(&thread_id, stage, TurnEvent::MessageReceived)?;
                state
            }
            None => {
                stage = self.advance(&thread_id, stage, TurnEvent::Initialized)?;
                ConversationState::new(thread_id.clone())
            }
        };

        let intent = self.classify(&cmd.message, &state).await?;
        let intent = self.guard_intent(intent, &state);

        let mut step = match intent {
            Intent::Continue => {
                stage = self.advance(&thread_id, stage, TurnEvent::Classified(IntentClass::Fill))?;
                // guard_intent only lets Continue through while a slot is open
                let target = state
                    .next_unfilled(&self.registry)
                    .map(|slot| slot.name().clone())
                    .ok_or(InvariantViolation::PhaseMismatch {
                        phase: state.phase(),
                        all_filled: true,
                    })?;
                self.fill(&mut stage, &state, &target, cmd.message.trim(), false)
                    .await?
            }
            Intent::ChangeSlot {
                slot,
                proposed_text,
            } => {
                stage = self.advance(&thread_id, stage, TurnEvent::Classified(IntentClass::Fill))?;
                self.fill(&mut stage, &state, &slot, &proposed_text, true)
                    .await?
            }
            Intent::Restart => {
                stage = self.advance(&thread_id, stage, TurnEvent::Classified(IntentClass::Restart))?;
                Step {
                    state: state.restarted(),
                    notice: Some(PromptNotice::Restarted),
                    outcome: TurnOutcome::Restarted,
                }
            }
            Intent::Unrecognized(reason) => {
                stage = self.advance(
                    &thread_id,
                    stage,
                    TurnEvent::Classified(IntentClass::Unrecognized),
                )?;
                tracing::debug!(thread_id = %thread_id, reason = ?reason, "Message not recognized");
                Step {
                    state: state.clone(),
                    notice: Some(PromptNotice::Unrecognized(reason)),
                    outcome: TurnOutcome::Unrecognized,
                }
            }
        };

        let prompt = self
            .bounded_lookup(self.prompts.render(&step.state, step.notice.as_ref()))
            .await?;
        let complete = step.state.is_complete();
        stage = self.advance(&thread_id, stage, TurnEvent::Prompted { complete })?;

        // Every answered turn counts as activity for expiry
        step.state.touch();
        self.bounded_store(self.store.save(&thread_id, &step.state))
            .await?;

        tracing::info!(
            thread_id = %thread_id,
            outcome = ?step.outcome,
            stage = %stage,
            filled = step.state.filled_slots().len(),
            "Turn processed"
        );

        Ok(TurnReply {
            thread_id,
            message: prompt.text,
            phase: step.state.phase(),
            outcome: step.outcome,
            state: step.state,
        })
    }

    /// Validates and commits a value, mapping the result to a turn step.
    async fn fill(
        &self,
        stage: &mut TurnStage,
        state: &ConversationState,
        target: &SlotName,
        text: &str,
        change_requested: bool,
    ) -> Result<Step, ProcessTurnError> {
        let outcome = self
            .bounded_lookup(self.processor.process(state, target, text))
            .await?;

        match outcome {
            SlotOutcome::Committed {
                slot,
                candidate,
                commit,
            } => {
                *stage = self.advance(state.thread_id(), *stage, TurnEvent::Committed)?;
                // A change request for an open slot is just an early fill
                let was_filled = state.is_filled(&slot);
                let notice = if change_requested && was_filled {
                    PromptNotice::Changed {
                        slot,
                        candidate,
                        cleared: commit.cleared,
                    }
                } else {
                    PromptNotice::Committed { slot, candidate }
                };
                let outcome = if commit.state.is_complete() && !state.is_complete() {
                    TurnOutcome::Completed
                } else if matches!(notice, PromptNotice::Changed { .. }) {
                    TurnOutcome::Changed
                } else {
                    TurnOutcome::Committed
                };
                Ok(Step {
                    state: commit.state,
                    notice: Some(notice),
                    outcome,
                })
            }
            SlotOutcome::Rejected(failed) => {
                *stage = self.advance(state.thread_id(), *stage, TurnEvent::Rejected)?;
                Ok(Step {
                    state: state.clone(),
                    notice: Some(PromptNotice::Failure(failed)),
                    outcome: TurnOutcome::Rejected,
                })
            }
        }
    }

    async fn classify(
        &self,
        message: &str,
        state: &ConversationState,
    ) -> Result<Intent, ProcessTurnError> {
        let limit = self.settings.intent_timeout;
        tokio::time::timeout(limit, self.intents.classify(message, state, &self.registry))
            .await
            .map_err(|_| {
                let timeout_ms = limit.as_millis() as u64;
                tracing::warn!(thread_id = %state.thread_id(), timeout_ms, "Intent classification timed out");
                ProcessTurnError::IntentTimeout { timeout_ms }
            })
    }

    /// Downgrades intents the current state cannot act on.
    fn guard_intent(&self, intent: Intent, state: &ConversationState) -> Intent {
        match intent {
            Intent::ChangeSlot { ref slot, .. } if !self.registry.contains(slot) => {
                Intent::Unrecognized(UnrecognizedReason::UnknownSlotReference(
                    slot.to_string(),
                ))
            }
            Intent::Continue if state.next_unfilled(&self.registry).is_none() => {
                Intent::Unrecognized(UnrecognizedReason::AlreadyComplete)
            }
            other => other,
        }
    }

    fn advance(
        &self,
        thread_id: &ThreadId,
        stage: TurnStage,
        event: TurnEvent,
    ) -> Result<TurnStage, ProcessTurnError> {
        let next = stage.on(event)?;
        tracing::debug!(thread_id = %thread_id, from = %stage, to = %next, "Turn stage");
        Ok(next)
    }

    async fn bounded_lookup<T, E>(
        &self,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, ProcessTurnError>
    where
        ProcessTurnError: From<E>,
    {
        let limit = self.settings.lookup_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(|e| {
                let err = ProcessTurnError::from(e);
                tracing::warn!(error = %err, "Lookup failed");
                err
            }),
            Err(_) => {
                tracing::warn!(timeout_ms = limit.as_millis() as u64, "Lookup timed out");
                Err(ProcessTurnError::LookupTimeout {
                    timeout_ms: limit.as_millis() as u64,
                })
            }
        }
    }

    async fn bounded_store<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, ProcessTurnError> {
        let limit = self.settings.store_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!(error = %e, "Conversation store failed");
                ProcessTurnError::from(e)
            }),
            Err(_) => {
                tracing::error!(timeout_ms = limit.as_millis() as u64, "Conversation store timed out");
                Err(ProcessTurnError::StoreUnavailable(format!(
                    "timed out after {} ms",
                    limit.as_millis()
                )))
            }
        }
    }
}

impl std::fmt::Debug for ProcessTurnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessTurnHandler")
            .field("slots", &self.registry.len())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::StaticCatalog;
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::domain::conversation::PatternIntentResolver;

    fn handler() -> (ProcessTurnHandler, Arc<InMemoryConversationStore>) {
        let store = Arc::new(InMemoryConversationStore::new());
        let handler = ProcessTurnHandler::new(
            Arc::new(SlotRegistry::appointment_booking()),
            Arc::new(StaticCatalog::appointment_demo()),
            store.clone(),
            Arc::new(PatternIntentResolver::default()),
            TurnSettings::default(),
        );
        (handler, store)
    }

    fn cmd(message: &str) -> ProcessTurnCommand {
        ProcessTurnCommand::new("t-1", message).unwrap()
    }

    mod command {
        use super::*;

        #[test]
        fn rejects_blank_thread_id() {
            let err = ProcessTurnCommand::new("  ", "hello").unwrap_err();
            assert!(matches!(err, ProcessTurnError::InvalidCommand(_)));
            assert!(!err.is_retryable());
        }

        #[test]
        fn rejects_oversized_message() {
            let err = ProcessTurnCommand::new("t-1", "x".repeat(MAX_MESSAGE_LENGTH + 1)).unwrap_err();
            assert_eq!(err.code(), ErrorCode::ValidationFailed);
        }
    }

    mod turns {
        use super::*;

        #[tokio::test]
        async fn first_message_fills_hospital_and_persists() {
            let (handler, store) = handler();

            let reply = handler.handle(cmd("Central")).await.unwrap();

            assert_eq!(reply.outcome, TurnOutcome::Committed);
            assert_eq!(reply.phase, BookingPhase::AwaitingSlot);
            assert!(reply.message.contains("Now choose specialty"));
            let saved = store.find(&reply.thread_id).await.unwrap().unwrap();
            assert_eq!(saved, reply.state);
        }

        #[tokio::test]
        async fn unrecognized_first_message_still_creates_state() {
            let (handler, store) = handler();

            let reply = handler.handle(cmd("   ")).await.unwrap();

            assert_eq!(reply.outcome, TurnOutcome::Unrecognized);
            assert!(reply.message.contains("Please select a hospital"));
            assert_eq!(store.len().await, 1);
        }

        #[tokio::test]
        async fn rejected_value_leaves_state_untouched() {
            let (handler, store) = handler();
            handler.handle(cmd("Central")).await.unwrap();
            let before = store.find(&ThreadId::new("t-1").unwrap()).await.unwrap().unwrap();

            let reply = handler.handle(cmd("Oncology")).await.unwrap();

            assert_eq!(reply.outcome, TurnOutcome::Rejected);
            assert!(reply.message.starts_with("Sorry, 'Oncology' isn't valid for specialty."));
            let after = store.find(&ThreadId::new("t-1").unwrap()).await.unwrap().unwrap();
            assert_eq!(before.filled_slots(), after.filled_slots());
            assert_eq!(before.phase(), after.phase());
        }

        #[tokio::test]
        async fn change_request_for_open_slot_is_a_fill() {
            let (handler, _) = handler();
            handler.handle(cmd("Central")).await.unwrap();

            let reply = handler
                .handle(cmd("change specialty to Dermatology"))
                .await
                .unwrap();

            assert_eq!(reply.outcome, TurnOutcome::Committed);
            assert!(reply.message.contains("Dr. Lopez"));
        }

        #[tokio::test]
        async fn restart_word_before_completion_is_a_value() {
            let (handler, _) = handler();

            let reply = handler.handle(cmd("new")).await.unwrap();

            assert_eq!(reply.outcome, TurnOutcome::Rejected);
        }
    }
}
