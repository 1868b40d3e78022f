//! Reply generation.
//!
//! Turns the state after a turn, plus what just happened, into the text sent
//! back to the user. Choices are always enumerated live from the gateway.

use std::sync::Arc;

use crate::domain::slots::{Candidate, Slot, SlotName, SlotRegistry};
use crate::ports::{LookupError, LookupGateway};

use super::intent::UnrecognizedReason;
use super::processor::{FailureReason, ValidationFailed};
use super::state::ConversationState;

/// What happened during the turn, reported ahead of the next question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptNotice {
    /// The next slot in order was filled.
    Committed { slot: SlotName, candidate: Candidate },
    /// A slot was set through a change request.
    Changed {
        slot: SlotName,
        candidate: Candidate,
        cleared: Vec<SlotName>,
    },
    Failure(ValidationFailed),
    Unrecognized(UnrecognizedReason),
    Restarted,
}

/// A rendered reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    /// The slot the reply asks for; `None` once the booking is complete.
    pub asked: Option<SlotName>,
}

/// Renders replies from conversation state.
#[derive(Clone)]
pub struct PromptGenerator {
    registry: Arc<SlotRegistry>,
    gateway: Arc<dyn LookupGateway>,
}

impl PromptGenerator {
    pub fn new(registry: Arc<SlotRegistry>, gateway: Arc<dyn LookupGateway>) -> Self {
        Self { registry, gateway }
    }

    /// Renders the reply for `state`, leading with `notice` if given.
    ///
    /// A complete booking renders the summary. Otherwise the first unfilled
    /// slot is asked for along with its current choices.
    pub async fn render(
        &self,
        state: &ConversationState,
        notice: Option<&PromptNotice>,
    ) -> Result<Prompt, LookupError> {
        let next = state.next_unfilled(&self.registry);

        let Some(slot) = next else {
            let mut lines = Vec::new();
            match notice {
                Some(PromptNotice::Committed { .. }) | None => {}
                Some(other) => {
                    if let Some(lead) = self.lead(state, other, None).await? {
                        lines.push(lead);
                    }
                }
            }
            lines.push(self.summary(state));
            return Ok(Prompt {
                text: lines.join("\n\n"),
                asked: None,
            });
        };

        let options = self.options_for(state, slot).await?;

        let text = match notice {
            Some(PromptNotice::Committed { slot: filled, candidate }) => {
                let filled_label = self.label_of(filled);
                match options_text(&options) {
                    Some(list) => format!(
                        "Great, {} selected for {}. Now choose {}: {}",
                        candidate.label,
                        filled_label,
                        slot.label(),
                        list
                    ),
                    None => format!(
                        "Great, {} selected for {}. Now choose {}. No options are currently available.",
                        candidate.label,
                        filled_label,
                        slot.label()
                    ),
                }
            }
            Some(other) => match self.lead(state, other, Some(slot)).await? {
                Some(lead) => format!("{} {}", lead, ask(slot, &options)),
                None => ask(slot, &options),
            },
            None => ask(slot, &options),
        };

        Ok(Prompt {
            text,
            asked: Some(slot.name().clone()),
        })
    }

    /// The completion summary listing every filled slot in order.
    pub fn summary(&self, state: &ConversationState) -> String {
        let mut text = format!("✅ {}", self.registry.summary_title());
        for (slot, value) in state.summary(&self.registry) {
            text.push_str(&format!("\n• {}: {}", capitalize(slot.label()), value.label));
        }
        text.push_str("\n\nLet me know if you'd like to change anything.");
        text
    }

    async fn lead(
        &self,
        state: &ConversationState,
        notice: &PromptNotice,
        asked: Option<&Slot>,
    ) -> Result<Option<String>, LookupError> {
        let lead = match notice {
            PromptNotice::Committed { slot, candidate } => {
                format!("Great, {} selected for {}.", candidate.label, self.label_of(slot))
            }
            PromptNotice::Changed { slot, candidate, .. } => {
                format!("Changed {} to {}.", self.label_of(slot), candidate.label)
            }
            PromptNotice::Restarted => "Starting a new booking.".to_string(),
            PromptNotice::Unrecognized(reason) => match reason {
                UnrecognizedReason::Empty => "I didn't catch that.".to_string(),
                UnrecognizedReason::UnknownSlotReference(mention) => {
                    format!("I don't know which detail '{}' refers to.", mention)
                }
                UnrecognizedReason::MissingValue => format!(
                    "Tell me what to change it to, for example 'change {} to <new value>'.",
                    self.first_label()
                ),
                UnrecognizedReason::MissingSlotReference => format!(
                    "Tell me which detail to change, for example 'change {} to <new value>'.",
                    self.first_label()
                ),
                UnrecognizedReason::AlreadyComplete => return Ok(None),
            },
            PromptNotice::Failure(failed) => self.failure(state, failed, asked).await?,
        };
        Ok(Some(lead))
    }

    async fn failure(
        &self,
        state: &ConversationState,
        failed: &ValidationFailed,
        asked: Option<&Slot>,
    ) -> Result<String, LookupError> {
        let label = self.label_of(&failed.slot);
        let text = match &failed.reason {
            FailureReason::NoMatch => {
                let base = format!("Sorry, '{}' isn't valid for {}.", failed.text, label);
                let reasked = asked.is_some_and(|s| s.name() == &failed.slot);
                match self.registry.slot_by_name(&failed.slot) {
                    Ok(slot) if !reasked => {
                        let choices = self.options_for(state, slot).await?;
                        match options_text(&choices) {
                            Some(list) => format!("{} Choices: {}.", base, list),
                            None => base,
                        }
                    }
                    _ => base,
                }
            }
            FailureReason::Ambiguous { candidates } => format!(
                "'{}' matches several {} options: {}. Please be more specific.",
                failed.text,
                label,
                options_text(candidates).unwrap_or_default()
            ),
            FailureReason::PrerequisiteMissing { missing } => format!(
                "Please choose a {} before the {}.",
                self.label_of(missing),
                label
            ),
        };
        Ok(text)
    }

    async fn options_for(
        &self,
        state: &ConversationState,
        slot: &Slot,
    ) -> Result<Vec<Candidate>, LookupError> {
        self.gateway
            .enumerate(slot.lookup_kind(), &state.constraints_for(slot))
            .await
    }

    fn label_of<'a>(&'a self, name: &'a SlotName) -> &'a str {
        self.registry
            .slot_by_name(name)
            .map(Slot::label)
            .unwrap_or_else(|_| name.as_str())
    }

    fn first_label(&self) -> &str {
        self.registry
            .ordered_slots()
            .first()
            .map(Slot::label)
            .unwrap_or("slot")
    }
}

impl std::fmt::Debug for PromptGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptGenerator")
            .field("slots", &self.registry.len())
            .finish()
    }
}

fn ask(slot: &Slot, options: &[Candidate]) -> String {
    let article = article_for(slot.label());
    match options_text(options) {
        Some(list) => format!("Please select {} {}. Options: {}", article, slot.label(), list),
        None => format!(
            "Please select {} {}. No options are currently available.",
            article,
            slot.label()
        ),
    }
}

fn options_text(options: &[Candidate]) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    Some(
        options
            .iter()
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn article_for(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
