//! Intent classification.
//!
//! Decides whether a message fills the current slot, changes a named slot,
//! restarts a finished booking, or cannot be classified at all.

use async_trait::async_trait;

use crate::domain::slots::{SlotName, SlotRegistry};
use crate::ports::IntentResolver;

use super::state::ConversationState;

/// What a user message is trying to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Treat the message as a value for the first unfilled slot.
    Continue,
    /// Set a specific slot, whether or not it is already filled.
    ChangeSlot {
        slot: SlotName,
        proposed_text: String,
    },
    /// Discard the finished booking and start again.
    Restart,
    /// Re-prompt without touching state.
    Unrecognized(UnrecognizedReason),
}

/// Why a message could not be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnrecognizedReason {
    /// The message was blank.
    Empty,
    /// A change was requested for a slot the registry does not know.
    UnknownSlotReference(String),
    /// A change phrase without a value after "to".
    MissingValue,
    /// A change phrase that names no slot before "to".
    MissingSlotReference,
    /// The booking is complete and the message was neither a change nor a restart.
    AlreadyComplete,
}

/// Keyword based intent classifier.
///
/// Recognizes `<verb> <slot> to <value>` where the verb is one of the
/// configured change verbs and the slot is any name, label or alias known to
/// the registry. The value keeps its original casing.
#[derive(Debug, Clone)]
pub struct PatternIntentResolver {
    change_verbs: Vec<String>,
    restart_phrases: Vec<String>,
}

impl Default for PatternIntentResolver {
    fn default() -> Self {
        Self {
            change_verbs: vec![
                "change".to_string(),
                "switch".to_string(),
                "update".to_string(),
            ],
            restart_phrases: vec![
                "new".to_string(),
                "another".to_string(),
                "restart".to_string(),
                "start over".to_string(),
            ],
        }
    }
}

impl PatternIntentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the verbs that introduce a change request.
    pub fn with_change_verbs<I, S>(mut self, verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.change_verbs = verbs.into_iter().map(|v| v.into().to_lowercase()).collect();
        self
    }

    /// Classifies an utterance. Pure and deterministic.
    pub fn classify_text(
        &self,
        utterance: &str,
        state: &ConversationState,
        registry: &SlotRegistry,
    ) -> Intent {
        let words: Vec<&str> = utterance.split_whitespace().collect();
        if words.is_empty() {
            return Intent::Unrecognized(UnrecognizedReason::Empty);
        }

        if let Some(intent) = self.match_change(&words, registry) {
            return intent;
        }

        if state.is_complete() {
            if self.is_restart(&words) {
                return Intent::Restart;
            }
            return Intent::Unrecognized(UnrecognizedReason::AlreadyComplete);
        }

        Intent::Continue
    }

    fn match_change(&self, words: &[&str], registry: &SlotRegistry) -> Option<Intent> {
        let verb_at = words
            .iter()
            .position(|w| self.change_verbs.iter().any(|v| v == &w.to_lowercase()))?;
        let rest = &words[verb_at + 1..];

        let to_at = match rest.iter().position(|w| w.eq_ignore_ascii_case("to")) {
            Some(i) => i,
            None => return Some(Intent::Unrecognized(UnrecognizedReason::MissingValue)),
        };

        let mentioned = strip_article(&rest[..to_at]).join(" ");
        let value = rest[to_at + 1..].join(" ");
        if value.is_empty() {
            return Some(Intent::Unrecognized(UnrecognizedReason::MissingValue));
        }

        if mentioned.is_empty() {
            return Some(Intent::Unrecognized(UnrecognizedReason::MissingSlotReference));
        }

        let intent = match registry.find_mentioned(&mentioned) {
            Some(slot) => Intent::ChangeSlot {
                slot: slot.name().clone(),
                proposed_text: value,
            },
            None => Intent::Unrecognized(UnrecognizedReason::UnknownSlotReference(mentioned)),
        };
        Some(intent)
    }

    fn is_restart(&self, words: &[&str]) -> bool {
        let text = words.join(" ").to_lowercase();
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        self.restart_phrases.iter().any(|phrase| {
            if phrase.contains(' ') {
                text.contains(phrase.as_str())
            } else {
                lowered
                    .iter()
                    .any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == phrase)
            }
        })
    }
}

fn strip_article<'a>(words: &'a [&'a str]) -> &'a [&'a str] {
    match words.first() {
        Some(first) if matches!(first.to_lowercase().as_str(), "the" | "my") => &words[1..],
        _ => words,
    }
}

#[async_trait]
impl IntentResolver for PatternIntentResolver {
    async fn classify(
        &self,
        utterance: &str,
        state: &ConversationState,
        registry: &SlotRegistry,
    ) -> Intent {
        self.classify_text(utterance, state, registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::CascadePolicy;
    use crate::domain::foundation::ThreadId;
    use crate::domain::slots::Candidate;

    fn registry() -> SlotRegistry {
        SlotRegistry::appointment_booking()
    }

    fn fresh() -> ConversationState {
        ConversationState::new(ThreadId::new("t-1").unwrap())
    }

    fn complete(registry: &SlotRegistry) -> ConversationState {
        let mut state = fresh();
        for slot in registry.ordered_slots() {
            state = state
                .commit(
                    registry,
                    slot.name(),
                    Candidate::new(slot.name().as_str(), slot.label()),
                    CascadePolicy::Always,
                )
                .unwrap()
                .state;
        }
        state
    }

    fn classify(text: &str, state: &ConversationState) -> Intent {
        PatternIntentResolver::default().classify_text(text, state, &registry())
    }

    mod change {
        use super::*;

        #[test]
        fn recognizes_change_slot_to_value() {
            let intent = classify("change hospital to North Hospital", &fresh());
            assert_eq!(
                intent,
                Intent::ChangeSlot {
                    slot: SlotName::new("hospital").unwrap(),
                    proposed_text: "North Hospital".to_string(),
                }
            );
        }

        #[test]
        fn accepts_other_verbs_articles_and_casing() {
            let intent = classify("Please SWITCH the Doctor to Dr. Perez", &fresh());
            assert!(matches!(
                intent,
                Intent::ChangeSlot { ref slot, ref proposed_text }
                    if slot.as_str() == "doctor" && proposed_text == "Dr. Perez"
            ));
        }

        #[test]
        fn resolves_multi_word_aliases() {
            let intent = classify("update time slot to 2024-05-02 09:30", &fresh());
            assert!(matches!(
                intent,
                Intent::ChangeSlot { ref slot, .. } if slot.as_str() == "timeslot"
            ));
        }

        #[test]
        fn unknown_slot_is_unrecognized() {
            let intent = classify("change insurance to Acme", &fresh());
            assert_eq!(
                intent,
                Intent::Unrecognized(UnrecognizedReason::UnknownSlotReference(
                    "insurance".to_string()
                ))
            );
        }

        #[test]
        fn change_without_value_is_unrecognized() {
            assert_eq!(
                classify("change hospital", &fresh()),
                Intent::Unrecognized(UnrecognizedReason::MissingValue)
            );
            assert_eq!(
                classify("change hospital to", &fresh()),
                Intent::Unrecognized(UnrecognizedReason::MissingValue)
            );
        }

        #[test]
        fn change_without_slot_asks_which_detail() {
            assert_eq!(
                classify("I'd like to change to North Hospital", &fresh()),
                Intent::Unrecognized(UnrecognizedReason::MissingSlotReference)
            );
            assert_eq!(
                classify("switch the to Cardiology", &fresh()),
                Intent::Unrecognized(UnrecognizedReason::MissingSlotReference)
            );
        }

        #[test]
        fn change_is_recognized_after_completion() {
            let registry = registry();
            let state = complete(&registry);
            let intent = PatternIntentResolver::default().classify_text(
                "change specialty to Dermatology",
                &state,
                &registry,
            );
            assert!(matches!(intent, Intent::ChangeSlot { .. }));
        }
    }

    mod continue_and_restart {
        use super::*;

        #[test]
        fn plain_text_continues_while_awaiting() {
            assert_eq!(classify("Central", &fresh()), Intent::Continue);
        }

        #[test]
        fn blank_text_is_unrecognized() {
            assert_eq!(
                classify("   ", &fresh()),
                Intent::Unrecognized(UnrecognizedReason::Empty)
            );
        }

        #[test]
        fn restart_words_only_apply_when_complete() {
            assert_eq!(classify("another one please", &fresh()), Intent::Continue);

            let registry = registry();
            let state = complete(&registry);
            let resolver = PatternIntentResolver::default();
            assert_eq!(
                resolver.classify_text("Book another one!", &state, &registry),
                Intent::Restart
            );
            assert_eq!(
                resolver.classify_text("let's start over", &state, &registry),
                Intent::Restart
            );
        }

        #[test]
        fn other_text_after_completion_is_unrecognized() {
            let registry = registry();
            let state = complete(&registry);
            assert_eq!(
                PatternIntentResolver::default().classify_text("thanks", &state, &registry),
                Intent::Unrecognized(UnrecognizedReason::AlreadyComplete)
            );
        }

        #[test]
        fn restart_does_not_match_inside_words() {
            let registry = registry();
            let state = complete(&registry);
            assert_eq!(
                PatternIntentResolver::default().classify_text("renewal", &state, &registry),
                Intent::Unrecognized(UnrecognizedReason::AlreadyComplete)
            );
        }
    }

    #[test]
    fn custom_change_verbs_replace_defaults() {
        let resolver = PatternIntentResolver::new().with_change_verbs(["Set"]);
        let registry = registry();
        let intent = resolver.classify_text("set hospital to Central", &fresh(), &registry);
        assert!(matches!(intent, Intent::ChangeSlot { .. }));
        assert_eq!(
            resolver.classify_text("change hospital to Central", &fresh(), &registry),
            Intent::Continue
        );
    }

    #[tokio::test]
    async fn port_delegates_to_pattern_matching() {
        let resolver: &dyn IntentResolver = &PatternIntentResolver::default();
        let intent = resolver.classify("change dr to Dr. Ruiz", &fresh(), &registry()).await;
        assert!(matches!(
            intent,
            Intent::ChangeSlot { ref slot, .. } if slot.as_str() == "doctor"
        ));
    }
}
