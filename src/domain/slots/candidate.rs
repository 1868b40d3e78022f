//! Candidate values and their resolution from free text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::SlotName;

/// A valid value for a slot, as supplied by the lookup gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable identifier understood by the catalog backend.
    pub id: String,
    /// Human readable label shown to the user.
    pub label: String,
}

impl Candidate {
    /// Creates a new candidate.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Committed upstream values that scope a lookup.
///
/// Specialties are looked up per hospital, doctors per hospital and
/// specialty, and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupConstraints(BTreeMap<SlotName, Candidate>);

impl LookupConstraints {
    /// Creates an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint, replacing any previous value for the slot.
    pub fn with(mut self, slot: SlotName, value: Candidate) -> Self {
        self.0.insert(slot, value);
        self
    }

    /// Returns the committed value for a slot, if constrained.
    pub fn get(&self, slot: &SlotName) -> Option<&Candidate> {
        self.0.get(slot)
    }

    /// Returns the committed value id for a slot name given as text.
    pub fn id_of(&self, slot: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name.as_str() == slot)
            .map(|(_, candidate)| candidate.id.as_str())
    }

    /// Iterates constraints in slot name order.
    pub fn iter(&self) -> impl Iterator<Item = (&SlotName, &Candidate)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(SlotName, Candidate)> for LookupConstraints {
    fn from_iter<T: IntoIterator<Item = (SlotName, Candidate)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of resolving user text against the candidates of a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one candidate matches.
    Unique(Candidate),
    /// Several candidates match; the user must be more specific.
    Ambiguous(Vec<Candidate>),
    /// Nothing matches.
    NotFound,
}

impl Resolution {
    /// Resolves free text against an ordered candidate list.
    ///
    /// Matching is case-insensitive. An exact label or id match wins
    /// outright. Otherwise a candidate matches when its label contains the
    /// text or the text contains its label. Matches keep catalog order, so
    /// identical inputs always resolve identically.
    pub fn match_text(text: &str, candidates: &[Candidate]) -> Self {
        let needle = normalize(text);
        if needle.is_empty() {
            return Resolution::NotFound;
        }

        if let Some(exact) = candidates
            .iter()
            .find(|c| normalize(&c.label) == needle || normalize(&c.id) == needle)
        {
            return Resolution::Unique(exact.clone());
        }

        let mut matches: Vec<Candidate> = candidates
            .iter()
            .filter(|c| {
                let label = normalize(&c.label);
                !label.is_empty() && (label.contains(&needle) || needle.contains(&label))
            })
            .cloned()
            .collect();

        match matches.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Unique(matches.remove(0)),
            _ => Resolution::Ambiguous(matches),
        }
    }

    /// Returns the unique candidate, if any.
    pub fn unique(&self) -> Option<&Candidate> {
        match self {
            Resolution::Unique(candidate) => Some(candidate),
            _ => None,
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
