//! Slot definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Name of a slot, unique within a registry.
///
/// Stored lowercase so that lookups from user text are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotName(String);

impl SlotName {
    /// Creates a slot name, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into().trim().to_lowercase();
        if value.is_empty() {
            return Err(ValidationError::empty_field("slot_name"));
        }
        Ok(Self(value))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SlotName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SlotName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SlotName> for String {
    fn from(name: SlotName) -> Self {
        name.0
    }
}

/// Which lookup gateway query enumerates and validates a slot's values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupKind(String);

impl LookupKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One required piece of information, with a fixed place in the fill order.
///
/// Unless [`Slot::depends_on`] is called, a slot depends on every slot
/// ordered before it; the registry resolves that default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    name: SlotName,
    order: u32,
    label: String,
    lookup_kind: LookupKind,
    aliases: Vec<String>,
    depends_on: BTreeSet<SlotName>,
    inherit_upstream: bool,
}

impl Slot {
    /// Creates a slot whose label is its name.
    pub fn new(name: SlotName, order: u32, lookup_kind: LookupKind) -> Self {
        Self {
            label: name.as_str().to_string(),
            name,
            order,
            lookup_kind,
            aliases: Vec::new(),
            depends_on: BTreeSet::new(),
            inherit_upstream: true,
        }
    }

    /// Sets the label used in prompts and summaries.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Adds alternative words users may use to refer to this slot.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases
            .extend(aliases.into_iter().map(|a| a.into().trim().to_lowercase()));
        self
    }

    /// Declares the upstream slots this slot depends on explicitly.
    pub fn depends_on<I>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = SlotName>,
    {
        self.depends_on = slots.into_iter().collect();
        self.inherit_upstream = false;
        self
    }

    pub fn name(&self) -> &SlotName {
        &self.name
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn lookup_kind(&self) -> &LookupKind {
        &self.lookup_kind
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Slots whose change invalidates this slot's committed value.
    pub fn dependencies(&self) -> &BTreeSet<SlotName> {
        &self.depends_on
    }

    /// Returns every lowercase phrase that names this slot.
    pub fn mentions(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(std::iter::once(self.label.as_str()))
            .chain(self.aliases.iter().map(String::as_str))
    }

    pub(super) fn inherits_upstream(&self) -> bool {
        self.inherit_upstream
    }

    pub(super) fn resolve_dependencies(&mut self, upstream: BTreeSet<SlotName>) {
        self.depends_on = upstream;
        self.inherit_upstream = false;
    }
}
