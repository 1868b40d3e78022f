//! Slot registry.
//!
//! The ordered, immutable description of what a conversation must collect.
//! Swapping the registry (and the catalog behind the lookup gateway) is all
//! it takes to repurpose the engine for another guided-form domain.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use thiserror::Error;

use super::{LookupKind, Slot, SlotName};
use crate::domain::foundation::ValidationError;

/// Errors raised while building or querying a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotRegistryError {
    #[error("A slot registry needs at least one slot")]
    Empty,

    #[error("Slot '{0}' is defined more than once")]
    DuplicateName(SlotName),

    #[error("Slots '{first}' and '{second}' share order position {order}")]
    DuplicateOrder {
        order: u32,
        first: SlotName,
        second: SlotName,
    },

    #[error("Slot '{slot}' depends on unknown slot '{dependency}'")]
    UnknownDependency { slot: SlotName, dependency: SlotName },

    #[error("Slot '{slot}' depends on '{dependency}', which is not ordered before it")]
    DependencyNotUpstream { slot: SlotName, dependency: SlotName },

    #[error("Slot '{0}' is not registered")]
    NotFound(String),

    #[error("Invalid slot name: {0}")]
    InvalidName(#[from] ValidationError),
}

/// Ordered set of slot definitions with precomputed dependents.
#[derive(Debug, Clone)]
pub struct SlotRegistry {
    slots: Vec<Slot>,
    dependents: HashMap<SlotName, Vec<SlotName>>,
    summary_title: String,
}

impl SlotRegistry {
    /// Builds a registry, validating names, orders and dependencies.
    pub fn new(mut slots: Vec<Slot>) -> Result<Self, SlotRegistryError> {
        if slots.is_empty() {
            return Err(SlotRegistryError::Empty);
        }
        slots.sort_by_key(Slot::order);

        let mut seen = HashSet::new();
        for pair in slots.windows(2) {
            if pair[0].order() == pair[1].order() {
                return Err(SlotRegistryError::DuplicateOrder {
                    order: pair[0].order(),
                    first: pair[0].name().clone(),
                    second: pair[1].name().clone(),
                });
            }
        }
        for slot in &slots {
            if !seen.insert(slot.name().clone()) {
                return Err(SlotRegistryError::DuplicateName(slot.name().clone()));
            }
        }

        let positions: HashMap<SlotName, usize> = slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name().clone(), i))
            .collect();

        for index in 0..slots.len() {
            if slots[index].inherits_upstream() {
                let upstream: BTreeSet<SlotName> =
                    slots[..index].iter().map(|s| s.name().clone()).collect();
                slots[index].resolve_dependencies(upstream);
                continue;
            }
            for dependency in slots[index].dependencies() {
                match positions.get(dependency) {
                    None => {
                        return Err(SlotRegistryError::UnknownDependency {
                            slot: slots[index].name().clone(),
                            dependency: dependency.clone(),
                        })
                    }
                    Some(&pos) if pos >= index => {
                        return Err(SlotRegistryError::DependencyNotUpstream {
                            slot: slots[index].name().clone(),
                            dependency: dependency.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        let dependents = compute_dependents(&slots, &positions);

        Ok(Self {
            slots,
            dependents,
            summary_title: "All details collected.".to_string(),
        })
    }

    /// Sets the heading of the completion summary.
    pub fn with_summary_title(mut self, title: impl Into<String>) -> Self {
        self.summary_title = title.into();
        self
    }

    /// The canonical hospital → specialty → doctor → timeslot chain.
    pub fn try_appointment_booking() -> Result<Self, SlotRegistryError> {
        let slot = |name: &str, order: u32| -> Result<Slot, SlotRegistryError> {
            Ok(Slot::new(SlotName::new(name)?, order, LookupKind::new(name)))
        };
        let slots = vec![
            slot("hospital", 1)?,
            slot("specialty", 2)?.with_aliases(["speciality"]),
            slot("doctor", 3)?.with_aliases(["dr"]),
            slot("timeslot", 4)?
                .with_label("time slot")
                .with_aliases(["time", "date", "appointment time"]),
        ];
        Ok(Self::new(slots)?.with_summary_title("Your appointment is booked!"))
    }

    /// Infallible form of [`Self::try_appointment_booking`].
    ///
    /// The built-in definition is fixed and covered by tests, so the error
    /// branch cannot be reached.
    pub fn appointment_booking() -> Self {
        match Self::try_appointment_booking() {
            Ok(registry) => registry,
            Err(e) => unreachable!("built-in registry is valid: {}", e),
        }
    }

    /// Slots in fill order.
    pub fn ordered_slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Looks up a slot by name.
    pub fn slot_by_name(&self, name: &SlotName) -> Result<&Slot, SlotRegistryError> {
        self.slots
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| SlotRegistryError::NotFound(name.to_string()))
    }

    /// Looks up a slot by name, label or alias, case-insensitively.
    pub fn find_mentioned(&self, phrase: &str) -> Option<&Slot> {
        let phrase = phrase.trim().to_lowercase();
        self.slots
            .iter()
            .find(|s| s.mentions().any(|m| m == phrase))
    }

    /// Slots invalidated when `name` changes, in fill order.
    ///
    /// This is the transitive closure of declared dependencies, widened to
    /// a suffix of the fill order so no filled slot can sit behind an
    /// empty one after a cascade.
    pub fn dependents_of(&self, name: &SlotName) -> Result<&[SlotName], SlotRegistryError> {
        self.dependents
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SlotRegistryError::NotFound(name.to_string()))
    }

    /// Slots whose committed values scope the lookup for `name`.
    pub fn constraint_slots(&self, name: &SlotName) -> Result<&BTreeSet<SlotName>, SlotRegistryError> {
        self.slot_by_name(name).map(Slot::dependencies)
    }

    pub fn summary_title(&self) -> &str {
        &self.summary_title
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, name: &SlotName) -> bool {
        self.dependents.contains_key(name)
    }
}

fn compute_dependents(
    slots: &[Slot],
    positions: &HashMap<SlotName, usize>,
) -> HashMap<SlotName, Vec<SlotName>> {
    let mut direct: HashMap<&SlotName, Vec<&SlotName>> = HashMap::new();
    for slot in slots {
        for dependency in slot.dependencies() {
            direct.entry(dependency).or_default().push(slot.name());
        }
    }

    slots
        .iter()
        .map(|slot| {
            let mut reached: HashSet<&SlotName> = HashSet::new();
            let mut queue: VecDeque<&SlotName> = VecDeque::from([slot.name()]);
            while let Some(current) = queue.pop_front() {
                for &next in direct.get(current).into_iter().flatten() {
                    if reached.insert(next) {
                        queue.push_back(next);
                    }
                }
            }

            let earliest = reached.iter().filter_map(|n| positions.get(*n)).min();
            let closure = match earliest {
                Some(&start) => slots[start..].iter().map(|s| s.name().clone()).collect(),
                None => Vec::new(),
            };
            (slot.name().clone(), closure)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> SlotName {
        SlotName::new(s).unwrap()
    }

    fn slot(s: &str, order: u32) -> Slot {
        Slot::new(name(s), order, LookupKind::new(s))
    }

    fn names(list: &[SlotName]) -> Vec<&str> {
        list.iter().map(SlotName::as_str).collect()
    }

    mod construction {
        use super::*;

        #[test]
        fn sorts_slots_by_order() {
            let registry = SlotRegistry::new(vec![slot("b", 2), slot("a", 1)]).unwrap();
            let order: Vec<&str> = registry
                .ordered_slots()
                .iter()
                .map(|s| s.name().as_str())
                .collect();
            assert_eq!(order, vec!["a", "b"]);
        }

        #[test]
        fn rejects_empty_registry() {
            assert_eq!(SlotRegistry::new(vec![]).unwrap_err(), SlotRegistryError::Empty);
        }

        #[test]
        fn rejects_duplicate_names() {
            let err = SlotRegistry::new(vec![slot("a", 1), slot("a", 2)]).unwrap_err();
            assert_eq!(err, SlotRegistryError::DuplicateName(name("a")));
        }

        #[test]
        fn rejects_duplicate_orders() {
            let err = SlotRegistry::new(vec![slot("a", 1), slot("b", 1)]).unwrap_err();
            assert!(matches!(err, SlotRegistryError::DuplicateOrder { order: 1, .. }));
        }

        #[test]
        fn rejects_unknown_dependency() {
            let err = SlotRegistry::new(vec![slot("a", 1), slot("b", 2).depends_on([name("zz")])])
                .unwrap_err();
            assert!(matches!(err, SlotRegistryError::UnknownDependency { .. }));
        }

        #[test]
        fn rejects_downstream_dependency() {
            let err = SlotRegistry::new(vec![slot("a", 1).depends_on([name("b")]), slot("b", 2)])
                .unwrap_err();
            assert!(matches!(err, SlotRegistryError::DependencyNotUpstream { .. }));
        }

        #[test]
        fn default_dependencies_are_all_upstream_slots() {
            let registry =
                SlotRegistry::new(vec![slot("a", 1), slot("b", 2), slot("c", 3)]).unwrap();
            let deps: Vec<&str> = registry
                .constraint_slots(&name("c"))
                .unwrap()
                .iter()
                .map(SlotName::as_str)
                .collect();
            assert_eq!(deps, vec!["a", "b"]);
        }
    }

    mod dependents {
        use super::*;

        #[test]
        fn default_policy_clears_everything_downstream() {
            let registry = SlotRegistry::appointment_booking();
            assert_eq!(
                names(registry.dependents_of(&name("hospital")).unwrap()),
                vec!["specialty", "doctor", "timeslot"]
            );
            assert_eq!(
                names(registry.dependents_of(&name("doctor")).unwrap()),
                vec!["timeslot"]
            );
            assert!(registry.dependents_of(&name("timeslot")).unwrap().is_empty());
        }

        #[test]
        fn closure_is_transitive() {
            let registry = SlotRegistry::new(vec![
                slot("a", 1),
                slot("b", 2).depends_on([name("a")]),
                slot("c", 3).depends_on([name("b")]),
            ])
            .unwrap();
            assert_eq!(names(registry.dependents_of(&name("a")).unwrap()), vec!["b", "c"]);
        }

        #[test]
        fn closure_is_widened_to_a_suffix() {
            // c does not depend on a, but sits after b which does.
            let registry = SlotRegistry::new(vec![
                slot("a", 1),
                slot("b", 2).depends_on([name("a")]),
                slot("c", 3).depends_on(Vec::<SlotName>::new()),
            ])
            .unwrap();
            assert_eq!(names(registry.dependents_of(&name("a")).unwrap()), vec!["b", "c"]);
        }

        #[test]
        fn independent_slot_has_no_dependents() {
            let registry = SlotRegistry::new(vec![
                slot("a", 1),
                slot("b", 2).depends_on(Vec::<SlotName>::new()),
            ])
            .unwrap();
            assert!(registry.dependents_of(&name("a")).unwrap().is_empty());
        }

        #[test]
        fn unknown_slot_is_not_found() {
            let registry = SlotRegistry::appointment_booking();
            assert!(matches!(
                registry.dependents_of(&name("insurance")),
                Err(SlotRegistryError::NotFound(_))
            ));
        }
    }

    mod lookup {
        use super::*;

        #[test]
        fn built_in_registry_builds_in_order() {
            let registry = SlotRegistry::try_appointment_booking().unwrap();
            let names: Vec<&str> = registry
                .ordered_slots()
                .iter()
                .map(|s| s.name().as_str())
                .collect();
            assert_eq!(names, ["hospital", "specialty", "doctor", "timeslot"]);
        }

        #[test]
        fn find_mentioned_matches_aliases() {
            let registry = SlotRegistry::appointment_booking();
            assert_eq!(
                registry.find_mentioned("Time").map(|s| s.name().as_str()),
                Some("timeslot")
            );
            assert_eq!(
                registry.find_mentioned("time slot").map(|s| s.name().as_str()),
                Some("timeslot")
            );
            assert!(registry.find_mentioned("insurance").is_none());
        }

        #[test]
        fn slot_by_name_reports_missing_slot() {
            let registry = SlotRegistry::appointment_booking();
            assert!(registry.slot_by_name(&name("doctor")).is_ok());
            assert!(registry.slot_by_name(&name("nurse")).is_err());
        }
    }
}
