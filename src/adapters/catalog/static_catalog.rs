//! Static in-memory catalog.
//!
//! Serves a fixed list of candidates per lookup kind, each optionally scoped
//! by the ids committed to upstream slots. Used for local runs and tests; a
//! live hospital information system client would replace it in production.

use async_trait::async_trait;

use crate::domain::slots::{Candidate, LookupConstraints, LookupKind};
use crate::ports::{LookupError, LookupGateway};

/// One catalog row: a candidate and the upstream ids it is offered under.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CatalogEntry {
    kind: LookupKind,
    candidate: Candidate,
    requires: Vec<(String, String)>,
}

impl CatalogEntry {
    fn offered_under(&self, constraints: &LookupConstraints) -> bool {
        self.requires
            .iter()
            .all(|(slot, id)| constraints.id_of(slot) == Some(id.as_str()))
    }
}

/// Fixed catalog implementing [`LookupGateway`].
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalog {
    pub fn builder() -> StaticCatalogBuilder {
        StaticCatalogBuilder::default()
    }

    /// Demo data for the appointment booking registry.
    pub fn appointment_demo() -> Self {
        let central = [("hospital", "central")];
        let north = [("hospital", "north")];
        let central_cardiology = [("hospital", "central"), ("specialty", "cardiology")];

        Self::builder()
            .entry("hospital", "central", "Central Hospital", &[])
            .entry("hospital", "north", "North Hospital", &[])
            .entry("specialty", "cardiology", "Cardiology", &central)
            .entry("specialty", "dermatology", "Dermatology", &central)
            .entry("specialty", "pediatrics", "Pediatrics", &north)
            .entry("specialty", "traumatology", "Traumatology", &north)
            .entry("doctor", "garcia", "Dr. Garcia", &central_cardiology)
            .entry("doctor", "perez", "Dr. Perez", &central_cardiology)
            .entry(
                "doctor",
                "lopez",
                "Dr. Lopez",
                &[("hospital", "central"), ("specialty", "dermatology")],
            )
            .entry(
                "doctor",
                "ruiz",
                "Dr. Ruiz",
                &[("hospital", "north"), ("specialty", "pediatrics")],
            )
            .entry(
                "doctor",
                "fernandez",
                "Dr. Fernandez",
                &[("hospital", "north"), ("specialty", "traumatology")],
            )
            .entry(
                "doctor",
                "ortega",
                "Dr. Ortega",
                &[("hospital", "north"), ("specialty", "traumatology")],
            )
            .timeslots(
                &[("hospital", "central"), ("specialty", "cardiology"), ("doctor", "garcia")],
                &["2024-05-01 10:00", "2024-05-01 12:00"],
            )
            .timeslots(
                &[("hospital", "central"), ("specialty", "cardiology"), ("doctor", "perez")],
                &["2024-05-02 09:30"],
            )
            .timeslots(
                &[("hospital", "north"), ("specialty", "pediatrics"), ("doctor", "ruiz")],
                &["2024-05-03 15:00", "2024-05-04 11:00"],
            )
            .build()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LookupGateway for StaticCatalog {
    async fn enumerate(
        &self,
        kind: &LookupKind,
        constraints: &LookupConstraints,
    ) -> Result<Vec<Candidate>, LookupError> {
        let candidates: Vec<Candidate> = self
            .entries
            .iter()
            .filter(|e| &e.kind == kind && e.offered_under(constraints))
            .map(|e| e.candidate.clone())
            .collect();
        tracing::trace!(kind = %kind, count = candidates.len(), "Catalog enumerated");
        Ok(candidates)
    }
}

/// Builder for [`StaticCatalog`]. Entries keep insertion order.
#[derive(Debug, Default)]
pub struct StaticCatalogBuilder {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalogBuilder {
    /// Adds a candidate offered when every `(slot, id)` in `requires` is committed.
    pub fn entry(mut self, kind: &str, id: &str, label: &str, requires: &[(&str, &str)]) -> Self {
        self.entries.push(CatalogEntry {
            kind: LookupKind::new(kind),
            candidate: Candidate::new(id, label),
            requires: requires
                .iter()
                .map(|(slot, id)| (slot.to_lowercase(), id.to_string()))
                .collect(),
        });
        self
    }

    /// Adds timeslots whose label doubles as their id.
    pub fn timeslots(self, requires: &[(&str, &str)], slots: &[&str]) -> Self {
        slots
            .iter()
            .fold(self, |builder, slot| builder.entry("timeslot", slot, slot, requires))
    }

    pub fn build(self) -> StaticCatalog {
        StaticCatalog {
            entries: self.entries,
        }
    }
}
