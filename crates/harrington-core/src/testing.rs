//! Snapshot-backed relation source for unit tests.

use crate::membership::Trapezoid;
use crate::model::*;
use crate::traits::RelationSource;

/// Answers every query by scanning a [`Snapshot`].
#[derive(Default)]
pub struct FixtureSource {
    pub snapshot: Snapshot,
    pub fail_with: Option<String>,
}

impl FixtureSource {
    pub fn new() -> Self {
        let mut source = Self::default();
        source.snapshot.ecosystems.push(Ecosystem {
            id: EcosystemId(1),
            name: "eco".into(),
            owners: Default::default(),
        });
        source.snapshot.projects.push(Project {
            id: ProjectId(1),
            name: "apollo".into(),
            owners: Default::default(),
        });
        source
    }

    pub fn with_characteristic(mut self, id: u64, name: &str, kind: CharacteristicKind) -> Self {
        self.snapshot.characteristics.push(Characteristic {
            id: CharacteristicId(id),
            name: name.into(),
            kind,
        });
        self
    }

    pub fn with_term(mut self, characteristic: u64, index: i32, term: u64, shape: [f64; 4]) -> Self {
        if !self.snapshot.terms.iter().any(|t| t.id == TermId(term)) {
            self.snapshot.terms.push(Term {
                id: TermId(term),
                name: format!("term-{term}"),
            });
        }
        let [a1, a2, a3, a4] = shape;
        self.snapshot.characteristic_terms.push(CharacteristicTerm {
            ecosystem: EcosystemId(1),
            characteristic: CharacteristicId(characteristic),
            index: TermIndex(index),
            term: TermId(term),
            shape: Trapezoid::new(a1, a2, a3, a4).unwrap(),
        });
        self
    }

    pub fn with_weight(mut self, potential: u64, characteristic: u64, weight: f64) -> Self {
        self.snapshot.potential_weights.push(PotentialWeight {
            ecosystem: EcosystemId(1),
            potential: CharacteristicId(potential),
            characteristic: CharacteristicId(characteristic),
            weight,
        });
        self
    }

    pub fn with_rank(mut self, project: u64, characteristic: u64, rank: i64) -> Self {
        if !self.snapshot.projects.iter().any(|p| p.id == ProjectId(project)) {
            self.snapshot.projects.push(Project {
                id: ProjectId(project),
                name: format!("project-{project}"),
                owners: Default::default(),
            });
        }
        self.snapshot.ranks.push(ProjectCharacteristicRank {
            ecosystem: EcosystemId(1),
            project: ProjectId(project),
            characteristic: CharacteristicId(characteristic),
            rank,
        });
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    fn check(&self) -> anyhow::Result<()> {
        match &self.fail_with {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        }
    }
}

impl RelationSource for FixtureSource {
    fn list_terms(
        &self,
        ecosystem: EcosystemId,
        characteristic: CharacteristicId,
    ) -> anyhow::Result<Vec<CharacteristicTerm>> {
        self.check()?;
        let mut terms: Vec<_> = self
            .snapshot
            .characteristic_terms
            .iter()
            .filter(|t| t.ecosystem == ecosystem && t.characteristic == characteristic)
            .cloned()
            .collect();
        terms.sort_by_key(|t| t.index);
        Ok(terms)
    }

    fn list_potentials(&self, ecosystem: EcosystemId) -> anyhow::Result<Vec<Characteristic>> {
        self.check()?;
        let mut ids: Vec<_> = self
            .snapshot
            .potential_weights
            .iter()
            .filter(|w| w.ecosystem == ecosystem)
            .map(|w| w.potential)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.snapshot.characteristic(id).cloned())
            .collect())
    }

    fn list_weighted_characteristics(
        &self,
        ecosystem: EcosystemId,
        potential: CharacteristicId,
    ) -> anyhow::Result<Vec<PotentialWeight>> {
        self.check()?;
        Ok(self
            .snapshot
            .potential_weights
            .iter()
            .filter(|w| w.ecosystem == ecosystem && w.potential == potential)
            .cloned()
            .collect())
    }

    fn get_rank(
        &self,
        ecosystem: EcosystemId,
        project: ProjectId,
        characteristic: CharacteristicId,
    ) -> anyhow::Result<Option<ProjectCharacteristicRank>> {
        self.check()?;
        Ok(self.snapshot.ranks.iter().copied().find(|r| {
            r.ecosystem == ecosystem && r.project == project && r.characteristic == characteristic
        }))
    }

    fn list_projects(&self, ecosystem: EcosystemId) -> anyhow::Result<Vec<Project>> {
        self.check()?;
        Ok(self
            .snapshot
            .projects
            .iter()
            .filter(|p| {
                self.snapshot
                    .ranks
                    .iter()
                    .any(|r| r.ecosystem == ecosystem && r.project == p.id)
            })
            .cloned()
            .collect())
    }

    fn ecosystem(&self, id: EcosystemId) -> anyhow::Result<Option<Ecosystem>> {
        Ok(self.snapshot.ecosystem(id).cloned())
    }

    fn project(&self, id: ProjectId) -> anyhow::Result<Option<Project>> {
        Ok(self.snapshot.project(id).cloned())
    }

    fn characteristic(&self, id: CharacteristicId) -> anyhow::Result<Option<Characteristic>> {
        Ok(self.snapshot.characteristic(id).cloned())
    }

    fn term(&self, id: TermId) -> anyhow::Result<Option<Term>> {
        Ok(self.snapshot.terms.iter().find(|t| t.id == id).cloned())
    }
}
