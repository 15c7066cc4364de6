//! The relation source the scoring engine reads from.
//!
//! Implemented by `harrington-store`. The engine never writes through this
//! trait; every score is derived from what these queries return at call time.

use crate::model::{
    Characteristic, CharacteristicId, CharacteristicTerm, Ecosystem, EcosystemId,
    PotentialWeight, Project, ProjectCharacteristicRank, ProjectId, Term, TermId,
};

/// Read access to terms, weights, and rank facts.
pub trait RelationSource: Send + Sync {
    /// Terms configured for `characteristic` in `ecosystem`, ordered by index.
    fn list_terms(
        &self,
        ecosystem: EcosystemId,
        characteristic: CharacteristicId,
    ) -> anyhow::Result<Vec<CharacteristicTerm>>;

    /// Distinct potentials that have at least one weight in `ecosystem`.
    fn list_potentials(&self, ecosystem: EcosystemId) -> anyhow::Result<Vec<Characteristic>>;

    /// Weighted edges pointing at `potential` in `ecosystem`.
    fn list_weighted_characteristics(
        &self,
        ecosystem: EcosystemId,
        potential: CharacteristicId,
    ) -> anyhow::Result<Vec<PotentialWeight>>;

    /// The rank fact for a (ecosystem, project, characteristic) triple, if any.
    fn get_rank(
        &self,
        ecosystem: EcosystemId,
        project: ProjectId,
        characteristic: CharacteristicId,
    ) -> anyhow::Result<Option<ProjectCharacteristicRank>>;

    /// Projects with at least one rank fact in `ecosystem`.
    fn list_projects(&self, ecosystem: EcosystemId) -> anyhow::Result<Vec<Project>>;

    fn ecosystem(&self, id: EcosystemId) -> anyhow::Result<Option<Ecosystem>>;

    fn project(&self, id: ProjectId) -> anyhow::Result<Option<Project>>;

    fn characteristic(&self, id: CharacteristicId) -> anyhow::Result<Option<Characteristic>>;

    fn term(&self, id: TermId) -> anyhow::Result<Option<Term>>;
}
