//! In-memory relation store.
//!
//! Rows are kept in ordered maps keyed by their uniqueness constraints, so
//! every range query comes back in key order. The store is built up front and
//! then shared read-only, which gives every scoring call the same snapshot.

use std::collections::BTreeMap;

use harrington_core::model::*;
use harrington_core::traits::RelationSource;

use crate::error::StoreError;

type TermKey = (EcosystemId, CharacteristicId, TermIndex);
type WeightKey = (EcosystemId, CharacteristicId, CharacteristicId);
type RankKey = (EcosystemId, ProjectId, CharacteristicId);

/// Relation store holding every entity in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: BTreeMap<UserId, User>,
    profiles: BTreeMap<UserId, UserProfile>,
    terms: BTreeMap<TermId, Term>,
    characteristics: BTreeMap<CharacteristicId, Characteristic>,
    ecosystems: BTreeMap<EcosystemId, Ecosystem>,
    projects: BTreeMap<ProjectId, Project>,
    characteristic_terms: BTreeMap<TermKey, CharacteristicTerm>,
    potential_weights: BTreeMap<WeightKey, PotentialWeight>,
    ranks: BTreeMap<RankKey, ProjectCharacteristicRank>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a parsed snapshot, enforcing every constraint.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for user in snapshot.users {
            store.insert_user(user)?;
        }
        for term in snapshot.terms {
            store.insert_term(term)?;
        }
        for characteristic in snapshot.characteristics {
            store.insert_characteristic(characteristic)?;
        }
        for ecosystem in snapshot.ecosystems {
            store.insert_ecosystem(ecosystem)?;
        }
        for project in snapshot.projects {
            store.insert_project(project)?;
        }
        for term in snapshot.characteristic_terms {
            store.insert_characteristic_term(term)?;
        }
        for weight in snapshot.potential_weights {
            store.insert_potential_weight(weight)?;
        }
        for rank in snapshot.ranks {
            store.insert_rank(rank)?;
        }

        tracing::debug!(
            ecosystems = store.ecosystems.len(),
            projects = store.projects.len(),
            terms = store.characteristic_terms.len(),
            weights = store.potential_weights.len(),
            ranks = store.ranks.len(),
            "loaded snapshot into memory store"
        );
        Ok(store)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Register a new user under the next free id, together with its profile.
    pub fn create_user(&mut self, username: &str) -> Result<(User, UserProfile), StoreError> {
        let next = self.users.keys().next_back().map_or(1, |id| id.0 + 1);
        let user = User {
            id: UserId(next),
            username: username.to_string(),
        };
        let profile = self.insert_user(user.clone())?;
        Ok((user, profile))
    }

    /// Insert a user and create its profile in the same step.
    pub fn insert_user(&mut self, user: User) -> Result<UserProfile, StoreError> {
        if self.users.contains_key(&user.id) {
            return Err(StoreError::duplicate_key("user", user.id));
        }
        if self.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateName {
                entity: "user",
                name: user.username,
            });
        }

        let profile = UserProfile::for_user(user.id);
        self.profiles.insert(user.id, profile.clone());
        self.users.insert(user.id, user);
        Ok(profile)
    }

    pub fn profile(&self, user: UserId) -> Option<&UserProfile> {
        self.profiles.get(&user)
    }

    /// Move the profile's issuance time to now, invalidating older tokens.
    pub fn revoke_tokens(&mut self, user: UserId) -> Result<&UserProfile, StoreError> {
        let profile = self
            .profiles
            .get_mut(&user)
            .ok_or_else(|| StoreError::not_found("user", user))?;
        profile.jwt_issuance_time = chrono::Utc::now();
        Ok(profile)
    }

    // -----------------------------------------------------------------------
    // Named entities
    // -----------------------------------------------------------------------

    pub fn insert_term(&mut self, term: Term) -> Result<(), StoreError> {
        if self.terms.contains_key(&term.id) {
            return Err(StoreError::duplicate_key("term", term.id));
        }
        if self.terms.values().any(|t| t.name == term.name) {
            return Err(StoreError::DuplicateName {
                entity: "term",
                name: term.name,
            });
        }
        self.terms.insert(term.id, term);
        Ok(())
    }

    pub fn insert_characteristic(
        &mut self,
        characteristic: Characteristic,
    ) -> Result<(), StoreError> {
        if self.characteristics.contains_key(&characteristic.id) {
            return Err(StoreError::duplicate_key(
                "characteristic",
                characteristic.id,
            ));
        }
        if self
            .characteristics
            .values()
            .any(|c| c.name == characteristic.name)
        {
            return Err(StoreError::DuplicateName {
                entity: "characteristic",
                name: characteristic.name,
            });
        }
        self.characteristics.insert(characteristic.id, characteristic);
        Ok(())
    }

    pub fn insert_ecosystem(&mut self, ecosystem: Ecosystem) -> Result<(), StoreError> {
        if self.ecosystems.contains_key(&ecosystem.id) {
            return Err(StoreError::duplicate_key("ecosystem", ecosystem.id));
        }
        if self.ecosystems.values().any(|e| e.name == ecosystem.name) {
            return Err(StoreError::DuplicateName {
                entity: "ecosystem",
                name: ecosystem.name,
            });
        }
        self.require_users(ecosystem.owners.iter())?;
        self.ecosystems.insert(ecosystem.id, ecosystem);
        Ok(())
    }

    pub fn insert_project(&mut self, project: Project) -> Result<(), StoreError> {
        if self.projects.contains_key(&project.id) {
            return Err(StoreError::duplicate_key("project", project.id));
        }
        if self.projects.values().any(|p| p.name == project.name) {
            return Err(StoreError::DuplicateName {
                entity: "project",
                name: project.name,
            });
        }
        self.require_users(project.owners.iter())?;
        self.projects.insert(project.id, project);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Relations
    // -----------------------------------------------------------------------

    /// Insert a trapezoidal term.
    ///
    /// Keyed by (ecosystem, characteristic, index); a term may also appear
    /// only once per (ecosystem, characteristic), so every index resolves to a
    /// distinct label.
    pub fn insert_characteristic_term(&mut self, term: CharacteristicTerm) -> Result<(), StoreError> {
        self.require_ecosystem(term.ecosystem)?;
        self.require_characteristic(term.characteristic)?;
        if !self.terms.contains_key(&term.term) {
            return Err(StoreError::not_found("term", term.term));
        }

        let key = (term.ecosystem, term.characteristic, term.index);
        if self.characteristic_terms.contains_key(&key) {
            return Err(StoreError::duplicate_key(
                "characteristic term",
                format!(
                    "index {} of characteristic {} in ecosystem {}",
                    term.index, term.characteristic, term.ecosystem
                ),
            ));
        }
        if self
            .term_range(term.ecosystem, term.characteristic)
            .any(|existing| existing.term == term.term)
        {
            return Err(StoreError::duplicate_key(
                "characteristic term",
                format!(
                    "term {} of characteristic {} in ecosystem {}",
                    term.term, term.characteristic, term.ecosystem
                ),
            ));
        }

        self.characteristic_terms.insert(key, term);
        Ok(())
    }

    /// Insert a weight edge from a leaf characteristic toward a potential.
    pub fn insert_potential_weight(&mut self, weight: PotentialWeight) -> Result<(), StoreError> {
        self.require_ecosystem(weight.ecosystem)?;
        let potential = self.require_characteristic(weight.potential)?;
        if !potential.is_potential() {
            return Err(StoreError::NotAPotential(potential.name.clone()));
        }
        self.require_characteristic(weight.characteristic)?;
        if !weight.weight.is_finite() {
            return Err(StoreError::Invalid {
                entity: "potential weight",
                message: format!("weight must be finite, got {}", weight.weight),
            });
        }

        let key = (weight.ecosystem, weight.potential, weight.characteristic);
        if self.potential_weights.contains_key(&key) {
            return Err(StoreError::duplicate_key(
                "potential weight",
                format!(
                    "{} -> {} in ecosystem {}",
                    weight.characteristic, weight.potential, weight.ecosystem
                ),
            ));
        }
        self.potential_weights.insert(key, weight);
        Ok(())
    }

    /// Insert a rank fact. Only one rank per (ecosystem, project, characteristic).
    pub fn insert_rank(&mut self, rank: ProjectCharacteristicRank) -> Result<(), StoreError> {
        self.require_ecosystem(rank.ecosystem)?;
        if !self.projects.contains_key(&rank.project) {
            return Err(StoreError::not_found("project", rank.project));
        }
        self.require_characteristic(rank.characteristic)?;

        let key = (rank.ecosystem, rank.project, rank.characteristic);
        if let Some(existing) = self.ranks.get(&key) {
            return Err(StoreError::duplicate_key(
                "rank",
                format!(
                    "project {} on characteristic {} in ecosystem {} (already ranked {})",
                    rank.project, rank.characteristic, rank.ecosystem, existing.rank
                ),
            ));
        }
        self.ranks.insert(key, rank);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookups by name
    // -----------------------------------------------------------------------

    pub fn ecosystem_by_name(&self, name: &str) -> Result<&Ecosystem, StoreError> {
        self.ecosystems
            .values()
            .find(|e| e.name == name)
            .ok_or_else(|| StoreError::not_found("ecosystem", name))
    }

    pub fn project_by_name(&self, name: &str) -> Result<&Project, StoreError> {
        self.projects
            .values()
            .find(|p| p.name == name)
            .ok_or_else(|| StoreError::not_found("project", name))
    }

    pub fn characteristic_by_name(&self, name: &str) -> Result<&Characteristic, StoreError> {
        self.characteristics
            .values()
            .find(|c| c.name == name)
            .ok_or_else(|| StoreError::not_found("characteristic", name))
    }

    pub fn user_by_name(&self, username: &str) -> Result<&User, StoreError> {
        self.users
            .values()
            .find(|u| u.username == username)
            .ok_or_else(|| StoreError::not_found("user", username))
    }

    fn term_range(
        &self,
        ecosystem: EcosystemId,
        characteristic: CharacteristicId,
    ) -> impl Iterator<Item = &CharacteristicTerm> {
        self.characteristic_terms
            .range(
                (ecosystem, characteristic, TermIndex(i32::MIN))
                    ..=(ecosystem, characteristic, TermIndex(i32::MAX)),
            )
            .map(|(_, t)| t)
    }

    fn require_ecosystem(&self, id: EcosystemId) -> Result<&Ecosystem, StoreError> {
        self.ecosystems
            .get(&id)
            .ok_or_else(|| StoreError::not_found("ecosystem", id))
    }

    fn require_characteristic(&self, id: CharacteristicId) -> Result<&Characteristic, StoreError> {
        self.characteristics
            .get(&id)
            .ok_or_else(|| StoreError::not_found("characteristic", id))
    }

    fn require_users<'a>(&self, ids: impl Iterator<Item = &'a UserId>) -> Result<(), StoreError> {
        for id in ids {
            if !self.users.contains_key(id) {
                return Err(StoreError::not_found("user", id));
            }
        }
        Ok(())
    }
}

impl RelationSource for MemoryStore {
    fn list_terms(
        &self,
        ecosystem: EcosystemId,
        characteristic: CharacteristicId,
    ) -> anyhow::Result<Vec<CharacteristicTerm>> {
        Ok(self.term_range(ecosystem, characteristic).cloned().collect())
    }

    fn list_potentials(&self, ecosystem: EcosystemId) -> anyhow::Result<Vec<Characteristic>> {
        let mut ids: Vec<CharacteristicId> = self
            .potential_weights
            .range(
                (ecosystem, CharacteristicId(0), CharacteristicId(0))
                    ..=(ecosystem, CharacteristicId(u64::MAX), CharacteristicId(u64::MAX)),
            )
            .map(|(_, w)| w.potential)
            .collect();
        ids.dedup();

        Ok(ids
            .into_iter()
            .filter_map(|id| self.characteristics.get(&id).cloned())
            .collect())
    }

    fn list_weighted_characteristics(
        &self,
        ecosystem: EcosystemId,
        potential: CharacteristicId,
    ) -> anyhow::Result<Vec<PotentialWeight>> {
        Ok(self
            .potential_weights
            .range(
                (ecosystem, potential, CharacteristicId(0))
                    ..=(ecosystem, potential, CharacteristicId(u64::MAX)),
            )
            .map(|(_, w)| w.clone())
            .collect())
    }

    fn get_rank(
        &self,
        ecosystem: EcosystemId,
        project: ProjectId,
        characteristic: CharacteristicId,
    ) -> anyhow::Result<Option<ProjectCharacteristicRank>> {
        Ok(self.ranks.get(&(ecosystem, project, characteristic)).copied())
    }

    fn list_projects(&self, ecosystem: EcosystemId) -> anyhow::Result<Vec<Project>> {
        let mut ids: Vec<ProjectId> = self
            .ranks
            .range(
                (ecosystem, ProjectId(0), CharacteristicId(0))
                    ..=(ecosystem, ProjectId(u64::MAX), CharacteristicId(u64::MAX)),
            )
            .map(|(_, r)| r.project)
            .collect();
        ids.dedup();

        Ok(ids
            .into_iter()
            .filter_map(|id| self.projects.get(&id).cloned())
            .collect())
    }

    fn ecosystem(&self, id: EcosystemId) -> anyhow::Result<Option<Ecosystem>> {
        Ok(self.ecosystems.get(&id).cloned())
    }

    fn project(&self, id: ProjectId) -> anyhow::Result<Option<Project>> {
        Ok(self.projects.get(&id).cloned())
    }

    fn characteristic(&self, id: CharacteristicId) -> anyhow::Result<Option<Characteristic>> {
        Ok(self.characteristics.get(&id).cloned())
    }

    fn term(&self, id: TermId) -> anyhow::Result<Option<Term>> {
        Ok(self.terms.get(&id).cloned())
    }
}
