//! Potential aggregation.
//!
//! Each leaf characteristic weighted toward a potential is valued on its own
//! terms, and the *index* of its dominant term becomes the input to the
//! potential's membership functions:
//!
//! ```text
//! profile[potential][term] = sum(weight(leaf -> potential) * term.mu(index(dominant(leaf))))
//! score[potential]         = sum(profile[potential][term] * (term.a4 - max(term.a1, 0)))
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::model::{
    Characteristic, CharacteristicId, CharacteristicTerm, EcosystemId, ProjectId, TermIndex,
};
use crate::traits::RelationSource;
use crate::valuation;

/// What one leaf characteristic feeds into a potential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafContribution {
    pub characteristic: CharacteristicId,
    pub weight: f64,
    /// Index of the leaf's dominant term.
    pub index: TermIndex,
}

/// Accumulated weight of one potential term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    pub term: CharacteristicTerm,
    pub weight: f64,
}

/// The fuzzy value of one potential for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialProfile {
    pub potential: Characteristic,
    /// One entry per term configured for the potential, in index order.
    pub terms: Vec<WeightedTerm>,
    pub contributions: Vec<LeafContribution>,
}

impl PotentialProfile {
    /// Collapse the profile to a single number.
    pub fn score(&self) -> f64 {
        self.terms
            .iter()
            .map(|t| t.weight * t.term.shape.upper_support_width())
            .fold(0.0, |acc, x| acc + x)
    }
}

/// The crisp score of one potential for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialScore {
    pub potential: Characteristic,
    pub score: f64,
}

/// Fuzzy profile of every potential configured in `ecosystem`, for `project`.
///
/// Fails as a whole if any weighted leaf lacks term configuration; partial
/// sums are never returned.
pub fn potentials_fuzzy_value(
    source: &dyn RelationSource,
    ecosystem: EcosystemId,
    project: ProjectId,
) -> Result<BTreeMap<CharacteristicId, PotentialProfile>, ScoringError> {
    let mut profiles = BTreeMap::new();

    for potential in source.list_potentials(ecosystem)? {
        let contributions = leaf_contributions(source, ecosystem, project, potential.id)?;

        let potential_terms = source.list_terms(ecosystem, potential.id)?;
        if potential_terms.is_empty() {
            tracing::warn!(
                ecosystem = %ecosystem,
                potential = %potential.name,
                "potential has weights but no terms, its score is 0"
            );
        }

        let terms = potential_terms
            .into_iter()
            .map(|term| {
                let weight = contributions
                    .iter()
                    .map(|c| c.weight * term.mu(c.index.as_input()))
                    .fold(0.0, |acc, x| acc + x);
                WeightedTerm { term, weight }
            })
            .collect();

        profiles.insert(
            potential.id,
            PotentialProfile {
                potential,
                terms,
                contributions,
            },
        );
    }

    Ok(profiles)
}

/// Crisp score of every potential configured in `ecosystem`, for `project`.
pub fn potentials_value(
    source: &dyn RelationSource,
    ecosystem: EcosystemId,
    project: ProjectId,
) -> Result<BTreeMap<CharacteristicId, PotentialScore>, ScoringError> {
    Ok(potentials_fuzzy_value(source, ecosystem, project)?
        .into_iter()
        .map(|(id, profile)| {
            let score = profile.score();
            (
                id,
                PotentialScore {
                    potential: profile.potential,
                    score,
                },
            )
        })
        .collect())
}

fn leaf_contributions(
    source: &dyn RelationSource,
    ecosystem: EcosystemId,
    project: ProjectId,
    potential: CharacteristicId,
) -> Result<Vec<LeafContribution>, ScoringError> {
    let mut contributions = Vec::new();

    for edge in source.list_weighted_characteristics(ecosystem, potential)? {
        let Some(fact) = source.get_rank(ecosystem, project, edge.characteristic)? else {
            tracing::debug!(
                ecosystem = %ecosystem,
                project = %project,
                characteristic = %edge.characteristic,
                "no rank for weighted characteristic, skipping"
            );
            continue;
        };

        let dominant = valuation::value(source, &fact)?;
        contributions.push(LeafContribution {
            characteristic: edge.characteristic,
            weight: edge.weight,
            index: dominant.term.index,
        });
    }

    Ok(contributions)
}
