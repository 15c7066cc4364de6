//! Characteristic valuation: fuzzy membership of a rank across all terms, and
//! selection of the dominant term.

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::model::{
    CharacteristicId, CharacteristicTerm, EcosystemId, ProjectCharacteristicRank, ProjectId,
};
use crate::traits::RelationSource;

/// Membership degree of one rank in one configured term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub term: CharacteristicTerm,
    pub degree: f64,
}

/// Evaluate `fact.rank` against every term configured for its characteristic.
///
/// The result follows the source's index order. An empty term set is a
/// configuration error, never an empty result.
pub fn fuzzy_value(
    source: &dyn RelationSource,
    fact: &ProjectCharacteristicRank,
) -> Result<Vec<Membership>, ScoringError> {
    let terms = source.list_terms(fact.ecosystem, fact.characteristic)?;
    if terms.is_empty() {
        return Err(ScoringError::MissingTerms {
            ecosystem: fact.ecosystem,
            characteristic: fact.characteristic,
        });
    }

    let x = fact.rank as f64;
    Ok(terms
        .into_iter()
        .map(|term| {
            let degree = term.mu(x);
            Membership { term, degree }
        })
        .collect())
}

/// The term with the highest membership for `fact`.
pub fn value(
    source: &dyn RelationSource,
    fact: &ProjectCharacteristicRank,
) -> Result<Membership, ScoringError> {
    let memberships = fuzzy_value(source, fact)?;
    let dominant = select_dominant(&memberships)
        .cloned()
        .ok_or(ScoringError::MissingTerms {
            ecosystem: fact.ecosystem,
            characteristic: fact.characteristic,
        })?;

    tracing::trace!(
        ecosystem = %fact.ecosystem,
        project = %fact.project,
        characteristic = %fact.characteristic,
        rank = fact.rank,
        index = %dominant.term.index,
        degree = dominant.degree,
        "selected dominant term"
    );
    Ok(dominant)
}

/// Look up the rank fact for the triple, then value it.
pub fn value_of(
    source: &dyn RelationSource,
    ecosystem: EcosystemId,
    project: ProjectId,
    characteristic: CharacteristicId,
) -> Result<Membership, ScoringError> {
    let fact = source
        .get_rank(ecosystem, project, characteristic)?
        .ok_or(ScoringError::MissingRank {
            ecosystem,
            project,
            characteristic,
        })?;
    value(source, &fact)
}

/// Maximum-membership entry; ties go to the lowest term index.
pub fn select_dominant(memberships: &[Membership]) -> Option<&Membership> {
    memberships.iter().reduce(|best, candidate| {
        let higher = candidate.degree > best.degree;
        let tie_lower_index =
            candidate.degree == best.degree && candidate.term.index < best.term.index;
        if higher || tie_lower_index {
            candidate
        } else {
            best
        }
    })
}
