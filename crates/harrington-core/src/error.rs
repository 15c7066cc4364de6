//! Scoring error types.
//!
//! Collaborator failures are carried through [`ScoringError::Source`] so
//! callers can still tell a configuration gap apart from a broken store.

use thiserror::Error;

use crate::model::{CharacteristicId, EcosystemId, ProjectId};

/// Errors raised while valuing characteristics or aggregating potentials.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// No terms are configured for a characteristic being evaluated.
    #[error("no terms configured for characteristic {characteristic} in ecosystem {ecosystem}")]
    MissingTerms {
        ecosystem: EcosystemId,
        characteristic: CharacteristicId,
    },

    /// The project has no rank fact for the characteristic.
    #[error(
        "project {project} has no rank for characteristic {characteristic} in ecosystem {ecosystem}"
    )]
    MissingRank {
        ecosystem: EcosystemId,
        project: ProjectId,
        characteristic: CharacteristicId,
    },

    /// Trapezoid breakpoints are not ordered or not finite.
    #[error("invalid trapezoid ({a1}, {a2}, {a3}, {a4}): breakpoints must be finite and ordered")]
    InvalidTrapezoid { a1: f64, a2: f64, a3: f64, a4: f64 },

    /// The relation source failed.
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

impl ScoringError {
    /// Returns `true` if this error comes from missing term configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ScoringError::MissingTerms { .. })
    }
}
