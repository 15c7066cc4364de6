//! Core data model types for harrington.
//!
//! Entities are scoped the same way the persisted configuration is: terms and
//! characteristics are global, while trapezoids, weights, and ranks only mean
//! something inside one ecosystem.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::membership::Trapezoid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of an [`Ecosystem`].
    EcosystemId
);
define_id!(
    /// Identifier of a [`Project`].
    ProjectId
);
define_id!(
    /// Identifier of a [`Characteristic`].
    CharacteristicId
);
define_id!(
    /// Identifier of a [`Term`].
    TermId
);
define_id!(
    /// Identifier of a [`User`].
    UserId
);

/// Whether a characteristic is only a leaf input or can also be aggregated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacteristicKind {
    Common,
    Potential,
}

impl fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacteristicKind::Common => write!(f, "common"),
            CharacteristicKind::Potential => write!(f, "potential"),
        }
    }
}

impl FromStr for CharacteristicKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "common" | "c" => Ok(CharacteristicKind::Common),
            "potential" | "p" => Ok(CharacteristicKind::Potential),
            other => Err(format!("unknown characteristic kind: {other}")),
        }
    }
}

/// A named property a project can be ranked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characteristic {
    pub id: CharacteristicId,
    /// Unique name.
    pub name: String,
    pub kind: CharacteristicKind,
}

impl Characteristic {
    pub fn is_potential(&self) -> bool {
        self.kind == CharacteristicKind::Potential
    }
}

/// A linguistic label such as "low" or "high", shared across ecosystems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub name: String,
}

/// A registered user. Ownership of ecosystems and projects refers to these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// Per-user state kept next to the account itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: UserId,
    /// Tokens issued before this instant are considered revoked.
    pub jwt_issuance_time: DateTime<Utc>,
}

impl UserProfile {
    /// A fresh profile for `user`, with the issuance clock starting now.
    pub fn for_user(user: UserId) -> Self {
        Self {
            user,
            jwt_issuance_time: Utc::now(),
        }
    }
}

/// A scoping context with its own numeric configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ecosystem {
    pub id: EcosystemId,
    pub name: String,
    #[serde(default)]
    pub owners: BTreeSet<UserId>,
}

/// A project being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub owners: BTreeSet<UserId>,
}

/// Position of a term within a characteristic's ordered term list.
///
/// This is an ordinal scale, not a list offset: the aggregator feeds a leaf's
/// dominant `TermIndex` into the potential's membership functions as a number,
/// so term ordering carries meaning.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TermIndex(pub i32);

impl TermIndex {
    /// The index as an input to a membership function.
    pub fn as_input(self) -> f64 {
        f64::from(self.0)
    }
}

impl fmt::Display for TermIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One trapezoidal term configured for a characteristic inside an ecosystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicTerm {
    pub ecosystem: EcosystemId,
    pub characteristic: CharacteristicId,
    pub index: TermIndex,
    pub term: TermId,
    pub shape: Trapezoid,
}

impl CharacteristicTerm {
    /// Membership degree of `x` in this term.
    pub fn mu(&self, x: f64) -> f64 {
        self.shape.mu(x)
    }
}

/// Weighted edge from a leaf characteristic toward a potential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialWeight {
    pub ecosystem: EcosystemId,
    pub potential: CharacteristicId,
    pub characteristic: CharacteristicId,
    pub weight: f64,
}

/// How a project ranks on a characteristic within an ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCharacteristicRank {
    pub ecosystem: EcosystemId,
    pub project: ProjectId,
    pub characteristic: CharacteristicId,
    pub rank: i64,
}

/// Every entity of a deployment, as loaded from a snapshot file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
    #[serde(default)]
    pub ecosystems: Vec<Ecosystem>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub characteristic_terms: Vec<CharacteristicTerm>,
    #[serde(default)]
    pub potential_weights: Vec<PotentialWeight>,
    #[serde(default)]
    pub ranks: Vec<ProjectCharacteristicRank>,
}

impl Snapshot {
    pub fn characteristic(&self, id: CharacteristicId) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.id == id)
    }

    pub fn ecosystem(&self, id: EcosystemId) -> Option<&Ecosystem> {
        self.ecosystems.iter().find(|e| e.id == id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }
}
