//! TOML snapshot parser.
//!
//! A snapshot lists every entity of a deployment. Relations refer to entities
//! by their unique names; ids are assigned in file order, starting at 1.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::membership::Trapezoid;
use crate::model::{
    Characteristic, CharacteristicId, CharacteristicKind, CharacteristicTerm, Ecosystem,
    EcosystemId, PotentialWeight, Project, ProjectCharacteristicRank, ProjectId, Snapshot, Term,
    TermId, TermIndex, User, UserId,
};

/// Intermediate TOML structure for parsing snapshot files.
#[derive(Debug, Deserialize)]
struct TomlSnapshot {
    #[serde(default)]
    users: Vec<TomlUser>,
    #[serde(default)]
    terms: Vec<TomlNamed>,
    #[serde(default)]
    characteristics: Vec<TomlCharacteristic>,
    #[serde(default)]
    ecosystems: Vec<TomlOwned>,
    #[serde(default)]
    projects: Vec<TomlOwned>,
    #[serde(default)]
    characteristic_terms: Vec<TomlCharacteristicTerm>,
    #[serde(default)]
    potential_weights: Vec<TomlPotentialWeight>,
    #[serde(default)]
    ranks: Vec<TomlRank>,
}

#[derive(Debug, Deserialize)]
struct TomlUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct TomlNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlCharacteristic {
    name: String,
    #[serde(default = "default_kind")]
    kind: String,
}

fn default_kind() -> String {
    "common".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlOwned {
    name: String,
    #[serde(default)]
    owners: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TomlCharacteristicTerm {
    ecosystem: String,
    characteristic: String,
    #[serde(default)]
    index: i32,
    term: String,
    a1: f64,
    a2: f64,
    a3: f64,
    a4: f64,
}

#[derive(Debug, Deserialize)]
struct TomlPotentialWeight {
    ecosystem: String,
    potential: String,
    characteristic: String,
    weight: f64,
}

#[derive(Debug, Deserialize)]
struct TomlRank {
    ecosystem: String,
    project: String,
    characteristic: String,
    #[serde(default)]
    rank: i64,
}

/// Name → id lookup for one entity type.
struct Names<I> {
    entity: &'static str,
    ids: HashMap<String, I>,
}

impl<I: Copy> Names<I> {
    fn new(entity: &'static str) -> Self {
        Self {
            entity,
            ids: HashMap::new(),
        }
    }

    fn insert(&mut self, name: &str, id: I) -> Result<()> {
        if self.ids.insert(name.to_string(), id).is_some() {
            anyhow::bail!("duplicate {} name: {name}", self.entity);
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Result<I> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown {}: {name}", self.entity))
    }
}

/// Parse a snapshot file.
pub fn parse_snapshot(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot file: {}", path.display()))?;

    parse_snapshot_str(&content, path)
}

/// Parse a TOML string into a `Snapshot` (useful for testing).
pub fn parse_snapshot_str(content: &str, source_path: &Path) -> Result<Snapshot> {
    let parsed: TomlSnapshot = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    resolve(parsed).with_context(|| format!("invalid snapshot: {}", source_path.display()))
}

fn resolve(parsed: TomlSnapshot) -> Result<Snapshot> {
    let mut snapshot = Snapshot::default();

    let mut users = Names::new("user");
    for (n, u) in parsed.users.into_iter().enumerate() {
        let id = UserId(n as u64 + 1);
        users.insert(&u.username, id)?;
        snapshot.users.push(User {
            id,
            username: u.username,
        });
    }

    let mut terms = Names::new("term");
    for (n, t) in parsed.terms.into_iter().enumerate() {
        let id = TermId(n as u64 + 1);
        terms.insert(&t.name, id)?;
        snapshot.terms.push(Term { id, name: t.name });
    }

    let mut characteristics = Names::new("characteristic");
    for (n, c) in parsed.characteristics.into_iter().enumerate() {
        let id = CharacteristicId(n as u64 + 1);
        let kind: CharacteristicKind = c
            .kind
            .parse()
            .map_err(|e: String| anyhow::anyhow!("characteristic {}: {e}", c.name))?;
        characteristics.insert(&c.name, id)?;
        snapshot.characteristics.push(Characteristic {
            id,
            name: c.name,
            kind,
        });
    }

    let owners_of = |names: &[String]| -> Result<BTreeSet<UserId>> {
        names.iter().map(|name| users.get(name)).collect()
    };

    let mut ecosystems = Names::new("ecosystem");
    for (n, e) in parsed.ecosystems.into_iter().enumerate() {
        let id = EcosystemId(n as u64 + 1);
        ecosystems.insert(&e.name, id)?;
        snapshot.ecosystems.push(Ecosystem {
            id,
            owners: owners_of(&e.owners)?,
            name: e.name,
        });
    }

    let mut projects = Names::new("project");
    for (n, p) in parsed.projects.into_iter().enumerate() {
        let id = ProjectId(n as u64 + 1);
        projects.insert(&p.name, id)?;
        snapshot.projects.push(Project {
            id,
            owners: owners_of(&p.owners)?,
            name: p.name,
        });
    }

    for t in parsed.characteristic_terms {
        let shape = Trapezoid::new(t.a1, t.a2, t.a3, t.a4).with_context(|| {
            format!(
                "term {} of characteristic {} in ecosystem {}",
                t.term, t.characteristic, t.ecosystem
            )
        })?;
        snapshot.characteristic_terms.push(CharacteristicTerm {
            ecosystem: ecosystems.get(&t.ecosystem)?,
            characteristic: characteristics.get(&t.characteristic)?,
            index: TermIndex(t.index),
            term: terms.get(&t.term)?,
            shape,
        });
    }

    for w in parsed.potential_weights {
        snapshot.potential_weights.push(PotentialWeight {
            ecosystem: ecosystems.get(&w.ecosystem)?,
            potential: characteristics.get(&w.potential)?,
            characteristic: characteristics.get(&w.characteristic)?,
            weight: w.weight,
        });
    }

    for r in parsed.ranks {
        snapshot.ranks.push(ProjectCharacteristicRank {
            ecosystem: ecosystems.get(&r.ecosystem)?,
            project: projects.get(&r.project)?,
            characteristic: characteristics.get(&r.characteristic)?,
            rank: r.rank,
        });
    }

    Ok(snapshot)
}

/// A warning from snapshot validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The ecosystem the warning concerns (if applicable).
    pub ecosystem: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a snapshot for configuration mistakes the store does not reject.
pub fn validate_snapshot(snapshot: &Snapshot) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let name_of = |id: CharacteristicId| {
        snapshot
            .characteristic(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let ecosystem_of = |id: EcosystemId| {
        snapshot
            .ecosystem(id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let has_terms = |ecosystem: EcosystemId, characteristic: CharacteristicId| {
        snapshot
            .characteristic_terms
            .iter()
            .any(|t| t.ecosystem == ecosystem && t.characteristic == characteristic)
    };

    // Weighted leaves without terms fail every aggregation that reaches them
    let mut reported = BTreeSet::new();
    for w in &snapshot.potential_weights {
        if !has_terms(w.ecosystem, w.characteristic)
            && reported.insert((w.ecosystem, w.characteristic))
        {
            warnings.push(ValidationWarning {
                ecosystem: Some(ecosystem_of(w.ecosystem)),
                message: format!(
                    "characteristic {} is weighted toward a potential but has no terms",
                    name_of(w.characteristic)
                ),
            });
        }
    }

    // Potentials without terms always score 0
    let mut reported = BTreeSet::new();
    for w in &snapshot.potential_weights {
        if !has_terms(w.ecosystem, w.potential) && reported.insert((w.ecosystem, w.potential)) {
            warnings.push(ValidationWarning {
                ecosystem: Some(ecosystem_of(w.ecosystem)),
                message: format!(
                    "potential {} has weights but no terms, it will always score 0",
                    name_of(w.potential)
                ),
            });
        }
    }

    for w in &snapshot.potential_weights {
        if !w.weight.is_finite() || w.weight < 0.0 {
            warnings.push(ValidationWarning {
                ecosystem: Some(ecosystem_of(w.ecosystem)),
                message: format!(
                    "weight {} from {} to {} is negative or not finite",
                    w.weight,
                    name_of(w.characteristic),
                    name_of(w.potential)
                ),
            });
        }
    }

    // Leaf shapes are used as given; only potential widths clamp a1
    let is_potential = |id: CharacteristicId| {
        snapshot
            .characteristic(id)
            .is_some_and(|c| c.is_potential())
    };
    for t in &snapshot.characteristic_terms {
        if t.shape.a1() < 0.0 && is_potential(t.characteristic) {
            warnings.push(ValidationWarning {
                ecosystem: Some(ecosystem_of(t.ecosystem)),
                message: format!(
                    "term index {} of {} has negative a1 ({}), clamped to 0 in potential scores",
                    t.index,
                    name_of(t.characteristic),
                    t.shape.a1()
                ),
            });
        }
    }

    for r in &snapshot.ranks {
        let mut shapes = snapshot
            .characteristic_terms
            .iter()
            .filter(|t| t.ecosystem == r.ecosystem && t.characteristic == r.characteristic)
            .peekable();
        if shapes.peek().is_none() {
            continue;
        }
        if !shapes.any(|t| t.shape.covers(r.rank as f64)) {
            let project = snapshot
                .project(r.project)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| r.project.to_string());
            warnings.push(ValidationWarning {
                ecosystem: Some(ecosystem_of(r.ecosystem)),
                message: format!(
                    "rank {} of project {project} on {} has zero membership in every term",
                    r.rank,
                    name_of(r.characteristic)
                ),
            });
        }
    }

    warnings
}
