//! End-to-end scoring over a parsed snapshot loaded into the memory store.

use std::path::Path;
use std::sync::Arc;

use harrington_core::aggregate::{potentials_fuzzy_value, potentials_value};
use harrington_core::engine::{EngineConfig, NoopReporter, ScoringEngine};
use harrington_core::model::{EcosystemId, ProjectCharacteristicRank};
use harrington_core::parser::parse_snapshot_str;
use harrington_core::valuation::{fuzzy_value, value_of};
use harrington_core::{RelationSource, ScoringError};
use harrington_store::{MemoryStore, StoreError};

// Leaves "Team Size" and "Funding" share the low/mid/high shapes in rank
// space; "Growth" is defined over term indices 0..=2.
const SNAPSHOT: &str = r#"
[[users]]
username = "alice"

[[terms]]
name = "low"
[[terms]]
name = "mid"
[[terms]]
name = "high"

[[characteristics]]
name = "Team Size"
[[characteristics]]
name = "Funding"
[[characteristics]]
name = "Churn"
[[characteristics]]
name = "Growth"
kind = "potential"

[[ecosystems]]
name = "Fintech"
owners = ["alice"]
[[ecosystems]]
name = "Empty"

[[projects]]
name = "Apollo"
owners = ["alice"]
[[projects]]
name = "Gemini"
[[projects]]
name = "Hermes"

[[characteristic_terms]]
ecosystem = "Fintech"
characteristic = "Team Size"
index = 0
term = "low"
a1 = 0.0
a2 = 0.0
a3 = 2.0
a4 = 4.0
[[characteristic_terms]]
ecosystem = "Fintech"
characteristic = "Team Size"
index = 1
term = "mid"
a1 = 2.0
a2 = 4.0
a3 = 6.0
a4 = 8.0
[[characteristic_terms]]
ecosystem = "Fintech"
characteristic = "Team Size"
index = 2
term = "high"
a1 = 6.0
a2 = 8.0
a3 = 20.0
a4 = 20.0

[[characteristic_terms]]
ecosystem = "Fintech"
characteristic = "Funding"
index = 0
term = "low"
a1 = 0.0
a2 = 0.0
a3 = 2.0
a4 = 4.0
[[characteristic_terms]]
ecosystem = "Fintech"
characteristic = "Funding"
index = 1
term = "mid"
a1 = 2.0
a2 = 4.0
a3 = 6.0
a4 = 8.0
[[characteristic_terms]]
ecosystem = "Fintech"
characteristic = "Funding"
index = 2
term = "high"
a1 = 6.0
a2 = 8.0
a3 = 20.0
a4 = 20.0

[[characteristic_terms]]
ecosystem = "Fintech"
characteristic = "Growth"
index = 0
term = "low"
a1 = 0.0
a2 = 0.0
a3 = 0.5
a4 = 1.5
[[characteristic_terms]]
ecosystem = "Fintech"
characteristic = "Growth"
index = 1
term = "mid"
a1 = 0.5
a2 = 1.5
a3 = 1.5
a4 = 2.5
[[characteristic_terms]]
ecosystem = "Fintech"
characteristic = "Growth"
index = 2
term = "high"
a1 = 1.5
a2 = 2.5
a3 = 3.0
a4 = 3.0

[[potential_weights]]
ecosystem = "Fintech"
potential = "Growth"
characteristic = "Team Size"
weight = 0.6
[[potential_weights]]
ecosystem = "Fintech"
potential = "Growth"
characteristic = "Funding"
weight = 0.4
[[potential_weights]]
ecosystem = "Fintech"
potential = "Growth"
characteristic = "Churn"
weight = 1.0

[[ranks]]
ecosystem = "Fintech"
project = "Apollo"
characteristic = "Team Size"
rank = 5
[[ranks]]
ecosystem = "Fintech"
project = "Apollo"
characteristic = "Funding"
rank = 12
[[ranks]]
ecosystem = "Fintech"
project = "Gemini"
characteristic = "Team Size"
rank = 1
[[ranks]]
ecosystem = "Fintech"
project = "Hermes"
characteristic = "Churn"
rank = 3
"#;

fn store() -> MemoryStore {
    let snapshot = parse_snapshot_str(SNAPSHOT, Path::new("scoring.toml")).unwrap();
    MemoryStore::from_snapshot(snapshot).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn dominant_terms_feed_index_space() {
    let store = store();
    let fintech = store.ecosystem_by_name("Fintech").unwrap().id;
    let apollo = store.project_by_name("Apollo").unwrap().id;
    let team = store.characteristic_by_name("Team Size").unwrap().id;
    let funding = store.characteristic_by_name("Funding").unwrap().id;

    let team_value = value_of(&store, fintech, apollo, team).unwrap();
    assert_eq!(team_value.term.index.0, 1);
    assert_eq!(team_value.degree, 1.0);

    let funding_value = value_of(&store, fintech, apollo, funding).unwrap();
    assert_eq!(funding_value.term.index.0, 2);
    assert_eq!(store.term(funding_value.term.term).unwrap().unwrap().name, "high");
}

#[test]
fn growth_profile_matches_hand_computation() {
    let store = store();
    let fintech = store.ecosystem_by_name("Fintech").unwrap().id;
    let apollo = store.project_by_name("Apollo").unwrap().id;
    let growth = store.characteristic_by_name("Growth").unwrap().id;

    let profiles = potentials_fuzzy_value(&store, fintech, apollo).unwrap();
    assert_eq!(profiles.len(), 1);
    let profile = &profiles[&growth];

    // low:  0.6 * mu(1) = 0.6 * 0.5
    // mid:  0.6 * mu(1) + 0.4 * mu(2) = 0.6 * 0.5 + 0.4 * 0.5
    // high: 0.4 * mu(2) = 0.4 * 0.5
    let weights: Vec<f64> = profile.terms.iter().map(|t| t.weight).collect();
    assert!(approx(weights[0], 0.3));
    assert!(approx(weights[1], 0.5));
    assert!(approx(weights[2], 0.2));

    // 0.3 * 1.5 + 0.5 * (2.5 - 0.5) + 0.2 * (3.0 - 1.5)
    let scores = potentials_value(&store, fintech, apollo).unwrap();
    assert!(approx(scores[&growth].score, 1.75));
}

#[test]
fn unranked_leaf_is_skipped() {
    let store = store();
    let fintech = store.ecosystem_by_name("Fintech").unwrap().id;
    let gemini = store.project_by_name("Gemini").unwrap().id;

    let scores = potentials_value(&store, fintech, gemini).unwrap();
    let growth = scores.values().next().unwrap();
    assert!(approx(growth.score, 0.6 * 1.5));
}

#[test]
fn ranked_leaf_without_terms_is_a_configuration_error() {
    let store = store();
    let fintech = store.ecosystem_by_name("Fintech").unwrap().id;
    let hermes = store.project_by_name("Hermes").unwrap().id;

    let err = potentials_value(&store, fintech, hermes).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, ScoringError::MissingTerms { .. }));

    let churn = store.characteristic_by_name("Churn").unwrap().id;
    let fact = store.get_rank(fintech, hermes, churn).unwrap().unwrap();
    assert!(fuzzy_value(&store, &fact).is_err());
}

#[test]
fn ecosystem_without_potentials_is_empty() {
    let store = store();
    let empty = store.ecosystem_by_name("Empty").unwrap().id;
    let apollo = store.project_by_name("Apollo").unwrap().id;
    assert!(potentials_value(&store, empty, apollo).unwrap().is_empty());
}

#[test]
fn second_rank_row_is_rejected() {
    let mut store = store();
    let fintech = store.ecosystem_by_name("Fintech").unwrap().id;
    let apollo = store.project_by_name("Apollo").unwrap().id;
    let team = store.characteristic_by_name("Team Size").unwrap().id;

    let err = store
        .insert_rank(ProjectCharacteristicRank {
            ecosystem: fintech,
            project: apollo,
            characteristic: team,
            rank: 7,
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { entity: "rank", .. }));
}

#[test]
fn snapshot_with_weight_toward_common_characteristic_is_rejected() {
    let broken = SNAPSHOT.replace(
        "potential = \"Growth\"\ncharacteristic = \"Churn\"",
        "potential = \"Funding\"\ncharacteristic = \"Churn\"",
    );
    let snapshot = parse_snapshot_str(&broken, Path::new("broken.toml")).unwrap();
    let err = MemoryStore::from_snapshot(snapshot).unwrap_err();
    assert!(matches!(err, StoreError::NotAPotential(name) if name == "Funding"));
}

#[tokio::test]
async fn batch_scoring_records_failures_without_aborting() {
    let store = store();
    let fintech = store.ecosystem_by_name("Fintech").unwrap().id;
    let engine = ScoringEngine::new(Arc::new(store), EngineConfig { parallelism: 2 });

    let report = engine.score_ecosystem(fintech, &NoopReporter).await.unwrap();

    assert_eq!(report.ecosystem.name, "Fintech");
    assert_eq!(report.ecosystem.project_count, 3);

    let names: Vec<_> = report.projects.iter().map(|p| p.project.as_str()).collect();
    assert_eq!(names, vec!["Apollo", "Gemini"]);
    assert!(approx(report.projects[0].scores["Growth"], 1.75));

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].project, "Hermes");
    assert!(report.failures[0].configuration);

    let growth = &report.aggregate["Growth"];
    assert_eq!(growth.count, 2);
    assert_eq!(growth.best_project, "Apollo");
}

#[tokio::test]
async fn unknown_ecosystem_fails_the_run() {
    let engine = ScoringEngine::new(Arc::new(store()), EngineConfig::default());
    assert!(engine
        .score_ecosystem(EcosystemId(99), &NoopReporter)
        .await
        .is_err());
}
