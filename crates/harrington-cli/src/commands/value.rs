//! The `harrington value` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use harrington_core::engine::{EngineConfig, ScoringEngine};
use harrington_core::model::{CharacteristicId, CharacteristicTerm, EcosystemId, ProjectId};
use harrington_core::valuation::select_dominant;
use harrington_core::{RelationSource, ScoringError};
use harrington_store::{load_config_from, open_store};

pub fn execute(
    ecosystem: String,
    project: String,
    characteristic: String,
    snapshot: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = open_store(&config.snapshot_path(snapshot.as_deref())?)?;

    let ecosystem = store.ecosystem_by_name(&ecosystem)?.id;
    let project = store.project_by_name(&project)?.clone();
    let characteristic = store.characteristic_by_name(&characteristic)?.clone();

    let engine = ScoringEngine::new(Arc::new(store), EngineConfig::default());

    println!(
        "{} / {} / {}",
        project.name,
        characteristic.name,
        characteristic.kind
    );

    if characteristic.is_potential() {
        show_potential(&engine, ecosystem, project.id, characteristic.id)
    } else {
        show_leaf(&engine, ecosystem, project.id, characteristic.id)
    }
}

fn show_leaf(
    engine: &ScoringEngine,
    ecosystem: EcosystemId,
    project: ProjectId,
    characteristic: CharacteristicId,
) -> Result<()> {
    let fact = engine
        .source()
        .get_rank(ecosystem, project, characteristic)?
        .ok_or(ScoringError::MissingRank {
            ecosystem,
            project,
            characteristic,
        })?;
    println!("Rank: {}", fact.rank);

    let memberships = engine.fuzzy_value(&fact)?;
    let dominant = select_dominant(&memberships).map(|m| m.term.index);

    let mut table = Table::new();
    table.set_header(vec!["", "Index", "Term", "Shape", "Membership"]);
    for m in &memberships {
        let marker = if Some(m.term.index) == dominant { "*" } else { "" };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(m.term.index),
            Cell::new(term_name(engine.source(), &m.term)?),
            Cell::new(shape(&m.term)),
            Cell::new(format!("{:.3}", m.degree)),
        ]);
    }
    println!("{table}");

    let value = engine.value(ecosystem, project, characteristic)?;
    println!(
        "Value: {} (index {}, membership {:.3})",
        term_name(engine.source(), &value.term)?,
        value.term.index,
        value.degree
    );
    Ok(())
}

fn show_potential(
    engine: &ScoringEngine,
    ecosystem: EcosystemId,
    project: ProjectId,
    potential: CharacteristicId,
) -> Result<()> {
    let mut profiles = engine.potentials_fuzzy_value(ecosystem, project)?;
    let profile = profiles
        .remove(&potential)
        .context("potential has no weighted characteristics in this ecosystem")?;

    let mut table = Table::new();
    table.set_header(vec!["Characteristic", "Weight", "Dominant index"]);
    for c in &profile.contributions {
        let name = engine
            .source()
            .characteristic(c.characteristic)?
            .map_or_else(|| c.characteristic.to_string(), |ch| ch.name);
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.3}", c.weight)),
            Cell::new(c.index),
        ]);
    }
    println!("{table}");

    let mut table = Table::new();
    table.set_header(vec!["Index", "Term", "Shape", "Weight"]);
    for t in &profile.terms {
        table.add_row(vec![
            Cell::new(t.term.index),
            Cell::new(term_name(engine.source(), &t.term)?),
            Cell::new(shape(&t.term)),
            Cell::new(format!("{:.3}", t.weight)),
        ]);
    }
    println!("{table}");

    let scores = engine.potentials_value(ecosystem, project)?;
    let score = scores.get(&potential).map_or(0.0, |s| s.score);
    println!("Score: {score:.3}");
    Ok(())
}

fn term_name(source: &dyn RelationSource, term: &CharacteristicTerm) -> Result<String> {
    Ok(source
        .term(term.term)?
        .map_or_else(|| term.term.to_string(), |t| t.name))
}

fn shape(term: &CharacteristicTerm) -> String {
    let s = &term.shape;
    format!("({}, {}, {}, {})", s.a1(), s.a2(), s.a3(), s.a4())
}
