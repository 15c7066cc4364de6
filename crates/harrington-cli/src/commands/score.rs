//! The `harrington score` command.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use harrington_core::engine::{EngineConfig, ProgressReporter, ScoringEngine};
use harrington_core::report::{ProjectScores, ScoreReport};
use harrington_core::statistics::rank_projects;
use harrington_core::RelationSource;
use harrington_store::{load_config_from, open_store};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_project_start(&self, project: &str) {
        eprintln!("  Scoring: {project}");
    }

    fn on_project_complete(&self, scores: &ProjectScores) {
        eprintln!(
            "  Done: {} ({} potentials)",
            scores.project,
            scores.scores.len()
        );
    }

    fn on_project_error(&self, project: &str, error: &str) {
        eprintln!("  ERROR: {project}: {error}");
    }

    fn on_run_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} scored, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    ecosystem: String,
    project: Option<String>,
    snapshot: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    anyhow::ensure!(
        matches!(format.as_str(), "table" | "json"),
        "unknown format '{format}', expected table or json"
    );

    let snapshot_path = config.snapshot_path(snapshot.as_deref())?;
    let store = open_store(&snapshot_path)?;

    let ecosystem_name = ecosystem;
    let ecosystem = store.ecosystem_by_name(&ecosystem_name)?.id;
    let only = project
        .map(|name| store.project_by_name(&name).cloned())
        .transpose()?;
    if let Some(project) = &only {
        let ranked = store.list_projects(ecosystem)?;
        anyhow::ensure!(
            ranked.iter().any(|p| p.id == project.id),
            "project {} has no ranks in ecosystem {ecosystem_name}",
            project.name
        );
    }

    let engine = ScoringEngine::new(Arc::new(store), EngineConfig { parallelism });
    let reporter = ConsoleReporter;

    let report = match only {
        Some(project) => {
            engine
                .score_projects(ecosystem, vec![project], &reporter)
                .await?
        }
        None => engine.score_ecosystem(ecosystem, &reporter).await?,
    };

    let output = output.unwrap_or(config.output_dir);
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("scores-{timestamp}.json"));
    report.save_json(&path)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_summary(&report),
    }
    eprintln!("Results saved to: {}", path.display());

    Ok(())
}

fn print_summary(report: &ScoreReport) {
    let potentials: BTreeSet<&str> = report
        .projects
        .iter()
        .flat_map(|p| p.scores.keys().map(String::as_str))
        .collect();

    println!(
        "Ecosystem: {} ({} projects)",
        report.ecosystem.name, report.ecosystem.project_count
    );

    let mut table = Table::new();
    let mut header = vec!["Project".to_string()];
    header.extend(potentials.iter().map(|p| p.to_string()));
    table.set_header(header);

    for project in &report.projects {
        let mut row = vec![Cell::new(&project.project)];
        row.extend(potentials.iter().map(|potential| {
            match project.scores.get(*potential) {
                Some(score) => Cell::new(format!("{score:.3}")),
                None => Cell::new("-"),
            }
        }));
        table.add_row(row);
    }
    println!("{table}");

    if !report.aggregate.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Potential", "Count", "Mean", "Min", "Max", "Best"]);
        for stats in report.aggregate.values() {
            table.add_row(vec![
                Cell::new(&stats.potential),
                Cell::new(stats.count),
                Cell::new(format!("{:.3}", stats.mean)),
                Cell::new(format!("{:.3}", stats.min)),
                Cell::new(format!("{:.3}", stats.max)),
                Cell::new(&stats.best_project),
            ]);
        }
        println!("\n{table}");
    }

    for potential in &potentials {
        let ranking: Vec<String> = rank_projects(&report.projects, potential)
            .into_iter()
            .map(|(project, score)| format!("{project} ({score:.3})"))
            .collect();
        println!("\n{potential}: {}", ranking.join(" > "));
    }

    if !report.failures.is_empty() {
        println!("\nFailures:");
        for failure in &report.failures {
            let kind = if failure.configuration {
                " [configuration]"
            } else {
                ""
            };
            println!("  {}{kind}: {}", failure.project, failure.error);
        }
    }
}
