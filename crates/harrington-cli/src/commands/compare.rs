//! The `harrington compare` command.

use std::path::PathBuf;

use anyhow::Result;

use harrington_core::report::ScoreReport;
use harrington_store::load_config_from;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: Option<f64>,
    fail_on_decline: bool,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let threshold = match threshold {
        Some(t) => t,
        None => load_config_from(config_path.as_deref())?.drift_threshold,
    };
    anyhow::ensure!(
        threshold.is_finite() && threshold >= 0.0,
        "threshold must be a non-negative number"
    );

    let baseline = ScoreReport::load_json(&baseline_path)?;
    let current = ScoreReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} declines, {} gains, {} unchanged",
                report.declines.len(),
                report.gains.len(),
                report.unchanged
            );

            for (title, rows) in [("Declines", &report.declines), ("Gains", &report.gains)] {
                if rows.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for d in rows {
                    println!(
                        "  {} / {}: {:.3} -> {:.3} ({:+.3})",
                        d.project, d.potential, d.baseline_score, d.current_score, d.delta
                    );
                }
            }

            if report.new_entries > 0 {
                println!("\n{} new score(s)", report.new_entries);
            }
            if report.removed_entries > 0 {
                println!("{} removed score(s)", report.removed_entries);
            }
        }
    }

    if fail_on_decline && report.has_declines() {
        std::process::exit(1);
    }

    Ok(())
}
