//! Score report types with JSON persistence and drift detection.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{EcosystemId, ProjectId};
use crate::statistics::PotentialStats;

/// Potential scores of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectScores {
    pub project_id: ProjectId,
    pub project: String,
    /// Potential name → crisp score.
    pub scores: BTreeMap<String, f64>,
}

/// A project whose aggregation failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFailure {
    pub project_id: ProjectId,
    pub project: String,
    pub error: String,
    /// Whether the failure was missing term configuration.
    pub configuration: bool,
}

/// Summary of the scored ecosystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcosystemSummary {
    pub id: EcosystemId,
    pub name: String,
    pub project_count: usize,
}

/// A complete scoring run over one ecosystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub ecosystem: EcosystemSummary,
    /// Successfully scored projects, by name.
    pub projects: Vec<ProjectScores>,
    #[serde(default)]
    pub failures: Vec<ProjectFailure>,
    /// Potential name → statistics across projects.
    pub aggregate: BTreeMap<String, PotentialStats>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ScoreReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ScoreReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline, per (project, potential).
    pub fn compare(&self, baseline: &ScoreReport, threshold: f64) -> DriftReport {
        let score_map = |report: &ScoreReport| -> BTreeMap<(String, String), f64> {
            report
                .projects
                .iter()
                .flat_map(|p| {
                    p.scores
                        .iter()
                        .map(move |(potential, &s)| ((p.project.clone(), potential.clone()), s))
                })
                .collect()
        };

        let baseline_scores = score_map(baseline);
        let current_scores = score_map(self);

        let mut declines = Vec::new();
        let mut gains = Vec::new();
        let mut unchanged = 0usize;
        let mut new_entries = 0usize;

        for (key, &current) in &current_scores {
            let Some(&baseline_val) = baseline_scores.get(key) else {
                new_entries += 1;
                continue;
            };
            let drift = Drift {
                project: key.0.clone(),
                potential: key.1.clone(),
                baseline_score: baseline_val,
                current_score: current,
                delta: current - baseline_val,
            };
            if drift.delta < -threshold {
                declines.push(drift);
            } else if drift.delta > threshold {
                gains.push(drift);
            } else {
                unchanged += 1;
            }
        }

        let removed_entries = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        DriftReport {
            declines,
            gains,
            unchanged,
            new_entries,
            removed_entries,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    /// Scores that went down by more than the threshold.
    pub declines: Vec<Drift>,
    /// Scores that went up by more than the threshold.
    pub gains: Vec<Drift>,
    pub unchanged: usize,
    /// (project, potential) pairs only in the current report.
    pub new_entries: usize,
    /// (project, potential) pairs only in the baseline.
    pub removed_entries: usize,
}

/// A score change for one (project, potential) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drift {
    pub project: String,
    pub potential: String,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl DriftReport {
    /// Format the drift report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} declines, {} gains, {} unchanged\n\n",
            self.declines.len(),
            self.gains.len(),
            self.unchanged
        ));

        for (title, rows) in [("Declines", &self.declines), ("Gains", &self.gains)] {
            if rows.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Project | Potential | Baseline | Current | Delta |\n");
            md.push_str("|---------|-----------|----------|---------|-------|\n");
            for d in rows {
                md.push_str(&format!(
                    "| {} | {} | {:.3} | {:.3} | {:+.3} |\n",
                    d.project, d.potential, d.baseline_score, d.current_score, d.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if any score declined.
    pub fn has_declines(&self) -> bool {
        !self.declines.is_empty()
    }
}
