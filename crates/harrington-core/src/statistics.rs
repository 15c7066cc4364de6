//! Per-potential statistics across the projects of one scoring run.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::report::ProjectScores;

/// Summary of one potential's scores across projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialStats {
    /// Potential name.
    pub potential: String,
    /// Number of projects scored on this potential.
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Highest-scoring project; ties go to the alphabetically first name.
    pub best_project: String,
}

/// Compute statistics for every potential that appears in `projects`.
pub fn compute_potential_stats(projects: &[ProjectScores]) -> BTreeMap<String, PotentialStats> {
    let mut grouped: BTreeMap<&str, Vec<(&str, f64)>> = BTreeMap::new();
    for p in projects {
        for (potential, &score) in &p.scores {
            grouped
                .entry(potential.as_str())
                .or_default()
                .push((p.project.as_str(), score));
        }
    }

    grouped
        .into_iter()
        .filter_map(|(potential, entries)| {
            let best = entries.iter().copied().min_by(by_score_desc)?;
            let count = entries.len();
            let sum: f64 = entries.iter().map(|(_, s)| s).sum();
            let min = entries.iter().map(|(_, s)| *s).fold(f64::INFINITY, f64::min);
            let max = entries
                .iter()
                .map(|(_, s)| *s)
                .fold(f64::NEG_INFINITY, f64::max);

            Some((
                potential.to_string(),
                PotentialStats {
                    potential: potential.to_string(),
                    count,
                    mean: sum / count as f64,
                    min,
                    max,
                    best_project: best.0.to_string(),
                },
            ))
        })
        .collect()
}

/// Projects ordered by their score on `potential`, best first.
///
/// Projects not scored on `potential` are left out.
pub fn rank_projects(projects: &[ProjectScores], potential: &str) -> Vec<(String, f64)> {
    let mut ranked: Vec<(&str, f64)> = projects
        .iter()
        .filter_map(|p| p.scores.get(potential).map(|&s| (p.project.as_str(), s)))
        .collect();
    ranked.sort_by(by_score_desc);
    ranked
        .into_iter()
        .map(|(name, score)| (name.to_string(), score))
        .collect()
}

fn by_score_desc(a: &(&str, f64), b: &(&str, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProjectId;

    fn project(id: u64, name: &str, scores: &[(&str, f64)]) -> ProjectScores {
        ProjectScores {
            project_id: ProjectId(id),
            project: name.into(),
            scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn stats_per_potential() {
        let projects = vec![
            project(1, "apollo", &[("Growth", 2.0), ("Stability", 1.0)]),
            project(2, "gemini", &[("Growth", 4.0)]),
            project(3, "mercury", &[("Growth", 3.0)]),
        ];
        let stats = compute_potential_stats(&projects);

        let growth = &stats["Growth"];
        assert_eq!(growth.count, 3);
        assert_eq!(growth.mean, 3.0);
        assert_eq!(growth.min, 2.0);
        assert_eq!(growth.max, 4.0);
        assert_eq!(growth.best_project, "gemini");

        let stability = &stats["Stability"];
        assert_eq!(stability.count, 1);
        assert_eq!(stability.best_project, "apollo");
    }

    #[test]
    fn best_project_tie_goes_to_first_name() {
        let projects = vec![
            project(1, "zeta", &[("Growth", 2.0)]),
            project(2, "alpha", &[("Growth", 2.0)]),
        ];
        let stats = compute_potential_stats(&projects);
        assert_eq!(stats["Growth"].best_project, "alpha");
    }

    #[test]
    fn ranking_skips_unscored_projects() {
        let projects = vec![
            project(1, "apollo", &[("Growth", 2.0)]),
            project(2, "gemini", &[("Stability", 9.0)]),
            project(3, "mercury", &[("Growth", 3.5)]),
        ];
        let ranked = rank_projects(&projects, "Growth");
        assert_eq!(
            ranked,
            vec![("mercury".to_string(), 3.5), ("apollo".to_string(), 2.0)]
        );
    }

    #[test]
    fn no_projects_no_stats() {
        assert!(compute_potential_stats(&[]).is_empty());
        assert!(rank_projects(&[], "Growth").is_empty());
    }
}
