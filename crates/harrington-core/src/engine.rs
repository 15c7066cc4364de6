//! Scoring engine.
//!
//! Wraps a shared [`RelationSource`] and scores single projects or every
//! project of an ecosystem. Batch runs put each project on a blocking task,
//! bounded by a semaphore.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::aggregate::{self, PotentialProfile, PotentialScore};
use crate::error::ScoringError;
use crate::model::{
    CharacteristicId, EcosystemId, Project, ProjectCharacteristicRank, ProjectId,
};
use crate::report::{EcosystemSummary, ProjectFailure, ProjectScores, ScoreReport};
use crate::statistics::compute_potential_stats;
use crate::traits::RelationSource;
use crate::valuation::{self, Membership};

/// Configuration for the scoring engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of projects scored at once.
    pub parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_project_start(&self, project: &str);
    fn on_project_complete(&self, scores: &ProjectScores);
    fn on_project_error(&self, project: &str, error: &str);
    fn on_run_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_project_start(&self, _: &str) {}
    fn on_project_complete(&self, _: &ProjectScores) {}
    fn on_project_error(&self, _: &str, _: &str) {}
    fn on_run_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The scoring engine.
pub struct ScoringEngine {
    source: Arc<dyn RelationSource>,
    config: EngineConfig,
}

impl ScoringEngine {
    pub fn new(source: Arc<dyn RelationSource>, config: EngineConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &dyn RelationSource {
        self.source.as_ref()
    }

    /// Membership of a rank fact in every term of its characteristic.
    pub fn fuzzy_value(
        &self,
        fact: &ProjectCharacteristicRank,
    ) -> Result<Vec<Membership>, ScoringError> {
        valuation::fuzzy_value(self.source(), fact)
    }

    /// Dominant term of `characteristic` for `project`.
    pub fn value(
        &self,
        ecosystem: EcosystemId,
        project: ProjectId,
        characteristic: CharacteristicId,
    ) -> Result<Membership, ScoringError> {
        valuation::value_of(self.source(), ecosystem, project, characteristic)
    }

    pub fn potentials_fuzzy_value(
        &self,
        ecosystem: EcosystemId,
        project: ProjectId,
    ) -> Result<BTreeMap<CharacteristicId, PotentialProfile>, ScoringError> {
        aggregate::potentials_fuzzy_value(self.source(), ecosystem, project)
    }

    pub fn potentials_value(
        &self,
        ecosystem: EcosystemId,
        project: ProjectId,
    ) -> Result<BTreeMap<CharacteristicId, PotentialScore>, ScoringError> {
        aggregate::potentials_value(self.source(), ecosystem, project)
    }

    /// Score every project that has rank facts in `ecosystem`.
    pub async fn score_ecosystem(
        &self,
        ecosystem: EcosystemId,
        progress: &dyn ProgressReporter,
    ) -> Result<ScoreReport> {
        let projects = self
            .source
            .list_projects(ecosystem)
            .with_context(|| format!("failed to list projects of ecosystem {ecosystem}"))?;
        self.score_projects(ecosystem, projects, progress).await
    }

    /// Score the given projects concurrently.
    ///
    /// A project that fails is recorded in the report's failures and does not
    /// stop the others.
    pub async fn score_projects(
        &self,
        ecosystem: EcosystemId,
        projects: Vec<Project>,
        progress: &dyn ProgressReporter,
    ) -> Result<ScoreReport> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();

        let summary = self
            .source
            .ecosystem(ecosystem)?
            .map(|e| EcosystemSummary {
                id: e.id,
                name: e.name,
                project_count: projects.len(),
            })
            .ok_or_else(|| anyhow::anyhow!("unknown ecosystem {ecosystem}"))?;

        let ranked: BTreeSet<ProjectId> = self
            .source
            .list_projects(ecosystem)
            .with_context(|| format!("failed to list projects of ecosystem {ecosystem}"))?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let total = projects.len();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();
        let mut failures = Vec::new();

        for project in projects {
            progress.on_project_start(&project.name);

            // Scores only exist for projects ranked in the ecosystem
            if !ranked.contains(&project.id) {
                let error = format!(
                    "project {} has no ranks in ecosystem {}",
                    project.name, summary.name
                );
                tracing::error!("{error}");
                progress.on_project_error(&project.name, &error);
                failures.push(ProjectFailure {
                    project_id: project.id,
                    project: project.name,
                    error,
                    configuration: false,
                });
                continue;
            }

            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);

            futures.push(async move {
                let ctx_project = (project.id, project.name.clone());
                let inner = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                    let scores = tokio::task::spawn_blocking(move || {
                        score_project(source.as_ref(), ecosystem, project)
                    })
                    .await
                    .context("scoring task panicked")??;
                    Ok::<_, anyhow::Error>(scores)
                };
                (ctx_project, inner.await)
            });
        }

        let mut results = Vec::new();

        while let Some(((project_id, project_name), outcome)) = futures.next().await {
            match outcome {
                Ok(scores) => {
                    progress.on_project_complete(&scores);
                    results.push(scores);
                }
                Err(e) => {
                    tracing::error!("scoring failed for {project_name}: {e:#}");
                    progress.on_project_error(&project_name, &e.to_string());
                    let configuration = e
                        .downcast_ref::<ScoringError>()
                        .is_some_and(ScoringError::is_configuration);
                    failures.push(ProjectFailure {
                        project_id,
                        project: project_name,
                        error: format!("{e:#}"),
                        configuration,
                    });
                }
            }
        }

        results.sort_by(|a, b| a.project.cmp(&b.project));
        failures.sort_by(|a, b| a.project.cmp(&b.project));

        let elapsed = start.elapsed();
        progress.on_run_complete(total, results.len(), failures.len(), elapsed);

        let aggregate = compute_potential_stats(&results);

        Ok(ScoreReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            ecosystem: summary,
            projects: results,
            failures,
            aggregate,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

/// Score one project, keyed by potential name.
pub fn score_project(
    source: &dyn RelationSource,
    ecosystem: EcosystemId,
    project: Project,
) -> Result<ProjectScores, ScoringError> {
    let scores = aggregate::potentials_value(source, ecosystem, project.id)?
        .into_values()
        .map(|s| (s.potential.name, s.score))
        .collect();

    Ok(ProjectScores {
        project_id: project.id,
        project: project.name,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CharacteristicKind;
    use crate::testing::FixtureSource;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn on_project_start(&self, project: &str) {
            self.events.lock().unwrap().push(format!("start {project}"));
        }
        fn on_project_complete(&self, scores: &ProjectScores) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {}", scores.project));
        }
        fn on_project_error(&self, project: &str, _: &str) {
            self.events.lock().unwrap().push(format!("error {project}"));
        }
        fn on_run_complete(&self, total: usize, completed: usize, failed: usize, _: Duration) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finish {total}/{completed}/{failed}"));
        }
    }

    fn source() -> FixtureSource {
        FixtureSource::new()
            .with_characteristic(1, "Team Size", CharacteristicKind::Common)
            .with_characteristic(2, "Funding", CharacteristicKind::Common)
            .with_characteristic(10, "Growth", CharacteristicKind::Potential)
            .with_term(1, 0, 1, [0.0, 0.0, 5.0, 10.0])
            .with_term(1, 1, 2, [5.0, 10.0, 20.0, 20.0])
            .with_term(10, 0, 1, [0.0, 0.0, 0.5, 1.0])
            .with_term(10, 1, 2, [0.0, 1.0, 1.0, 2.0])
            .with_weight(10, 1, 1.0)
            .with_rank(1, 1, 3)
            .with_rank(2, 1, 15)
    }

    fn engine(source: FixtureSource) -> ScoringEngine {
        ScoringEngine::new(Arc::new(source), EngineConfig { parallelism: 2 })
    }

    #[test]
    fn value_delegates_to_valuation() {
        let engine = engine(source());
        let dominant = engine
            .value(EcosystemId(1), ProjectId(2), CharacteristicId(1))
            .unwrap();
        assert_eq!(dominant.term.index.0, 1);
    }

    #[tokio::test]
    async fn scores_every_ranked_project() {
        let engine = engine(source());
        let reporter = RecordingReporter::default();
        let report = engine
            .score_ecosystem(EcosystemId(1), &reporter)
            .await
            .unwrap();

        assert_eq!(report.ecosystem.name, "eco");
        assert_eq!(report.projects.len(), 2);
        assert!(report.failures.is_empty());

        // apollo: index 0 -> low(1) * width 1 + high(0) * width 2
        let apollo = &report.projects[0];
        assert_eq!(apollo.project, "apollo");
        assert_eq!(apollo.scores["Growth"], 1.0);
        // project-2: index 1 -> low(0) + high(1) * width 2
        assert_eq!(report.projects[1].scores["Growth"], 2.0);

        assert_eq!(report.aggregate["Growth"].count, 2);

        let events = reporter.events.lock().unwrap();
        assert!(events.contains(&"finish 2/2/0".to_string()));
    }

    #[tokio::test]
    async fn failures_are_recorded_per_project() {
        // project 3 ranks on Funding, which has no terms but is weighted in
        let source = source().with_weight(10, 2, 0.5).with_rank(3, 2, 4);
        let engine = engine(source);
        let report = engine
            .score_ecosystem(EcosystemId(1), &NoopReporter)
            .await
            .unwrap();

        assert_eq!(report.projects.len(), 2);
        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.project, "project-3");
        assert!(failure.configuration);
        assert!(failure.error.contains("no terms configured"));
    }

    #[tokio::test]
    async fn unranked_project_is_a_failure_not_a_zero_score() {
        let engine = engine(source());
        let stranger = Project {
            id: ProjectId(77),
            name: "stranger".into(),
            owners: Default::default(),
        };
        let reporter = RecordingReporter::default();
        let report = engine
            .score_projects(EcosystemId(1), vec![stranger], &reporter)
            .await
            .unwrap();

        assert!(report.projects.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].project, "stranger");
        assert!(!report.failures[0].configuration);
        assert!(report.failures[0].error.contains("has no ranks"));

        let events = reporter.events.lock().unwrap();
        assert!(events.contains(&"error stranger".to_string()));
        assert!(events.contains(&"finish 1/0/1".to_string()));
    }

    #[tokio::test]
    async fn unknown_ecosystem_is_an_error() {
        let engine = engine(source());
        let result = engine.score_ecosystem(EcosystemId(42), &NoopReporter).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_ecosystem_yields_empty_report() {
        let engine = engine(FixtureSource::new());
        let report = engine
            .score_ecosystem(EcosystemId(1), &NoopReporter)
            .await
            .unwrap();
        assert!(report.projects.is_empty());
        assert!(report.aggregate.is_empty());
    }
}
