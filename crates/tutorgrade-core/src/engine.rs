//! Batch scoring orchestrator.
//!
//! Scores many learners concurrently against one catalog and rule set, and
//! keeps an append-only log of every outcome produced by the engine.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::evaluator::{evaluate, Evaluation, Thresholds};
use crate::model::{DifficultyWeights, Learner, QuestionCatalog};
use crate::report::{BatchReport, BatchSummary, CatalogSummary};
use crate::rules::RuleSet;
use crate::statistics::{aggregate, Performance};

/// Configuration for the scoring engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    pub weights: DifficultyWeights,
    /// Maximum learners scored at once.
    pub parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            weights: DifficultyWeights::default(),
            parallelism: 4,
        }
    }
}

/// Everything computed for one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerOutcome {
    pub learner_id: String,
    pub performance: Performance,
    pub evaluation: Evaluation,
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_learner_start(&self, learner_id: &str);
    fn on_learner_complete(&self, outcome: &LearnerOutcome);
    fn on_learner_error(&self, learner_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_learner_start(&self, _: &str) {}
    fn on_learner_complete(&self, _: &LearnerOutcome) {}
    fn on_learner_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Append-only record of learner outcomes.
#[derive(Debug, Default)]
pub struct LearnerLog {
    entries: Mutex<Vec<LearnerOutcome>>,
}

impl LearnerLog {
    fn lock(&self) -> MutexGuard<'_, Vec<LearnerOutcome>> {
        // Entries are only ever pushed, so a poisoned lock still holds a valid log.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn append(&self, outcome: LearnerOutcome) {
        self.lock().push(outcome);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every entry, oldest first.
    pub fn snapshot(&self) -> Vec<LearnerOutcome> {
        self.lock().clone()
    }
}

/// The batch scoring engine.
pub struct ScoringEngine {
    catalog: Arc<QuestionCatalog>,
    rules: Arc<RuleSet>,
    config: EngineConfig,
    log: LearnerLog,
}

impl ScoringEngine {
    pub fn new(catalog: Arc<QuestionCatalog>, rules: Arc<RuleSet>, config: EngineConfig) -> Self {
        Self {
            catalog,
            rules,
            config,
            log: LearnerLog::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn log(&self) -> &LearnerLog {
        &self.log
    }

    /// Score a single learner synchronously. Does not touch the log.
    pub fn score(&self, learner: &Learner) -> LearnerOutcome {
        score_learner(&self.catalog, &self.rules, &self.config, learner)
    }

    /// Score every learner and summarize the batch.
    ///
    /// Progress callbacks fire as each learner finishes; outcomes are
    /// returned and logged in input order regardless of completion order.
    pub async fn run(
        &self,
        learners: Vec<Learner>,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let start = Instant::now();
        let batch_id = Uuid::new_v4();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let total = learners.len();

        let mut futures = FuturesUnordered::new();

        for (index, learner) in learners.into_iter().enumerate() {
            let catalog = Arc::clone(&self.catalog);
            let rules = Arc::clone(&self.rules);
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();
            let learner_id = learner.id.clone();

            futures.push(async move {
                let inner = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_learner_start(&learner_id);

                    tokio::task::spawn_blocking(move || {
                        score_learner(&catalog, &rules, &config, &learner)
                    })
                    .await
                    .map_err(|e| anyhow::anyhow!("scoring task failed: {e}"))
                };
                let result = inner.await;
                (index, learner_id, result)
            });
        }

        let mut finished = Vec::with_capacity(total);
        let mut failed = 0usize;

        while let Some((index, learner_id, result)) = futures.next().await {
            match result {
                Ok(outcome) => {
                    progress.on_learner_complete(&outcome);
                    finished.push((index, outcome));
                }
                Err(e) => {
                    tracing::error!("scoring failed for {learner_id}: {e:#}");
                    progress.on_learner_error(&learner_id, &e.to_string());
                    failed += 1;
                }
            }
        }

        finished.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<LearnerOutcome> = finished.into_iter().map(|(_, o)| o).collect();

        for outcome in &outcomes {
            self.log.append(outcome.clone());
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, outcomes.len(), failed, elapsed);

        let summary = BatchSummary::from_outcomes(&outcomes, failed);

        Ok(BatchReport {
            id: batch_id,
            created_at: chrono::Utc::now(),
            catalog: CatalogSummary::of(&self.catalog, self.rules.len()),
            outcomes,
            summary,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

fn score_learner(
    catalog: &QuestionCatalog,
    rules: &RuleSet,
    config: &EngineConfig,
    learner: &Learner,
) -> LearnerOutcome {
    let performance = aggregate(&learner.answers, catalog, &config.weights);
    let evaluation = evaluate(&performance, rules, &config.thresholds);
    tracing::debug!(
        learner = %learner.id,
        fired = evaluation.fired.len(),
        "scored learner"
    );
    LearnerOutcome {
        learner_id: learner.id.clone(),
        performance,
        evaluation,
    }
}
