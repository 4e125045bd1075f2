//! Batch report types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::LearnerOutcome;
use crate::model::QuestionCatalog;

/// The result of scoring a batch of learners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique batch identifier.
    pub id: Uuid,
    /// When the batch finished.
    pub created_at: DateTime<Utc>,
    pub catalog: CatalogSummary,
    /// One outcome per successfully scored learner, in input order.
    pub outcomes: Vec<LearnerOutcome>,
    pub summary: BatchSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn outcome(&self, learner_id: &str) -> Option<&LearnerOutcome> {
        self.outcomes.iter().find(|o| o.learner_id == learner_id)
    }
}

/// Shape of the catalog and rule set a batch was scored against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub question_count: usize,
    pub area_count: usize,
    pub topic_count: usize,
    pub rule_count: usize,
}

impl CatalogSummary {
    pub fn of(catalog: &QuestionCatalog, rule_count: usize) -> Self {
        Self {
            question_count: catalog.len(),
            area_count: catalog.areas().len(),
            topic_count: catalog.leaves().len(),
            rule_count,
        }
    }
}

/// How many learners raised each topic flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCounts {
    pub review: usize,
    pub hint: usize,
    pub visualization: usize,
}

/// Aggregate view across every learner of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub learners_scored: usize,
    pub learners_failed: usize,
    /// Mean of each learner's points summed over areas.
    pub mean_points: f64,
    pub topics: BTreeMap<String, TopicCounts>,
    /// Learners flagged for focus, per area.
    pub areas: BTreeMap<String, usize>,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[LearnerOutcome], failed: usize) -> Self {
        let mut summary = BatchSummary {
            learners_scored: outcomes.len(),
            learners_failed: failed,
            ..Default::default()
        };

        let mut total_points = 0u64;
        for outcome in outcomes {
            total_points += outcome
                .performance
                .areas
                .values()
                .map(|r| r.points as u64)
                .sum::<u64>();

            for (topic, flags) in &outcome.evaluation.flags.topics {
                let counts = summary.topics.entry(topic.clone()).or_default();
                counts.review += flags.needs_review as usize;
                counts.hint += flags.needs_hint as usize;
                counts.visualization += flags.needs_visualization as usize;
            }
            for (area, flags) in &outcome.evaluation.flags.areas {
                *summary.areas.entry(area.clone()).or_default() += flags.needs_focus as usize;
            }
        }

        if !outcomes.is_empty() {
            summary.mean_points = total_points as f64 / outcomes.len() as f64;
        }
        summary
    }

    /// Topics sorted by how many learners need to review them, most first.
    pub fn most_reviewed_topics(&self) -> Vec<(&str, usize)> {
        let mut topics: Vec<(&str, usize)> = self
            .topics
            .iter()
            .filter(|(_, c)| c.review > 0)
            .map(|(name, c)| (name.as_str(), c.review))
            .collect();
        topics.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        topics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluation;
    use crate::feedback::{AreaFlags, TopicFlags};
    use crate::model::DifficultyTable;
    use crate::statistics::{Performance, PerformanceRecord};

    fn outcome(id: &str, points: u32, review: &[&str], focus: bool) -> LearnerOutcome {
        let mut performance = Performance::default();
        performance.areas.insert(
            "Biology".into(),
            PerformanceRecord {
                total_questions: 3,
                points,
                percent_correct: 0.0,
                percent_correct_by_difficulty: DifficultyTable::default(),
            },
        );
        let mut evaluation = Evaluation::default();
        for topic in ["Cells", "Genetics"] {
            evaluation.flags.topics.insert(
                topic.into(),
                TopicFlags {
                    needs_review: review.contains(&topic),
                    needs_hint: topic == "Cells",
                    ..Default::default()
                },
            );
        }
        evaluation
            .flags
            .areas
            .insert("Biology".into(), AreaFlags { needs_focus: focus });
        LearnerOutcome {
            learner_id: id.into(),
            performance,
            evaluation,
        }
    }

    #[test]
    fn summary_counts_flags() {
        let outcomes = vec![
            outcome("a", 6, &["Cells"], true),
            outcome("b", 2, &["Cells", "Genetics"], false),
            outcome("c", 1, &[], true),
        ];
        let summary = BatchSummary::from_outcomes(&outcomes, 1);

        assert_eq!(summary.learners_scored, 3);
        assert_eq!(summary.learners_failed, 1);
        assert!((summary.mean_points - 3.0).abs() < 1e-9);
        assert_eq!(
            summary.topics["Cells"],
            TopicCounts {
                review: 2,
                hint: 3,
                visualization: 0
            }
        );
        assert_eq!(summary.topics["Genetics"].review, 1);
        assert_eq!(summary.areas["Biology"], 2);
        assert_eq!(summary.most_reviewed_topics(), vec![("Cells", 2), ("Genetics", 1)]);
    }

    #[test]
    fn empty_summary() {
        let summary = BatchSummary::from_outcomes(&[], 0);
        assert_eq!(summary, BatchSummary::default());
    }
}
