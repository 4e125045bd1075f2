//! Performance aggregation.
//!
//! Folds a learner's answers over the question catalog into per-topic and
//! per-area tallies, then derives the percentages exposed to the rest of the
//! system. The raw per-difficulty counters only live in [`Tally`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerSet, Difficulty, DifficultyTable, DifficultyWeights, QuestionCatalog};

/// Correct/total counter for one difficulty tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub correct: u32,
    pub total: u32,
}

impl Counter {
    /// Percentage of correct answers, `0.0` when nothing was asked.
    pub fn percent(&self) -> f64 {
        percent(self.correct, self.total)
    }
}

fn percent(correct: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}

/// Running counters for one topic leaf or area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub total_questions: u32,
    pub points: u32,
    pub per_difficulty: DifficultyTable<Counter>,
}

impl Tally {
    /// Count one answered question.
    pub fn record(&mut self, difficulty: Difficulty, correct: bool, weights: &DifficultyWeights) {
        self.total_questions += 1;
        let counter = &mut self.per_difficulty[difficulty];
        counter.total += 1;
        if correct {
            counter.correct += 1;
            self.points += weights.points(difficulty);
        }
    }

    pub fn correct(&self) -> u32 {
        self.per_difficulty.iter().map(|(_, c)| c.correct).sum()
    }

    /// Sum of per-difficulty totals; equals `total_questions`.
    pub fn difficulty_total(&self) -> u32 {
        self.per_difficulty.iter().map(|(_, c)| c.total).sum()
    }

    /// Derive the externally visible record, dropping the raw counters.
    pub fn finish(&self) -> PerformanceRecord {
        PerformanceRecord {
            total_questions: self.total_questions,
            points: self.points,
            percent_correct: percent(self.correct(), self.difficulty_total()),
            percent_correct_by_difficulty: self.per_difficulty.map(Counter::percent),
        }
    }
}

/// Aggregated statistics for one topic leaf or one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub total_questions: u32,
    pub points: u32,
    /// Overall accuracy across every difficulty.
    pub percent_correct: f64,
    pub percent_correct_by_difficulty: DifficultyTable<f64>,
}

/// Per-topic and per-area performance of a single learner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub topics: BTreeMap<String, PerformanceRecord>,
    pub areas: BTreeMap<String, PerformanceRecord>,
}

/// Tallies before percentage derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceTally {
    pub topics: BTreeMap<String, Tally>,
    pub areas: BTreeMap<String, Tally>,
}

impl PerformanceTally {
    pub fn finish(&self) -> Performance {
        Performance {
            topics: self
                .topics
                .iter()
                .map(|(k, t)| (k.clone(), t.finish()))
                .collect(),
            areas: self
                .areas
                .iter()
                .map(|(k, t)| (k.clone(), t.finish()))
                .collect(),
        }
    }
}

/// Count every catalog question once against the learner's answers.
///
/// A leaf reached through several paths or areas accumulates into a single
/// shared tally, once per path occurrence.
pub fn tally(
    answers: &AnswerSet,
    catalog: &QuestionCatalog,
    weights: &DifficultyWeights,
) -> PerformanceTally {
    let mut result = PerformanceTally::default();

    for question in catalog.questions() {
        let correct = question.is_correct(answers.get(&question.id));
        let difficulty = question.difficulty;

        for (area, paths) in &question.topics {
            result
                .areas
                .entry(area.clone())
                .or_default()
                .record(difficulty, correct, weights);

            for path in paths {
                result
                    .topics
                    .entry(path.leaf().to_string())
                    .or_default()
                    .record(difficulty, correct, weights);
            }
        }
    }

    result
}

/// Aggregate a learner's answers into per-topic and per-area records.
pub fn aggregate(
    answers: &AnswerSet,
    catalog: &QuestionCatalog,
    weights: &DifficultyWeights,
) -> Performance {
    tally(answers, catalog, weights).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, TopicPath};

    /// Build a question from `(area, "Root/Leaf")` pairs; repeated areas append paths.
    fn question(id: &str, difficulty: Difficulty, topics: &[(&str, &str)]) -> Question {
        let mut map: BTreeMap<String, Vec<TopicPath>> = BTreeMap::new();
        for (area, path) in topics {
            let segments = path.split('/').map(str::to_string).collect();
            map.entry(area.to_string())
                .or_default()
                .push(TopicPath::new(segments).unwrap());
        }
        Question {
            id: id.into(),
            correct_answer: "A".into(),
            difficulty,
            topics: map,
        }
    }

    fn cells_catalog() -> QuestionCatalog {
        QuestionCatalog::new(vec![
            question("1", Difficulty::Easy, &[("Biology", "Cells")]),
            question("2", Difficulty::Easy, &[("Biology", "Cells")]),
        ])
    }

    fn mixed_catalog() -> QuestionCatalog {
        QuestionCatalog::new(vec![
            question("1", Difficulty::Easy, &[("Biology", "Cells/Membrane")]),
            question(
                "2",
                Difficulty::Medium,
                &[("Biology", "Cells/Membrane"), ("Biology", "Genetics")],
            ),
            question(
                "3",
                Difficulty::Hard,
                &[("Chemistry", "Organic"), ("Biology", "Genetics")],
            ),
            question("4", Difficulty::Hard, &[("Chemistry", "Organic/Membrane")]),
        ])
    }

    #[test]
    fn all_correct_cells() {
        let answers: AnswerSet = [("1", "A"), ("2", "A")].into_iter().collect();
        let perf = aggregate(&answers, &cells_catalog(), &DifficultyWeights::default());

        let cells = &perf.topics["Cells"];
        assert_eq!(cells.total_questions, 2);
        assert_eq!(cells.points, 2);
        assert_eq!(cells.percent_correct_by_difficulty.easy, 100.0);
        assert_eq!(cells.percent_correct, 100.0);
        assert_eq!(perf.areas["Biology"].points, 2);
    }

    #[test]
    fn all_incorrect_keeps_totals() {
        let answers: AnswerSet = [("1", "B"), ("2", "C")].into_iter().collect();
        let perf = aggregate(&answers, &cells_catalog(), &DifficultyWeights::default());

        let cells = &perf.topics["Cells"];
        assert_eq!(cells.total_questions, 2);
        assert_eq!(cells.points, 0);
        assert_eq!(cells.percent_correct_by_difficulty.easy, 0.0);
        assert_eq!(cells.percent_correct, 0.0);
    }

    #[test]
    fn missing_answers_count_as_incorrect() {
        let answers: AnswerSet = [("1", "A")].into_iter().collect();
        let perf = aggregate(&answers, &cells_catalog(), &DifficultyWeights::default());

        let cells = &perf.topics["Cells"];
        assert_eq!(cells.total_questions, 2);
        assert_eq!(cells.points, 1);
        assert_eq!(cells.percent_correct, 50.0);
    }

    #[test]
    fn untouched_difficulties_are_zero() {
        let answers: AnswerSet = [("1", "A"), ("2", "A")].into_iter().collect();
        let perf = aggregate(&answers, &cells_catalog(), &DifficultyWeights::default());

        let by_difficulty = &perf.topics["Cells"].percent_correct_by_difficulty;
        assert_eq!(by_difficulty.medium, 0.0);
        assert_eq!(by_difficulty.hard, 0.0);
    }

    #[test]
    fn shared_leaf_accumulates_across_areas() {
        let answers: AnswerSet = [("1", "A"), ("2", "A"), ("3", "B"), ("4", "A")]
            .into_iter()
            .collect();
        let perf = aggregate(&answers, &mixed_catalog(), &DifficultyWeights::default());

        // Membrane: q1 (easy, ok), q2 (medium, ok), q4 (hard, ok).
        let membrane = &perf.topics["Membrane"];
        assert_eq!(membrane.total_questions, 3);
        assert_eq!(membrane.points, 1 + 2 + 3);
        assert_eq!(membrane.percent_correct, 100.0);

        // Genetics: q2 (medium, ok), q3 (hard, wrong).
        let genetics = &perf.topics["Genetics"];
        assert_eq!(genetics.total_questions, 2);
        assert_eq!(genetics.points, 2);
        assert_eq!(genetics.percent_correct_by_difficulty.medium, 100.0);
        assert_eq!(genetics.percent_correct_by_difficulty.hard, 0.0);
        assert_eq!(genetics.percent_correct, 50.0);

        // Biology is counted once per question, not once per path.
        let biology = &perf.areas["Biology"];
        assert_eq!(biology.total_questions, 3);
        assert_eq!(biology.points, 3);

        let chemistry = &perf.areas["Chemistry"];
        assert_eq!(chemistry.total_questions, 2);
        assert_eq!(chemistry.points, 3);
        assert_eq!(chemistry.percent_correct_by_difficulty.hard, 50.0);
    }

    #[test]
    fn custom_weights_are_applied() {
        let answers: AnswerSet = [("3", "A"), ("4", "A")].into_iter().collect();
        let weights = DifficultyWeights::new(1, 5, 10);
        let perf = aggregate(&answers, &mixed_catalog(), &weights);
        assert_eq!(perf.areas["Chemistry"].points, 20);
    }

    #[test]
    fn empty_catalog_yields_empty_maps() {
        let perf = aggregate(
            &AnswerSet::new(),
            &QuestionCatalog::default(),
            &DifficultyWeights::default(),
        );
        assert!(perf.topics.is_empty());
        assert!(perf.areas.is_empty());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let answers: AnswerSet = [("1", "A"), ("3", "A")].into_iter().collect();
        let catalog = mixed_catalog();
        let weights = DifficultyWeights::default();
        let first = aggregate(&answers, &catalog, &weights);
        let second = aggregate(&answers, &catalog, &weights);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn tallies_conserve_question_counts() {
        let answers: AnswerSet = [("2", "A"), ("4", "C")].into_iter().collect();
        let tallies = tally(&answers, &mixed_catalog(), &DifficultyWeights::default());

        for t in tallies.topics.values().chain(tallies.areas.values()) {
            assert_eq!(t.total_questions, t.difficulty_total());
            for (_, counter) in t.per_difficulty.iter() {
                assert!(counter.correct <= counter.total);
            }
        }
    }

    #[test]
    fn percentages_stay_in_bounds() {
        let answers: AnswerSet = [("1", "A"), ("2", "B"), ("3", "A")].into_iter().collect();
        let perf = aggregate(&answers, &mixed_catalog(), &DifficultyWeights::default());

        for record in perf.topics.values().chain(perf.areas.values()) {
            assert!((0.0..=100.0).contains(&record.percent_correct));
            for (_, pct) in record.percent_correct_by_difficulty.iter() {
                assert!((0.0..=100.0).contains(pct));
            }
        }
    }

    #[test]
    fn record_serializes_without_counters() {
        let answers: AnswerSet = [("1", "A")].into_iter().collect();
        let perf = aggregate(&answers, &cells_catalog(), &DifficultyWeights::default());
        let json = serde_json::to_value(&perf.topics["Cells"]).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert!(keys.contains(&"percent_correct_by_difficulty"));
        assert!(!keys.contains(&"per_difficulty"));
        assert_eq!(json["percent_correct_by_difficulty"]["easy"], 50.0);
    }
}
