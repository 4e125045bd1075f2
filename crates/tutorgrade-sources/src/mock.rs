//! Synthetic learners for simulations and tests.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use tutorgrade_core::model::{AnswerSet, Learner, QuestionCatalog};

/// Answer options a synthetic learner picks from.
pub const OPTIONS: [&str; 5] = ["A", "B", "C", "D", "E"];

/// Seeded generator of synthetic learners.
///
/// The same seed, accuracy and catalog always produce the same learners.
#[derive(Debug, Clone)]
pub struct MockLearners {
    seed: u64,
    accuracy: f64,
}

impl MockLearners {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            accuracy: 0.5,
        }
    }

    /// Probability of answering each question correctly, clamped to `0..=1`.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = if accuracy.is_nan() {
            0.0
        } else {
            accuracy.clamp(0.0, 1.0)
        };
        self
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Generate `count` learners named `learner_001`, `learner_002`, ...
    pub fn generate(&self, catalog: &QuestionCatalog, count: usize) -> Vec<Learner> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let width = count.to_string().len().max(3);

        (1..=count)
            .map(|n| {
                let answers: AnswerSet = catalog
                    .questions()
                    .iter()
                    .map(|q| {
                        let option = if rng.gen_bool(self.accuracy) {
                            q.correct_answer.clone()
                        } else {
                            wrong_option(&mut rng, &q.correct_answer)
                        };
                        (q.id.clone(), option)
                    })
                    .collect();
                Learner {
                    id: format!("learner_{n:0width$}"),
                    answers,
                }
            })
            .collect()
    }
}

fn wrong_option(rng: &mut StdRng, correct: &str) -> String {
    let wrong: Vec<&str> = OPTIONS.iter().copied().filter(|o| *o != correct).collect();
    wrong.choose(rng).copied().unwrap_or("E").to_string()
}
