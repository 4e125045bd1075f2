//! Core data model types for tutorgrade.
//!
//! These are the fundamental types the whole system uses to represent
//! questions, learners and their answers.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Difficulty tier of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    #[serde(alias = "high")]
    Hard,
}

impl Difficulty {
    /// All tiers, easiest first.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" | "high" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A fixed table holding one value per difficulty tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTable<T> {
    pub easy: T,
    pub medium: T,
    pub hard: T,
}

impl<T> DifficultyTable<T> {
    /// Build a table by evaluating `f` for every tier.
    pub fn from_fn(mut f: impl FnMut(Difficulty) -> T) -> Self {
        Self {
            easy: f(Difficulty::Easy),
            medium: f(Difficulty::Medium),
            hard: f(Difficulty::Hard),
        }
    }

    /// Map every entry into a new table.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> DifficultyTable<U> {
        DifficultyTable {
            easy: f(&self.easy),
            medium: f(&self.medium),
            hard: f(&self.hard),
        }
    }

    /// Iterate `(difficulty, value)` pairs, easiest first.
    pub fn iter(&self) -> impl Iterator<Item = (Difficulty, &T)> {
        Difficulty::ALL.into_iter().map(move |d| (d, &self[d]))
    }
}

impl<T> Index<Difficulty> for DifficultyTable<T> {
    type Output = T;

    fn index(&self, difficulty: Difficulty) -> &T {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

impl<T> IndexMut<Difficulty> for DifficultyTable<T> {
    fn index_mut(&mut self, difficulty: Difficulty) -> &mut T {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

/// Points awarded for a correct answer, per difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyWeights(pub DifficultyTable<u32>);

impl DifficultyWeights {
    pub fn new(easy: u32, medium: u32, hard: u32) -> Self {
        Self(DifficultyTable { easy, medium, hard })
    }

    pub fn points(&self, difficulty: Difficulty) -> u32 {
        self.0[difficulty]
    }
}

impl Default for DifficultyWeights {
    fn default() -> Self {
        Self::new(1, 2, 3)
    }
}

/// Root-to-leaf path in a topic hierarchy. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TopicPath(Vec<String>);

impl TopicPath {
    /// Create a path, rejecting an empty segment list.
    pub fn new(segments: Vec<String>) -> Result<Self, String> {
        if segments.is_empty() {
            return Err("topic path must not be empty".to_string());
        }
        Ok(Self(segments))
    }

    /// The last segment, which is the aggregation key for topics.
    pub fn leaf(&self) -> &str {
        // Non-empty by construction.
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for TopicPath {
    type Error = String;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<TopicPath> for Vec<String> {
    fn from(path: TopicPath) -> Self {
        path.0
    }
}

impl fmt::Display for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" > "))
    }
}

/// A question id as written in a document: a string or a bare integer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(untagged)]
pub(crate) enum QuestionId {
    Text(String),
    Number(i64),
}

impl From<QuestionId> for String {
    fn from(id: QuestionId) -> Self {
        match id {
            QuestionId::Text(s) => s,
            QuestionId::Number(n) => n.to_string(),
        }
    }
}

fn deserialize_question_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    QuestionId::deserialize(deserializer).map(String::from)
}

/// A single question of the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier for this question.
    #[serde(deserialize_with = "deserialize_question_id")]
    pub id: String,
    /// The option that counts as correct.
    #[serde(alias = "correct")]
    pub correct_answer: String,
    pub difficulty: Difficulty,
    /// Area name to the topic paths this question covers inside that area.
    #[serde(default)]
    pub topics: BTreeMap<String, Vec<TopicPath>>,
}

impl Question {
    /// Whether `answer` matches the correct option.
    pub fn is_correct(&self, answer: Option<&str>) -> bool {
        answer == Some(self.correct_answer.as_str())
    }
}

/// Immutable, ordered collection of questions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Distinct area names, sorted.
    pub fn areas(&self) -> Vec<&str> {
        let mut areas: Vec<&str> = self
            .questions
            .iter()
            .flat_map(|q| q.topics.keys().map(String::as_str))
            .collect();
        areas.sort_unstable();
        areas.dedup();
        areas
    }

    /// Distinct topic leaves, sorted.
    pub fn leaves(&self) -> Vec<&str> {
        let mut leaves: Vec<&str> = self
            .questions
            .iter()
            .flat_map(|q| q.topics.values().flatten().map(TopicPath::leaf))
            .collect();
        leaves.sort_unstable();
        leaves.dedup();
        leaves
    }
}

/// A learner's chosen option per question id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, String>);

impl<'de> Deserialize<'de> for AnswerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let answers = BTreeMap::<QuestionId, String>::deserialize(deserializer)?;
        Ok(answers.into_iter().collect())
    }
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn insert(&mut self, question_id: impl Into<String>, option: impl Into<String>) {
        self.0.insert(question_id.into(), option.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A learner and the answers they submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learner {
    /// Unique identifier for the learner.
    pub id: String,
    #[serde(default)]
    pub answers: AnswerSet,
}
