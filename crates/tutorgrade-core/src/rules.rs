//! Pedagogical rule definitions.
//!
//! A rule pairs a boolean [`Condition`] over a learner's performance with an
//! [`ActionCall`] that raises a feedback flag. Rules are built by the loader in
//! [`crate::parser`] and are read-only afterwards.

use std::fmt;

use serde::Serialize;

/// Prefix marking a reference into the learner's performance data.
pub const PERFORMANCE_PREFIX: &str = "performance.";

/// A boolean expression over performance data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    And { conditions: Vec<Condition> },
    Or { conditions: Vec<Condition> },
    Compare {
        op: CompareOp,
        left: Reference,
        right: Reference,
    },
}

impl Condition {
    pub fn compare(op: CompareOp, left: impl Into<Reference>, right: impl Into<Reference>) -> Self {
        Condition::Compare {
            op,
            left: left.into(),
            right: right.into(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (joiner, conditions) = match self {
            Condition::And { conditions } => (" AND ", conditions),
            Condition::Or { conditions } => (" OR ", conditions),
            Condition::Compare { op, left, right } => {
                return write!(f, "{left} {} {right}", op.symbol());
            }
        };
        if conditions.is_empty() {
            return write!(f, "(empty)");
        }
        let parts: Vec<String> = conditions
            .iter()
            .map(|c| match c {
                Condition::Compare { .. } => c.to_string(),
                nested => format!("({nested})"),
            })
            .collect();
        write!(f, "{}", parts.join(joiner))
    }
}

/// Relational operator of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Lt,
    Gt,
    Eq,
    Gte,
    Lte,
}

impl CompareOp {
    /// Parse the long or short operator name used in rule files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "less_than" | "lt" => Some(CompareOp::Lt),
            "greater_than" | "gt" => Some(CompareOp::Gt),
            "equal" | "eq" => Some(CompareOp::Eq),
            "greater_than_or_equal" | "gte" => Some(CompareOp::Gte),
            "less_than_or_equal" | "lte" => Some(CompareOp::Lte),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Eq => "==",
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reference {
    Number(f64),
    Bool(bool),
    /// Dotted path starting with [`PERFORMANCE_PREFIX`].
    Path(String),
    Text(String),
}

impl Reference {
    /// Classify a string: performance paths become [`Reference::Path`], anything
    /// else is a text literal.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.starts_with(PERFORMANCE_PREFIX) {
            Reference::Path(text)
        } else {
            Reference::Text(text)
        }
    }
}

impl From<f64> for Reference {
    fn from(value: f64) -> Self {
        Reference::Number(value)
    }
}

impl From<i32> for Reference {
    fn from(value: i32) -> Self {
        Reference::Number(value as f64)
    }
}

impl From<bool> for Reference {
    fn from(value: bool) -> Self {
        Reference::Bool(value)
    }
}

impl From<&str> for Reference {
    fn from(value: &str) -> Self {
        Reference::from_text(value)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Number(n) => write!(f, "{n}"),
            Reference::Bool(b) => write!(f, "{b}"),
            Reference::Path(p) => write!(f, "{p}"),
            Reference::Text(t) => write!(f, "'{t}'"),
        }
    }
}

/// The kind of action a rule dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Sets `needs_hint` on the named topic.
    ProvideHint,
    /// Sets `needs_visualization` on the named topic.
    SuggestVisualization,
    /// Not understood by this version; ignored at dispatch.
    Other(String),
}

impl ActionKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "provide_hint" => ActionKind::ProvideHint,
            "suggest_visualization" => ActionKind::SuggestVisualization,
            other => ActionKind::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ActionKind::ProvideHint => "provide_hint",
            ActionKind::SuggestVisualization => "suggest_visualization",
            ActionKind::Other(name) => name,
        }
    }
}

/// A structured action invocation, e.g. `provide_hint('Cells')`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCall {
    pub kind: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
}

impl ActionCall {
    pub fn new(kind: ActionKind, argument: Option<String>) -> Self {
        Self { kind, argument }
    }

    pub fn provide_hint(topic: impl Into<String>) -> Self {
        Self::new(ActionKind::ProvideHint, Some(topic.into()))
    }

    pub fn suggest_visualization(topic: impl Into<String>) -> Self {
        Self::new(ActionKind::SuggestVisualization, Some(topic.into()))
    }
}

impl fmt::Display for ActionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            Some(arg) => write!(f, "{}('{arg}')", self.kind.name()),
            None => write!(f, "{}()", self.kind.name()),
        }
    }
}

/// A named condition/action pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub name: String,
    pub condition: Condition,
    pub action: ActionCall,
}

/// Ordered collection of rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// A feedback message template. `{item}` is replaced by the topic or area.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct FeedbackType {
    pub name: String,
    pub message: String,
}

impl FeedbackType {
    pub fn render(&self, item: &str) -> String {
        self.message.replace("{item}", item)
    }
}

/// Feedback templates plus rules, as loaded from a pedagogy file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pedagogy {
    pub feedback_types: Vec<FeedbackType>,
    pub rules: RuleSet,
}

impl Pedagogy {
    pub fn feedback_type(&self, name: &str) -> Option<&FeedbackType> {
        self.feedback_types.iter().find(|t| t.name == name)
    }
}
