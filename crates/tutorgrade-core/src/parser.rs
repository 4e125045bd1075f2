//! Catalog, pedagogy and learner document parsers.
//!
//! Turns YAML, JSON and ENEM-style JSON Lines documents into the typed model,
//! and validates the result for common authoring mistakes.

use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::DomainTree;
use crate::error::DefinitionError;
use crate::evaluator::RuleWarning;
use crate::model::{Difficulty, Learner, Question, QuestionCatalog, QuestionId, TopicPath};
use crate::rules::{
    ActionCall, ActionKind, CompareOp, Condition, FeedbackType, Pedagogy, Reference, Rule,
    RuleSet, PERFORMANCE_PREFIX,
};

/// Serialization format of a definitions document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
    /// One JSON object per line (ENEM question dumps).
    JsonLines,
}

impl DocumentFormat {
    /// Guess the format from a file path or URL; YAML unless the extension
    /// says otherwise.
    pub fn from_location(location: &str) -> Self {
        let path = location.split(['?', '#']).next().unwrap_or(location);
        let extension = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "json" => DocumentFormat::Json,
            "jsonl" | "ndjson" => DocumentFormat::JsonLines,
            _ => DocumentFormat::Yaml,
        }
    }
}

fn from_document<T: DeserializeOwned>(content: &str, format: DocumentFormat) -> Result<T> {
    match format {
        DocumentFormat::Yaml => serde_yaml_ng::from_str(content).context("failed to parse YAML"),
        DocumentFormat::Json => serde_json::from_str(content).context("failed to parse JSON"),
        DocumentFormat::JsonLines => anyhow::bail!("JSON Lines is only supported for catalogs"),
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Top-level shape of a document, probed before the typed parse so errors
/// point at the offending entry.
#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentShape {
    List(Vec<IgnoredAny>),
    Other(IgnoredAny),
}

fn is_list(content: &str, format: DocumentFormat) -> Result<bool> {
    let shape = from_document::<DocumentShape>(content, format)?;
    Ok(matches!(shape, DocumentShape::List(_)))
}

#[derive(Deserialize)]
struct QuestionsDocument {
    questions: Vec<Question>,
}

/// Parse a question catalog in any supported format.
///
/// YAML and JSON catalogs are either a bare list of questions or a mapping
/// with the list under `questions`.
pub fn parse_catalog_str(content: &str, format: DocumentFormat) -> Result<QuestionCatalog> {
    if format == DocumentFormat::JsonLines {
        return parse_enem_jsonl(content);
    }
    if content.trim().is_empty() {
        return Ok(QuestionCatalog::default());
    }
    let questions = if is_list(content, format).context("invalid question catalog")? {
        from_document::<Vec<Question>>(content, format)
    } else {
        from_document::<QuestionsDocument>(content, format).map(|doc| doc.questions)
    }
    .context("invalid question catalog")?;
    Ok(QuestionCatalog::new(questions))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnemTopic {
    Name(String),
    Path(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnemTopics {
    Single(String),
    Many(Vec<EnemTopic>),
}

impl Default for EnemTopics {
    fn default() -> Self {
        EnemTopics::Many(Vec::new())
    }
}

/// A question as it appears in ENEM exports.
#[derive(Deserialize)]
struct EnemQuestion {
    id: QuestionId,
    label: String,
    difficulty: Difficulty,
    area: String,
    #[serde(default)]
    topico: EnemTopics,
}

impl EnemQuestion {
    fn into_question(self) -> Result<Question> {
        let id = String::from(self.id);
        let topics = match self.topico {
            EnemTopics::Single(name) => vec![EnemTopic::Name(name)],
            EnemTopics::Many(topics) => topics,
        };
        let paths = topics
            .into_iter()
            .map(|t| match t {
                EnemTopic::Name(name) => TopicPath::new(vec![name]),
                EnemTopic::Path(segments) => TopicPath::new(segments),
            })
            .collect::<Result<Vec<_>, String>>()
            .map_err(|e| anyhow::anyhow!("question {id}: {e}"))?;

        Ok(Question {
            id,
            correct_answer: self.label,
            difficulty: self.difficulty,
            topics: [(self.area, paths)].into_iter().collect(),
        })
    }
}

/// Convert ENEM JSON Lines (one question per line) into a catalog.
pub fn parse_enem_jsonl(content: &str) -> Result<QuestionCatalog> {
    let mut questions = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let raw: EnemQuestion = serde_json::from_str(line)
            .with_context(|| format!("invalid ENEM question on line {line_no}"))?;
        questions.push(
            raw.into_question()
                .with_context(|| format!("invalid ENEM question on line {line_no}"))?,
        );
    }

    Ok(QuestionCatalog::new(questions))
}

// ---------------------------------------------------------------------------
// Pedagogy
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
struct PedagogyDocument {
    #[serde(default)]
    feedback_types: Vec<FeedbackType>,
    #[serde(default)]
    feedback_rules: Vec<Value>,
}

/// Parse a pedagogy document.
///
/// Each rule is converted independently: a malformed rule is skipped and
/// reported in the returned warnings instead of failing the whole document.
pub fn parse_pedagogy_str(
    content: &str,
    format: DocumentFormat,
) -> Result<(Pedagogy, Vec<RuleWarning>)> {
    let document: PedagogyDocument = if content.trim().is_empty() {
        PedagogyDocument::default()
    } else {
        from_document::<Option<PedagogyDocument>>(content, format)
            .context("invalid pedagogy document")?
            .unwrap_or_default()
    };

    let mut rules = Vec::new();
    let mut warnings = Vec::new();

    for (index, raw) in document.feedback_rules.iter().enumerate() {
        let name = rule_name(raw).unwrap_or_else(|| format!("Unnamed Rule #{}", index + 1));
        match parse_rule(raw) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::warn!(rule = %name, "skipping malformed rule: {e}");
                warnings.push(RuleWarning {
                    rule: name,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok((
        Pedagogy {
            feedback_types: document.feedback_types,
            rules: RuleSet::new(rules),
        },
        warnings,
    ))
}

fn rule_name(raw: &Value) -> Option<String> {
    raw.get("name").and_then(Value::as_str).map(str::to_string)
}

fn shape_of(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "a boolean".into(),
        Value::Number(_) => "a number".into(),
        Value::String(_) => "a string".into(),
        Value::Array(_) => "a list".into(),
        Value::Object(_) => "a mapping".into(),
    }
}

fn field<'a>(raw: &'a Value, key: &'static str) -> Result<&'a Value, DefinitionError> {
    raw.get(key).ok_or(DefinitionError::MissingKey(key))
}

/// Convert one loosely typed rule into a [`Rule`].
pub fn parse_rule(raw: &Value) -> Result<Rule, DefinitionError> {
    if !raw.is_object() {
        return Err(DefinitionError::UnexpectedShape {
            expected: "a rule mapping",
            found: shape_of(raw),
        });
    }
    let name = rule_name(raw).unwrap_or_else(|| "Unnamed Rule".to_string());
    let condition = parse_condition(field(raw, "condition")?)?;
    let action = parse_action(field(raw, "action")?)?;
    Ok(Rule {
        name,
        condition,
        action,
    })
}

/// Convert a condition tree (`{type, conditions}` or `{type, left, right}`).
pub fn parse_condition(raw: &Value) -> Result<Condition, DefinitionError> {
    let map = raw.as_object().ok_or_else(|| DefinitionError::UnexpectedShape {
        expected: "a condition mapping",
        found: shape_of(raw),
    })?;
    let kind = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DefinitionError::MissingKey("type"))?;

    match kind {
        "and" | "or" => {
            let items = field(raw, "conditions")?;
            let items = items.as_array().ok_or_else(|| DefinitionError::UnexpectedShape {
                expected: "a list of conditions",
                found: shape_of(items),
            })?;
            let conditions = items
                .iter()
                .map(parse_condition)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(if kind == "and" {
                Condition::And { conditions }
            } else {
                Condition::Or { conditions }
            })
        }
        other => {
            let op = CompareOp::from_name(other)
                .ok_or_else(|| DefinitionError::UnknownConditionType(other.to_string()))?;
            let left = parse_reference(field(raw, "left")?)?;
            let right = parse_reference(field(raw, "right")?)?;
            Ok(Condition::Compare { op, left, right })
        }
    }
}

fn parse_reference(raw: &Value) -> Result<Reference, DefinitionError> {
    match raw {
        Value::Bool(b) => Ok(Reference::Bool(*b)),
        Value::Number(n) => n
            .as_f64()
            .map(Reference::Number)
            .ok_or_else(|| DefinitionError::InvalidOperand(n.to_string())),
        Value::String(s) => Ok(Reference::from_text(s.as_str())),
        other => Err(DefinitionError::InvalidOperand(other.to_string())),
    }
}

/// Convert an action given as `"name('arg')"` or `{name, argument}`.
pub fn parse_action(raw: &Value) -> Result<ActionCall, DefinitionError> {
    match raw {
        Value::String(text) => parse_action_call(text),
        Value::Object(map) => {
            let name = map
                .get("name")
                .and_then(Value::as_str)
                .ok_or(DefinitionError::MissingKey("name"))?;
            if !is_identifier(name) {
                return Err(DefinitionError::MalformedAction(name.to_string()));
            }
            let argument = match map.get("argument") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => {
                    return Err(DefinitionError::MalformedAction(format!(
                        "{name}: argument must be a string, found {}",
                        shape_of(other)
                    )))
                }
            };
            Ok(ActionCall::new(ActionKind::from_name(name), argument))
        }
        other => Err(DefinitionError::UnexpectedShape {
            expected: "an action string or mapping",
            found: shape_of(other),
        }),
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Parse `name`, `name()` or `name('argument')` into an [`ActionCall`].
pub fn parse_action_call(text: &str) -> Result<ActionCall, DefinitionError> {
    let text = text.trim();
    let malformed = || DefinitionError::MalformedAction(text.to_string());

    let (name, argument) = match text.split_once('(') {
        None => (text, None),
        Some((name, rest)) => {
            let inner = rest.strip_suffix(')').ok_or_else(malformed)?.trim();
            // Quoted arguments are taken verbatim, parentheses included.
            let inner = match quoted(inner) {
                Some(inner) => inner,
                None if inner.contains(['(', ')']) => return Err(malformed()),
                None => inner,
            };
            (name.trim(), (!inner.is_empty()).then(|| inner.to_string()))
        }
    };

    if !is_identifier(name) {
        return Err(malformed());
    }
    Ok(ActionCall::new(ActionKind::from_name(name), argument))
}

fn quoted(s: &str) -> Option<&str> {
    ['\'', '"']
        .into_iter()
        .find_map(|quote| s.strip_prefix(quote)?.strip_suffix(quote))
}

// ---------------------------------------------------------------------------
// Learners
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LearnersDocument {
    learners: Vec<Learner>,
}

/// Parse a list of learners with their answers, bare or under `learners`.
pub fn parse_learners_str(content: &str, format: DocumentFormat) -> Result<Vec<Learner>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    if is_list(content, format).context("invalid learners document")? {
        from_document::<Vec<Learner>>(content, format)
    } else {
        from_document::<LearnersDocument>(content, format).map(|doc| doc.learners)
    }
    .context("invalid learners document")
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A warning from catalog or rule validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Question id or rule name, if applicable.
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(subject: &str, message: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a catalog, optionally against a domain hierarchy.
pub fn validate_catalog(
    catalog: &QuestionCatalog,
    domain: Option<&DomainTree>,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Check for duplicate question IDs
    let mut seen_ids = HashSet::new();
    for question in catalog.questions() {
        if !seen_ids.insert(question.id.as_str()) {
            warnings.push(ValidationWarning::new(
                &question.id,
                format!("duplicate question ID: {}", question.id),
            ));
        }
    }

    // Questions that feed no topic
    for question in catalog.questions() {
        if question.topics.values().all(Vec::is_empty) {
            warnings.push(ValidationWarning::new(&question.id, "question has no topic path"));
        }
    }

    if let Some(domain) = domain {
        for question in catalog.questions() {
            for (area, paths) in &question.topics {
                if domain.area(area).is_none() {
                    warnings.push(ValidationWarning::new(
                        &question.id,
                        format!("area '{area}' is not in the domain"),
                    ));
                    continue;
                }
                for path in paths {
                    if !domain.contains_path(area, path) {
                        warnings.push(ValidationWarning::new(
                            &question.id,
                            format!("topic path '{path}' not found under area '{area}'"),
                        ));
                    }
                }
            }
        }
    }

    warnings
}

fn collect_paths<'a>(condition: &'a Condition, out: &mut Vec<&'a str>) {
    match condition {
        Condition::And { conditions } | Condition::Or { conditions } => {
            for c in conditions {
                collect_paths(c, out);
            }
        }
        Condition::Compare { left, right, .. } => {
            for side in [left, right] {
                if let Reference::Path(path) = side {
                    out.push(path);
                }
            }
        }
    }
}

fn has_empty_group(condition: &Condition) -> bool {
    match condition {
        Condition::And { conditions } | Condition::Or { conditions } => {
            conditions.is_empty() || conditions.iter().any(has_empty_group)
        }
        Condition::Compare { .. } => false,
    }
}

/// Validate rules against the topics and areas a catalog can produce.
pub fn validate_rules(rules: &RuleSet, catalog: &QuestionCatalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let leaves: HashSet<&str> = catalog.leaves().into_iter().collect();
    let areas: HashSet<&str> = catalog.areas().into_iter().collect();

    let mut seen_names = HashSet::new();
    for rule in rules {
        if !seen_names.insert(rule.name.as_str()) {
            warnings.push(ValidationWarning::new(
                &rule.name,
                format!("duplicate rule name: {}", rule.name),
            ));
        }

        if has_empty_group(&rule.condition) {
            warnings.push(ValidationWarning::new(
                &rule.name,
                "condition contains an empty and/or group, which never holds",
            ));
        }

        let mut paths = Vec::new();
        collect_paths(&rule.condition, &mut paths);
        for path in paths {
            let mut segments = path.trim_start_matches(PERFORMANCE_PREFIX).split('.');
            let known = match (segments.next(), segments.next()) {
                (Some("topics"), Some(key)) => leaves.contains(key),
                (Some("areas"), Some(key)) => areas.contains(key),
                _ => false,
            };
            if !known {
                warnings.push(ValidationWarning::new(
                    &rule.name,
                    format!("reference '{path}' does not match any catalog topic or area"),
                ));
            }
        }

        match (&rule.action.kind, rule.action.argument.as_deref()) {
            (ActionKind::Other(name), _) => warnings.push(ValidationWarning::new(
                &rule.name,
                format!("unknown action '{name}' will be ignored"),
            )),
            (_, None) => warnings.push(ValidationWarning::new(
                &rule.name,
                format!("action '{}' requires a topic argument", rule.action.kind.name()),
            )),
            (_, Some(topic)) if !leaves.contains(topic) => warnings.push(ValidationWarning::new(
                &rule.name,
                format!("action targets topic '{topic}' which no question covers"),
            )),
            _ => {}
        }
    }

    warnings
}
