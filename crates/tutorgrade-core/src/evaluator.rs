//! Pedagogical rule evaluator.
//!
//! Evaluation runs in two phases. Baseline thresholding flags every topic and
//! area whose overall accuracy is below its threshold. Custom rules then run in
//! order; a rule whose condition holds dispatches its action, which can only
//! ever raise a flag. The resulting flags are therefore the logical OR of all
//! firing rules and do not depend on rule order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::feedback::{AreaFlags, FeedbackFlags, TopicFlags};
use crate::model::Difficulty;
use crate::rules::{
    ActionCall, ActionKind, CompareOp, Condition, Reference, Rule, RuleSet, PERFORMANCE_PREFIX,
};
use crate::statistics::{Performance, PerformanceRecord};

/// Accuracy thresholds (in percent) below which review/focus is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub topics: f64,
    pub areas: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            topics: 50.0,
            areas: 50.0,
        }
    }
}

/// A resolved scalar operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(_) => None,
        }
    }
}

/// A rule that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleWarning {
    pub rule: String,
    pub message: String,
}

/// Outcome of evaluating a rule set against one learner's performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub flags: FeedbackFlags,
    /// Names of rules whose condition held, in evaluation order.
    pub fired: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RuleWarning>,
}

/// Resolve a reference against performance data.
///
/// Returns `None` when a path cannot be followed to a scalar.
pub fn resolve(reference: &Reference, performance: &Performance) -> Option<Value> {
    match reference {
        Reference::Number(n) => Some(Value::Number(*n)),
        Reference::Bool(b) => Some(Value::Bool(*b)),
        Reference::Text(t) => Some(Value::Text(t.clone())),
        Reference::Path(path) => {
            let rest = path.strip_prefix(PERFORMANCE_PREFIX)?;
            let segments: Vec<&str> = rest.split('.').collect();
            resolve_path(&segments, performance).map(Value::Number)
        }
    }
}

fn resolve_path(segments: &[&str], performance: &Performance) -> Option<f64> {
    let (group, rest) = segments.split_first()?;
    let records = match *group {
        "topics" => &performance.topics,
        "areas" => &performance.areas,
        _ => return None,
    };
    let (key, rest) = rest.split_first()?;
    resolve_field(rest, records.get(*key)?)
}

fn resolve_field(segments: &[&str], record: &PerformanceRecord) -> Option<f64> {
    match segments {
        ["total_questions"] => Some(record.total_questions as f64),
        ["points"] => Some(record.points as f64),
        ["percent_correct"] => Some(record.percent_correct),
        ["percent_correct_by_difficulty", difficulty] => {
            let difficulty: Difficulty = difficulty.parse().ok()?;
            Some(record.percent_correct_by_difficulty[difficulty])
        }
        [flat] => {
            let difficulty = flat
                .strip_prefix("percent_correct_")?
                .strip_suffix("_questions")?;
            let difficulty: Difficulty = difficulty.parse().ok()?;
            Some(record.percent_correct_by_difficulty[difficulty])
        }
        _ => None,
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Text(_), _) | (_, Value::Text(_)) => None,
        (a, b) => a
            .as_number()
            .zip(b.as_number())
            .and_then(|(a, b)| a.partial_cmp(&b)),
    };

    let Some(ordering) = ordering else {
        return false;
    };

    match op {
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Gte => ordering != Ordering::Less,
        CompareOp::Lte => ordering != Ordering::Greater,
    }
}

/// Evaluate a condition tree. Empty `And`/`Or` nodes are false.
pub fn evaluate_condition(condition: &Condition, performance: &Performance) -> bool {
    match condition {
        Condition::And { conditions } => {
            !conditions.is_empty()
                && conditions
                    .iter()
                    .all(|c| evaluate_condition(c, performance))
        }
        Condition::Or { conditions } => conditions
            .iter()
            .any(|c| evaluate_condition(c, performance)),
        Condition::Compare { op, left, right } => {
            let (Some(left), Some(right)) =
                (resolve(left, performance), resolve(right, performance))
            else {
                return false;
            };
            compare(*op, &left, &right)
        }
    }
}

/// Initial flags: everything false, then thresholds applied.
pub fn baseline_flags(performance: &Performance, thresholds: &Thresholds) -> FeedbackFlags {
    FeedbackFlags {
        topics: performance
            .topics
            .iter()
            .map(|(name, record)| {
                let flags = TopicFlags {
                    needs_review: record.percent_correct < thresholds.topics,
                    ..Default::default()
                };
                (name.clone(), flags)
            })
            .collect(),
        areas: performance
            .areas
            .iter()
            .map(|(name, record)| {
                let flags = AreaFlags {
                    needs_focus: record.percent_correct < thresholds.areas,
                };
                (name.clone(), flags)
            })
            .collect(),
    }
}

/// Apply an action to the flags. Unknown actions and topics are no-ops.
fn dispatch(action: &ActionCall, flags: &mut FeedbackFlags) -> Result<(), String> {
    let set: fn(&mut TopicFlags) = match &action.kind {
        ActionKind::ProvideHint => |f: &mut TopicFlags| f.needs_hint = true,
        ActionKind::SuggestVisualization => |f: &mut TopicFlags| f.needs_visualization = true,
        ActionKind::Other(name) => {
            debug!(action = %name, "ignoring unknown action");
            return Ok(());
        }
    };

    let Some(topic) = action.argument.as_deref() else {
        return Err(format!("action '{}' requires a topic argument", action.kind.name()));
    };

    match flags.topics.get_mut(topic) {
        Some(topic_flags) => set(topic_flags),
        None => debug!(topic, action = %action, "action targets unknown topic"),
    }
    Ok(())
}

fn apply_rule(rule: &Rule, performance: &Performance, evaluation: &mut Evaluation) {
    if !evaluate_condition(&rule.condition, performance) {
        return;
    }

    match dispatch(&rule.action, &mut evaluation.flags) {
        Ok(()) => {
            debug!(rule = %rule.name, action = %rule.action, "rule fired");
            evaluation.fired.push(rule.name.clone());
        }
        Err(message) => {
            warn!(rule = %rule.name, "skipping rule: {message}");
            evaluation.warnings.push(RuleWarning {
                rule: rule.name.clone(),
                message,
            });
        }
    }
}

/// Evaluate baseline thresholds and every rule against one learner.
pub fn evaluate(performance: &Performance, rules: &RuleSet, thresholds: &Thresholds) -> Evaluation {
    let mut evaluation = Evaluation {
        flags: baseline_flags(performance, thresholds),
        ..Default::default()
    };

    for rule in rules {
        apply_rule(rule, performance, &mut evaluation);
    }

    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DifficultyTable;

    fn record(
        total: u32,
        points: u32,
        easy: f64,
        medium: f64,
        hard: f64,
        overall: f64,
    ) -> PerformanceRecord {
        PerformanceRecord {
            total_questions: total,
            points,
            percent_correct: overall,
            percent_correct_by_difficulty: DifficultyTable { easy, medium, hard },
        }
    }

    /// Scenario B: two easy Cells questions, both wrong.
    fn failing_cells() -> Performance {
        let mut perf = Performance::default();
        perf.topics.insert("Cells".into(), record(2, 0, 0.0, 0.0, 0.0, 0.0));
        perf.areas.insert("Biology".into(), record(2, 0, 0.0, 0.0, 0.0, 0.0));
        perf
    }

    fn mixed() -> Performance {
        let mut perf = Performance::default();
        perf.topics.insert("Cells".into(), record(4, 5, 100.0, 50.0, 0.0, 75.0));
        perf.topics.insert("Genetics".into(), record(5, 2, 50.0, 33.3, 0.0, 40.0));
        perf.topics.insert("Optics".into(), record(3, 3, 0.0, 0.0, 50.0, 50.0));
        perf.areas.insert("Biology".into(), record(6, 5, 100.0, 50.0, 0.0, 60.0));
        perf.areas.insert("Physics".into(), record(3, 3, 0.0, 0.0, 50.0, 33.3));
        perf
    }

    fn rule(name: &str, condition: Condition, action: ActionCall) -> Rule {
        Rule {
            name: name.into(),
            condition,
            action,
        }
    }

    fn lt(left: &str, right: f64) -> Condition {
        Condition::compare(CompareOp::Lt, left, right)
    }

    #[test]
    fn resolves_nested_paths() {
        let perf = mixed();
        let r = |p: &str| resolve(&Reference::from(p), &perf);
        assert_eq!(r("performance.topics.Cells.points"), Some(Value::Number(5.0)));
        assert_eq!(
            r("performance.topics.Cells.percent_correct_by_difficulty.medium"),
            Some(Value::Number(50.0))
        );
        assert_eq!(
            r("performance.areas.Physics.percent_correct_hard_questions"),
            Some(Value::Number(50.0))
        );
        assert_eq!(
            r("performance.areas.Biology.percent_correct_high_questions"),
            Some(Value::Number(0.0))
        );
        assert_eq!(r("performance.areas.Biology.total_questions"), Some(Value::Number(6.0)));
    }

    #[test]
    fn unresolvable_paths() {
        let perf = mixed();
        let r = |p: &str| resolve(&Reference::from(p), &perf);
        assert_eq!(r("performance.topics.Membrane.points"), None);
        assert_eq!(r("performance.topics.Cells"), None);
        assert_eq!(r("performance.topics"), None);
        assert_eq!(r("performance.topics.Cells.points.extra"), None);
        assert_eq!(r("performance.topics.Cells.percent_correct_by_difficulty"), None);
        assert_eq!(r("performance.topics.Cells.percent_correct_by_difficulty.expert"), None);
        assert_eq!(r("performance.learners.Cells.points"), None);
    }

    #[test]
    fn plain_strings_resolve_verbatim() {
        let perf = Performance::default();
        assert_eq!(
            resolve(&Reference::from("beginner"), &perf),
            Some(Value::Text("beginner".into()))
        );
    }

    #[test]
    fn compare_semantics() {
        let perf = Performance::default();
        let holds = |op, l: Reference, r: Reference| {
            evaluate_condition(&Condition::Compare { op, left: l, right: r }, &perf)
        };
        assert!(holds(CompareOp::Lt, 1.into(), 2.into()));
        assert!(holds(CompareOp::Lte, 2.into(), 2.into()));
        assert!(holds(CompareOp::Gte, 2.into(), 2.into()));
        assert!(!holds(CompareOp::Gt, 2.into(), 2.into()));
        assert!(holds(CompareOp::Eq, true.into(), 1.into()));
        assert!(holds(CompareOp::Lt, false.into(), true.into()));
        assert!(holds(CompareOp::Eq, "alpha".into(), "alpha".into()));
        assert!(holds(CompareOp::Lt, "alpha".into(), "beta".into()));
        assert!(!holds(CompareOp::Eq, "1".into(), 1.into()));
        assert!(!holds(CompareOp::Lt, "a".into(), 1.into()));
    }

    #[test]
    fn empty_boolean_nodes_are_false() {
        let perf = mixed();
        assert!(!evaluate_condition(&Condition::And { conditions: vec![] }, &perf));
        assert!(!evaluate_condition(&Condition::Or { conditions: vec![] }, &perf));
    }

    #[test]
    fn and_or_nesting() {
        let perf = mixed();
        let cond = Condition::And {
            conditions: vec![
                lt("performance.topics.Genetics.percent_correct", 50.0),
                Condition::Or {
                    conditions: vec![
                        lt("performance.topics.Unknown.points", 1.0),
                        Condition::compare(CompareOp::Gte, "performance.areas.Biology.points", 5),
                    ],
                },
            ],
        };
        assert!(evaluate_condition(&cond, &perf));

        let cond = Condition::And {
            conditions: vec![
                lt("performance.topics.Genetics.percent_correct", 50.0),
                lt("performance.topics.Unknown.points", 1.0),
            ],
        };
        assert!(!evaluate_condition(&cond, &perf));
    }

    #[test]
    fn baseline_uses_overall_percent() {
        let eval = evaluate(&mixed(), &RuleSet::default(), &Thresholds::default());
        let topics = &eval.flags.topics;
        assert!(!topics["Cells"].needs_review);
        assert!(topics["Genetics"].needs_review);
        // 50.0 is not below a 50.0 threshold.
        assert!(!topics["Optics"].needs_review);
        assert!(!eval.flags.areas["Biology"].needs_focus);
        assert!(eval.flags.areas["Physics"].needs_focus);
        assert!(eval.fired.is_empty());
    }

    #[test]
    fn scenario_b_needs_review() {
        let eval = evaluate(&failing_cells(), &RuleSet::default(), &Thresholds::default());
        assert!(eval.flags.topics["Cells"].needs_review);
        assert!(eval.flags.areas["Biology"].needs_focus);
    }

    #[test]
    fn scenario_c_hint_rule_fires() {
        let rules = RuleSet::new(vec![rule(
            "hint_for_cells",
            lt("performance.topics.Cells.percent_correct_by_difficulty.easy", 50.0),
            ActionCall::provide_hint("Cells"),
        )]);
        let eval = evaluate(&failing_cells(), &rules, &Thresholds::default());
        assert!(eval.flags.topics["Cells"].needs_hint);
        assert!(!eval.flags.topics["Cells"].needs_visualization);
        assert_eq!(eval.fired, vec!["hint_for_cells"]);
    }

    #[test]
    fn scenario_d_absent_topic_never_fires() {
        for op in [CompareOp::Lt, CompareOp::Gt, CompareOp::Eq, CompareOp::Gte, CompareOp::Lte] {
            let rules = RuleSet::new(vec![rule(
                "ghost",
                Condition::compare(op, "performance.topics.Ghost.percent_correct", 0),
                ActionCall::provide_hint("Cells"),
            )]);
            let eval = evaluate(&failing_cells(), &rules, &Thresholds::default());
            assert!(!eval.flags.topics["Cells"].needs_hint, "{op:?} fired");
            assert!(eval.fired.is_empty());
        }
    }

    #[test]
    fn unknown_topic_and_action_are_no_ops() {
        let always = Condition::compare(CompareOp::Eq, 1, 1);
        let rules = RuleSet::new(vec![
            rule("ghost_topic", always.clone(), ActionCall::provide_hint("Ghost")),
            rule(
                "future_action",
                always,
                ActionCall::new(ActionKind::from_name("schedule_tutor"), Some("Cells".into())),
            ),
        ]);
        let eval = evaluate(&failing_cells(), &rules, &Thresholds::default());
        assert!(!eval.flags.topics.contains_key("Ghost"));
        assert_eq!(
            eval.flags.topics["Cells"],
            TopicFlags {
                needs_review: true,
                ..Default::default()
            }
        );
        assert!(eval.warnings.is_empty());
    }

    #[test]
    fn missing_argument_is_skipped_with_warning() {
        let always = Condition::compare(CompareOp::Eq, 1, 1);
        let rules = RuleSet::new(vec![
            rule("broken", always.clone(), ActionCall::new(ActionKind::ProvideHint, None)),
            rule("valid", always, ActionCall::suggest_visualization("Cells")),
        ]);
        let eval = evaluate(&failing_cells(), &rules, &Thresholds::default());
        assert_eq!(eval.warnings.len(), 1);
        assert_eq!(eval.warnings[0].rule, "broken");
        assert!(eval.flags.topics["Cells"].needs_visualization);
        assert!(!eval.flags.topics["Cells"].needs_hint);
        assert_eq!(eval.fired, vec!["valid"]);
    }

    #[test]
    fn raising_topic_threshold_only_adds_reviews() {
        let perf = mixed();
        let mut previous = evaluate(&perf, &RuleSet::default(), &Thresholds::default()).flags;
        for threshold in [55.0, 60.0, 75.0, 80.0, 100.0] {
            let thresholds = Thresholds {
                topics: threshold,
                ..Default::default()
            };
            let flags = evaluate(&perf, &RuleSet::default(), &thresholds).flags;
            for (topic, before) in &previous.topics {
                if before.needs_review {
                    assert!(flags.topics[topic].needs_review, "{topic} lost review at {threshold}");
                }
            }
            previous = flags;
        }
        assert!(previous.topics.values().all(|f| f.needs_review));
    }

    #[test]
    fn rule_order_does_not_matter() {
        let perf = mixed();
        let rules = vec![
            rule(
                "a",
                lt("performance.topics.Genetics.percent_correct", 50.0),
                ActionCall::provide_hint("Genetics"),
            ),
            rule(
                "b",
                lt("performance.topics.Cells.percent_correct", 80.0),
                ActionCall::suggest_visualization("Cells"),
            ),
            rule(
                "c",
                lt("performance.topics.Cells.percent_correct", 10.0),
                ActionCall::provide_hint("Cells"),
            ),
            rule(
                "d",
                Condition::compare(CompareOp::Gte, "performance.topics.Optics.points", 3),
                ActionCall::provide_hint("Cells"),
            ),
        ];
        let forward = evaluate(&perf, &RuleSet::new(rules.clone()), &Thresholds::default());
        let mut reversed = rules.clone();
        reversed.reverse();
        let backward = evaluate(&perf, &RuleSet::new(reversed), &Thresholds::default());
        let mut rotated = rules;
        rotated.rotate_left(2);
        let rotated = evaluate(&perf, &RuleSet::new(rotated), &Thresholds::default());

        assert_eq!(forward.flags, backward.flags);
        assert_eq!(forward.flags, rotated.flags);
        assert!(forward.flags.topics["Cells"].needs_hint);
        assert!(forward.flags.topics["Cells"].needs_visualization);
        assert!(forward.flags.topics["Genetics"].needs_hint);
    }

    #[test]
    fn empty_performance_and_rules() {
        let eval = evaluate(&Performance::default(), &RuleSet::default(), &Thresholds::default());
        assert!(eval.flags.topics.is_empty());
        assert!(eval.flags.areas.is_empty());
    }
}
