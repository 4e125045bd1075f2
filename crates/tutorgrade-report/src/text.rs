//! Plain-text feedback reports and rule listings.

use tutorgrade_core::feedback::FeedbackFlags;
use tutorgrade_core::rules::{Condition, FeedbackType, Pedagogy};

const DEFAULT_REVIEW: &str = "Review the topic {item}.";
const DEFAULT_RELATEDNESS: &str = "Focus more on the area {item}.";
const DEFAULT_HINT: &str = "A hint is available for {item}.";
const DEFAULT_VISUALIZATION: &str = "Try a visual explanation of {item}.";

/// Feedback message templates keyed by feedback type name.
#[derive(Debug, Clone, Copy)]
pub struct Messages<'a> {
    types: &'a [FeedbackType],
}

impl<'a> Messages<'a> {
    pub fn new(types: &'a [FeedbackType]) -> Self {
        Self { types }
    }

    /// Render the named message for `item`, falling back to `default`.
    fn render(&self, name: &str, default: &str, item: &str) -> String {
        match self.types.iter().find(|t| t.name == name) {
            Some(t) => t.render(item),
            None => default.replace("{item}", item),
        }
    }
}

impl<'a> From<&'a Pedagogy> for Messages<'a> {
    fn from(pedagogy: &'a Pedagogy) -> Self {
        Messages::new(&pedagogy.feedback_types)
    }
}

/// Generate the human-readable feedback report for one learner.
pub fn generate_report(flags: &FeedbackFlags, learner_id: &str, messages: Messages<'_>) -> String {
    let mut report = format!("Feedback Report for {learner_id}\n\n");

    report.push_str("**Feedback on Topics:**\n");
    let topics = flags.topics_needing_review();
    if topics.is_empty() {
        report.push_str("- No topics require review at this time.\n");
    }
    for topic in topics {
        report.push_str(&format!("- {}\n", messages.render("review", DEFAULT_REVIEW, topic)));
    }
    report.push('\n');

    report.push_str("**Feedback on Areas:**\n");
    let areas = flags.areas_needing_focus();
    if areas.is_empty() {
        report.push_str("- No areas need additional focus at this time.\n");
    }
    for area in areas {
        report.push_str(&format!(
            "- {}\n",
            messages.render("relatedness", DEFAULT_RELATEDNESS, area)
        ));
    }

    let hints = flags.topics_needing_hint();
    let visuals = flags.topics_needing_visualization();
    if !hints.is_empty() || !visuals.is_empty() {
        report.push_str("\n**Suggested Activities:**\n");
        for topic in hints {
            report.push_str(&format!("- {}\n", messages.render("hint", DEFAULT_HINT, topic)));
        }
        for topic in visuals {
            report.push_str(&format!(
                "- {}\n",
                messages.render("visualization", DEFAULT_VISUALIZATION, topic)
            ));
        }
    }

    report
}

/// Render a condition as infix text, e.g. `a < 50 AND b >= 2`.
pub fn describe_condition(condition: &Condition) -> String {
    condition.to_string()
}

/// One block per rule: name, condition and action.
pub fn describe_rules(pedagogy: &Pedagogy) -> String {
    let mut out = String::new();
    for (i, rule) in pedagogy.rules.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{}\n", rule.name));
        out.push_str(&format!("  when: {}\n", describe_condition(&rule.condition)));
        out.push_str(&format!("  then: {}\n", rule.action));
    }
    if !pedagogy.feedback_types.is_empty() {
        out.push_str("\nFeedback types:\n");
        for t in &pedagogy.feedback_types {
            out.push_str(&format!("  {}: {}\n", t.name, t.message));
        }
    }
    out
}
