//! Feedback flags produced by rule evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Signals raised for a single topic leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicFlags {
    pub needs_review: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_hint: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_visualization: bool,
}

/// Signals raised for an area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaFlags {
    pub needs_focus: bool,
}

/// Per-topic and per-area feedback for one learner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackFlags {
    pub topics: BTreeMap<String, TopicFlags>,
    pub areas: BTreeMap<String, AreaFlags>,
}

impl FeedbackFlags {
    /// Topics flagged for review, sorted.
    pub fn topics_needing_review(&self) -> Vec<&str> {
        self.topics_where(|f| f.needs_review)
    }

    pub fn topics_needing_hint(&self) -> Vec<&str> {
        self.topics_where(|f| f.needs_hint)
    }

    pub fn topics_needing_visualization(&self) -> Vec<&str> {
        self.topics_where(|f| f.needs_visualization)
    }

    /// Areas flagged for focus, sorted.
    pub fn areas_needing_focus(&self) -> Vec<&str> {
        self.areas
            .iter()
            .filter(|(_, f)| f.needs_focus)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn topics_where(&self, pred: impl Fn(&TopicFlags) -> bool) -> Vec<&str> {
        self.topics
            .iter()
            .filter(|(_, f)| pred(f))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
