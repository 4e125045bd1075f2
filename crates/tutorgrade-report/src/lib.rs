//! tutorgrade-report: Feedback and class reports.
//!
//! Renders per-learner feedback as plain text and batch results as Markdown.

pub mod markdown;
pub mod text;

pub use markdown::batch_summary;
pub use text::{describe_condition, describe_rules, generate_report, Messages};
