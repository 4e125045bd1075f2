//! The `tutorgrade score` command.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use tutorgrade_core::engine::{LearnerOutcome, ProgressReporter, ScoringEngine};
use tutorgrade_core::model::Learner;
use tutorgrade_core::report::BatchReport;
use tutorgrade_core::rules::Pedagogy;
use tutorgrade_report::{batch_summary, generate_report, Messages};
use tutorgrade_sources::config::{load_config_from, TutorgradeConfig};
use tutorgrade_sources::{load_catalog, load_learners, load_pedagogy};

use super::{print_rule_warnings, require_location};
use crate::ScoringArgs;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_learner_start(&self, _: &str) {}

    fn on_learner_complete(&self, outcome: &LearnerOutcome) {
        let flags = &outcome.evaluation.flags;
        tracing::debug!(
            learner = %outcome.learner_id,
            review = flags.topics_needing_review().len(),
            focus = flags.areas_needing_focus().len(),
            "learner scored"
        );
    }

    fn on_learner_error(&self, learner_id: &str, error: &str) {
        eprintln!("  ERROR: {learner_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "Complete: {completed}/{total} scored, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

/// Output formats understood by `score` and `simulate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Table,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => {
                anyhow::bail!("unknown format '{other}' (expected text, table, json or markdown)")
            }
        }
    }
}

/// Apply CLI overrides on top of the loaded configuration.
pub fn resolve_config(args: &ScoringArgs) -> Result<TutorgradeConfig> {
    let mut config = load_config_from(args.config.as_deref())?;
    if let Some(t) = args.threshold_topics {
        config.threshold_topics = t;
    }
    if let Some(t) = args.threshold_areas {
        config.threshold_areas = t;
    }
    if let Some(p) = args.parallelism {
        config.parallelism = p;
    }
    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");
    for (name, value) in [
        ("threshold_topics", config.threshold_topics),
        ("threshold_areas", config.threshold_areas),
    ] {
        anyhow::ensure!(
            (0.0..=100.0).contains(&value),
            "{name} must be between 0 and 100"
        );
    }
    Ok(config)
}

pub async fn execute(learners_flag: Option<String>, args: ScoringArgs) -> Result<()> {
    let format: OutputFormat = args.format.parse()?;
    let config = resolve_config(&args)?;

    let catalog_location =
        require_location(args.catalog.clone(), config.catalog.clone(), "catalog")?;
    let pedagogy_location =
        require_location(args.pedagogy.clone(), config.pedagogy.clone(), "pedagogy")?;
    let learners_location = require_location(learners_flag, config.learners.clone(), "learners")?;

    let catalog = load_catalog(&catalog_location).await?;
    let (pedagogy, warnings) = load_pedagogy(&pedagogy_location).await?;
    print_rule_warnings(&warnings);
    let learners = load_learners(&learners_location).await?;

    eprintln!(
        "tutorgrade v{} — Scoring {} learners against {} questions and {} rules",
        env!("CARGO_PKG_VERSION"),
        learners.len(),
        catalog.len(),
        pedagogy.rules.len()
    );

    run_and_print(catalog, pedagogy, learners, &config, format).await
}

/// Score a batch and print it in the requested format.
pub async fn run_and_print(
    catalog: tutorgrade_core::model::QuestionCatalog,
    pedagogy: Pedagogy,
    learners: Vec<Learner>,
    config: &TutorgradeConfig,
    format: OutputFormat,
) -> Result<()> {
    let engine = ScoringEngine::new(
        Arc::new(catalog),
        Arc::new(pedagogy.rules.clone()),
        config.engine_config(),
    );
    let report = engine.run(learners, &ConsoleReporter).await?;

    match format {
        OutputFormat::Text => print!("{}", text_reports(&report, &pedagogy)),
        OutputFormat::Table => print_summary(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Markdown => print!("{}", batch_summary(&report)),
    }

    Ok(())
}

fn text_reports(report: &BatchReport, pedagogy: &Pedagogy) -> String {
    report
        .outcomes
        .iter()
        .map(|o| generate_report(&o.evaluation.flags, &o.learner_id, Messages::from(pedagogy)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_summary(report: &BatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Learner", "Points", "Review", "Focus", "Hints", "Rules fired"]);

    for outcome in &report.outcomes {
        let flags = &outcome.evaluation.flags;
        let points: u32 = outcome.performance.areas.values().map(|r| r.points).sum();
        table.add_row(vec![
            Cell::new(&outcome.learner_id),
            Cell::new(points),
            Cell::new(flags.topics_needing_review().join(", ")),
            Cell::new(flags.areas_needing_focus().join(", ")),
            Cell::new(flags.topics_needing_hint().join(", ")),
            Cell::new(outcome.evaluation.fired.len()),
        ]);
    }

    println!("{table}");
    println!(
        "Mean points: {:.1} across {} learners",
        report.summary.mean_points, report.summary.learners_scored
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_output_format() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("html".parse::<OutputFormat>().is_err());
    }
}
