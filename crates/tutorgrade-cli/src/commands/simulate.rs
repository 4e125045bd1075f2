//! The `tutorgrade simulate` command.

use anyhow::Result;

use tutorgrade_sources::{load_catalog, load_pedagogy, MockLearners};

use super::score::{resolve_config, run_and_print, OutputFormat};
use super::{print_rule_warnings, require_location};
use crate::ScoringArgs;

pub async fn execute(count: usize, accuracy: f64, seed: u64, args: ScoringArgs) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&accuracy),
        "accuracy must be between 0.0 and 1.0"
    );
    let format: OutputFormat = args.format.parse()?;
    let config = resolve_config(&args)?;

    let catalog_location =
        require_location(args.catalog.clone(), config.catalog.clone(), "catalog")?;
    let pedagogy_location =
        require_location(args.pedagogy.clone(), config.pedagogy.clone(), "pedagogy")?;

    let catalog = load_catalog(&catalog_location).await?;
    let (pedagogy, warnings) = load_pedagogy(&pedagogy_location).await?;
    print_rule_warnings(&warnings);

    let learners = MockLearners::new(seed)
        .with_accuracy(accuracy)
        .generate(&catalog, count);

    eprintln!(
        "tutorgrade v{} — Simulating {count} learners (accuracy {accuracy:.2}, seed {seed})",
        env!("CARGO_PKG_VERSION")
    );

    run_and_print(catalog, pedagogy, learners, &config, format).await
}
