//! The `tutorgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use tutorgrade_core::parser::{validate_catalog, validate_rules, ValidationWarning};
use tutorgrade_sources::config::load_config_from;
use tutorgrade_sources::{load_catalog, load_domain, load_pedagogy};

use super::require_location;

fn print_warnings(warnings: &[ValidationWarning]) {
    for w in warnings {
        let prefix = w
            .subject
            .as_ref()
            .map(|s| format!("  [{s}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }
}

pub async fn execute(
    catalog: Option<String>,
    pedagogy: Option<String>,
    domain: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog_location = require_location(catalog, config.catalog, "catalog")?;
    let domain_location = domain.or(config.domain);

    let catalog = load_catalog(&catalog_location).await?;
    let domain = match &domain_location {
        Some(location) => Some(load_domain(location).await?),
        None => None,
    };

    println!(
        "Catalog: {} ({} questions, {} areas, {} topics)",
        catalog_location,
        catalog.len(),
        catalog.areas().len(),
        catalog.leaves().len()
    );
    let catalog_warnings = validate_catalog(&catalog, domain.as_ref());
    print_warnings(&catalog_warnings);
    let mut total_warnings = catalog_warnings.len();

    if let Some(location) = pedagogy.or(config.pedagogy) {
        let (pedagogy, skipped) = load_pedagogy(&location).await?;
        println!(
            "Pedagogy: {} ({} rules, {} feedback types)",
            location,
            pedagogy.rules.len(),
            pedagogy.feedback_types.len()
        );
        for w in &skipped {
            println!("  [{}] WARNING: rule skipped: {}", w.rule, w.message);
        }
        let rule_warnings = validate_rules(&pedagogy.rules, &catalog);
        print_warnings(&rule_warnings);
        total_warnings += skipped.len() + rule_warnings.len();
    }

    if total_warnings == 0 {
        println!("All definitions valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
