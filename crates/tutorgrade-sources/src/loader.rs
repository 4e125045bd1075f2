//! Fetch and parse definitions documents from any source.

use anyhow::{Context, Result};

use tutorgrade_core::domain::DomainTree;
use tutorgrade_core::evaluator::RuleWarning;
use tutorgrade_core::model::{Learner, QuestionCatalog};
use tutorgrade_core::parser::{
    parse_catalog_str, parse_learners_str, parse_pedagogy_str, DocumentFormat,
};
use tutorgrade_core::rules::Pedagogy;

use crate::source::source_for;

/// Fetch the raw text at a file path or URL.
pub async fn fetch_document(location: &str) -> Result<String> {
    let source = source_for(location)?;
    tracing::debug!(source = source.name(), %location, "fetching document");
    let text = source.fetch(location).await?;
    Ok(text)
}

/// Load a question catalog (YAML, JSON or ENEM JSON Lines).
pub async fn load_catalog(location: &str) -> Result<QuestionCatalog> {
    let content = fetch_document(location).await?;
    let catalog = parse_catalog_str(&content, DocumentFormat::from_location(location))
        .with_context(|| format!("failed to load catalog from {location}"))?;
    tracing::info!(questions = catalog.len(), %location, "loaded catalog");
    Ok(catalog)
}

/// Load feedback types and rules; malformed rules come back as warnings.
pub async fn load_pedagogy(location: &str) -> Result<(Pedagogy, Vec<RuleWarning>)> {
    let content = fetch_document(location).await?;
    let (pedagogy, warnings) = parse_pedagogy_str(&content, DocumentFormat::from_location(location))
        .with_context(|| format!("failed to load pedagogy from {location}"))?;
    tracing::info!(
        rules = pedagogy.rules.len(),
        skipped = warnings.len(),
        %location,
        "loaded pedagogy"
    );
    Ok((pedagogy, warnings))
}

/// Load a domain hierarchy (YAML).
pub async fn load_domain(location: &str) -> Result<DomainTree> {
    let content = fetch_document(location).await?;
    DomainTree::from_yaml(&content)
        .with_context(|| format!("failed to load domain from {location}"))
}

/// Load learners and their answers.
pub async fn load_learners(location: &str) -> Result<Vec<Learner>> {
    let content = fetch_document(location).await?;
    parse_learners_str(&content, DocumentFormat::from_location(location))
        .with_context(|| format!("failed to load learners from {location}"))
}
