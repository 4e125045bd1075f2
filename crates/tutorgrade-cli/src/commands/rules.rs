//! The `tutorgrade rules` command.

use std::path::PathBuf;

use anyhow::Result;

use tutorgrade_report::describe_rules;
use tutorgrade_sources::config::load_config_from;
use tutorgrade_sources::load_pedagogy;

use super::{print_rule_warnings, require_location};

pub async fn execute(pedagogy: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let location = require_location(pedagogy, config.pedagogy, "pedagogy")?;

    let (pedagogy, warnings) = load_pedagogy(&location).await?;
    print_rule_warnings(&warnings);

    if pedagogy.rules.is_empty() {
        println!("No rules defined.");
    }
    print!("{}", describe_rules(&pedagogy));
    Ok(())
}
