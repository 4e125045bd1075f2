//! The `tutorgrade domain` command.

use std::path::PathBuf;

use anyhow::Result;

use tutorgrade_sources::config::load_config_from;
use tutorgrade_sources::load_domain;

use super::require_location;

pub async fn execute(domain: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let location = require_location(domain, config.domain, "domain")?;

    let tree = load_domain(&location).await?;
    if tree.areas.is_empty() {
        println!("Domain is empty.");
        return Ok(());
    }
    print!("{}", tree.render());
    eprintln!("{} nodes", tree.node_count());
    Ok(())
}
