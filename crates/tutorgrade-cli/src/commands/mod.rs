pub mod domain;
pub mod init;
pub mod rules;
pub mod score;
pub mod simulate;
pub mod validate;

use anyhow::Result;

use tutorgrade_core::evaluator::RuleWarning;

/// Pick the CLI flag over the configured value; fail if neither is set.
pub fn require_location(
    flag: Option<String>,
    configured: Option<String>,
    what: &str,
) -> Result<String> {
    flag.or(configured).ok_or_else(|| {
        anyhow::anyhow!("no {what} given: pass --{what} or set `{what}` in tutorgrade.toml")
    })
}

pub fn print_rule_warnings(warnings: &[RuleWarning]) {
    for w in warnings {
        eprintln!("  WARNING: skipped rule '{}': {}", w.rule, w.message);
    }
}
