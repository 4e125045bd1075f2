//! Markdown class summary for a scored batch.

use tutorgrade_core::report::BatchReport;

/// Escape characters that would break a Markdown table cell.
fn cell(s: &str) -> String {
    s.replace('|', "\\|")
}

fn list(items: &[&str]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        cell(&items.join(", "))
    }
}

/// Render a batch as Markdown: overview, one row per learner, then topic and
/// area counts.
pub fn batch_summary(report: &BatchReport) -> String {
    let summary = &report.summary;
    let mut md = String::new();

    md.push_str("# Class Summary\n\n");
    md.push_str(&format!(
        "Batch `{}` | {} | {} questions | {} rules\n\n",
        report.id,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.catalog.question_count,
        report.catalog.rule_count
    ));
    md.push_str(&format!(
        "**Learners scored:** {} | **Failed:** {} | **Mean points:** {:.1}\n\n",
        summary.learners_scored, summary.learners_failed, summary.mean_points
    ));

    md.push_str("## Learners\n\n");
    md.push_str("| Learner | Points | Review | Focus | Rules fired |\n");
    md.push_str("|---|---:|---|---|---:|\n");
    for outcome in &report.outcomes {
        let points: u32 = outcome.performance.areas.values().map(|r| r.points).sum();
        let flags = &outcome.evaluation.flags;
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            cell(&outcome.learner_id),
            points,
            list(&flags.topics_needing_review()),
            list(&flags.areas_needing_focus()),
            outcome.evaluation.fired.len()
        ));
    }

    if !summary.topics.is_empty() {
        md.push_str("\n## Topics\n\n");
        md.push_str("| Topic | Review | Hint | Visualization |\n");
        md.push_str("|---|---:|---:|---:|\n");
        for (topic, counts) in &summary.topics {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                cell(topic),
                counts.review,
                counts.hint,
                counts.visualization
            ));
        }
    }

    if !summary.areas.is_empty() {
        md.push_str("\n## Areas\n\n");
        md.push_str("| Area | Focus |\n");
        md.push_str("|---|---:|\n");
        for (area, focus) in &summary.areas {
            md.push_str(&format!("| {} | {} |\n", cell(area), focus));
        }
    }

    md
}
