//! The `tutorgrade init` command.

use std::path::Path;

use anyhow::{Context, Result};

const SAMPLE_CONFIG: &str = r#"# tutorgrade configuration

catalog = "data/catalog.yml"
pedagogy = "data/pedagogy.yml"
domain = "data/domain.yml"
learners = "data/learners.yml"

threshold_topics = 50.0
threshold_areas = 50.0
parallelism = 4

[weights]
easy = 1
medium = 2
hard = 3
"#;

const SAMPLE_FILES: [(&str, &str); 5] = [
    ("tutorgrade.toml", SAMPLE_CONFIG),
    ("data/catalog.yml", include_str!("../../../../data/catalog.yml")),
    ("data/pedagogy.yml", include_str!("../../../../data/pedagogy.yml")),
    ("data/domain.yml", include_str!("../../../../data/domain.yml")),
    ("data/learners.yml", include_str!("../../../../data/learners.yml")),
];

pub fn execute() -> Result<()> {
    for (path, content) in SAMPLE_FILES {
        let path = Path::new(path);
        if path.exists() {
            println!("{} already exists, skipping.", path.display());
            continue;
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }

    println!("\nNext steps:");
    println!("  1. Run: tutorgrade validate");
    println!("  2. Run: tutorgrade score");
    println!("  3. Run: tutorgrade simulate --count 25 --format table");

    Ok(())
}
