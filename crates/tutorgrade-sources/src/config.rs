//! Configuration file loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tutorgrade_core::engine::EngineConfig;
use tutorgrade_core::evaluator::Thresholds;
use tutorgrade_core::model::DifficultyWeights;

/// Top-level tutorgrade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorgradeConfig {
    /// Question catalog location (path or URL).
    #[serde(default)]
    pub catalog: Option<String>,
    /// Feedback types and rules location.
    #[serde(default)]
    pub pedagogy: Option<String>,
    /// Optional domain hierarchy, used for validation only.
    #[serde(default)]
    pub domain: Option<String>,
    /// Learners and their answers.
    #[serde(default)]
    pub learners: Option<String>,
    /// Topics below this percentage are flagged for review.
    #[serde(default = "default_threshold")]
    pub threshold_topics: f64,
    /// Areas below this percentage are flagged for focus.
    #[serde(default = "default_threshold")]
    pub threshold_areas: f64,
    /// Max learners scored concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Points per correct answer, by difficulty.
    #[serde(default)]
    pub weights: DifficultyWeights,
}

fn default_threshold() -> f64 {
    50.0
}
fn default_parallelism() -> usize {
    4
}

impl Default for TutorgradeConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            pedagogy: None,
            domain: None,
            learners: None,
            threshold_topics: default_threshold(),
            threshold_areas: default_threshold(),
            parallelism: default_parallelism(),
            weights: DifficultyWeights::default(),
        }
    }
}

impl TutorgradeConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            thresholds: Thresholds {
                topics: self.threshold_topics,
                areas: self.threshold_areas,
            },
            weights: self.weights,
            parallelism: self.parallelism,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `tutorgrade.toml` in the current directory
/// 2. `~/.config/tutorgrade/config.toml`
///
/// Environment variable overrides: `TUTORGRADE_CATALOG`, `TUTORGRADE_PEDAGOGY`.
pub fn load_config() -> Result<TutorgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TutorgradeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("tutorgrade.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<TutorgradeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => TutorgradeConfig::default(),
    };

    // Apply env var overrides
    if let Ok(catalog) = std::env::var("TUTORGRADE_CATALOG") {
        config.catalog = Some(catalog);
    }
    if let Ok(pedagogy) = std::env::var("TUTORGRADE_PEDAGOGY") {
        config.pedagogy = Some(pedagogy);
    }

    for location in [
        &mut config.catalog,
        &mut config.pedagogy,
        &mut config.domain,
        &mut config.learners,
    ]
    .into_iter()
    .flatten()
    {
        *location = resolve_env_vars(location);
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("tutorgrade"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_TUTORGRADE_TEST_DIR", "/srv/data");
        assert_eq!(resolve_env_vars("${_TUTORGRADE_TEST_DIR}"), "/srv/data");
        assert_eq!(
            resolve_env_vars("${_TUTORGRADE_TEST_DIR}/catalog.yml"),
            "/srv/data/catalog.yml"
        );
        assert_eq!(resolve_env_vars("no vars"), "no vars");
        assert_eq!(resolve_env_vars("open ${brace"), "open ${brace");
        std::env::remove_var("_TUTORGRADE_TEST_DIR");
    }

    #[test]
    fn default_config() {
        let config = TutorgradeConfig::default();
        assert_eq!(config.threshold_topics, 50.0);
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.weights, DifficultyWeights::new(1, 2, 3));
        assert!(config.catalog.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
catalog = "data/catalog.yml"
pedagogy = "https://example.org/pedagogy.yml"
threshold_topics = 60.0
parallelism = 8

[weights]
easy = 1
medium = 3
hard = 5
"#;
        let config: TutorgradeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.catalog.as_deref(), Some("data/catalog.yml"));
        assert_eq!(config.threshold_areas, 50.0);

        let engine = config.engine_config();
        assert_eq!(engine.thresholds.topics, 60.0);
        assert_eq!(engine.parallelism, 8);
        assert_eq!(engine.weights, DifficultyWeights::new(1, 3, 5));
    }

    #[test]
    fn load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tutorgrade.toml");
        std::fs::write(&path, "domain = \"domain.yml\"\nthreshold_areas = 40.0\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.domain.as_deref(), Some("domain.yml"));
        assert_eq!(config.threshold_areas, 40.0);
    }

    #[test]
    fn load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
