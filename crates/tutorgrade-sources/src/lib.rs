//! tutorgrade-sources: Loading definitions and learners.
//!
//! Fetches catalogs, pedagogy rules, domain hierarchies and learner answers
//! from local files or HTTP(S), reads the `tutorgrade.toml` configuration,
//! and generates synthetic learners for simulations.

pub mod config;
pub mod error;
pub mod loader;
pub mod mock;
pub mod source;

pub use config::{load_config, load_config_from, TutorgradeConfig};
pub use error::SourceError;
pub use loader::{fetch_document, load_catalog, load_domain, load_learners, load_pedagogy};
pub use mock::MockLearners;
pub use source::{source_for, DocumentSource, FileSource, HttpSource};
