//! tutorgrade-core: Performance aggregation and pedagogical rule evaluation.
//!
//! This crate defines the question/answer data model, the aggregator that
//! turns answers into per-topic and per-area statistics, the rule evaluator
//! that turns statistics into feedback flags, and the batch engine that
//! drives both over many learners.

pub mod domain;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod feedback;
pub mod model;
pub mod parser;
pub mod report;
pub mod rules;
pub mod statistics;
