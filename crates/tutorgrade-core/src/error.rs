//! Definition error types.
//!
//! Raised while converting loosely typed rule and domain documents into the
//! typed model. Rule loading turns these into per-rule warnings so that one bad
//! rule never blocks the others.

use thiserror::Error;

/// Errors in a rule, condition, action or domain definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// The condition `type` is not `and`, `or` or a known comparison.
    #[error("unknown condition type: {0}")]
    UnknownConditionType(String),

    /// A required key is absent.
    #[error("missing key: {0}")]
    MissingKey(&'static str),

    /// A value has the wrong shape (e.g. a list where a mapping is expected).
    #[error("expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: String,
    },

    /// A comparison operand is neither a number, a boolean nor a string.
    #[error("invalid comparison operand: {0}")]
    InvalidOperand(String),

    /// An action string that cannot be read as `name('argument')`.
    #[error("malformed action: {0}")]
    MalformedAction(String),
}
