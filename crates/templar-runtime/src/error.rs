//! Runtime errors

use thiserror::Error;

/// Runtime result type
pub type Result<T> = std::result::Result<T, RenderError>;

/// Failures raised while evaluating a compiled expression or template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("assertion failed: {message}")]
    AssertionFailed { message: String },

    #[error("{message}")]
    Raised { message: String },

    #[error("template did not stabilise after {passes} passes")]
    LoopDetected { passes: usize },

    #[error("unresolved name '{name}'")]
    UnresolvedName { name: String },

    #[error("division by zero")]
    DivideByZero,

    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: i128, len: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("'{name}' cannot be invoked: {reason}")]
    NotInvocable { name: String, reason: String },

    #[error("invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("host error: {0}")]
    Host(String),
}

impl RenderError {
    pub fn mismatch(expected: impl ToString, found: impl ToString) -> Self {
        RenderError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
