//! Expression error types.
//!
//! These never leave the evaluator: [`crate::ExpressionEvaluator`] folds
//! every `ExprError` into the outcome's `error` field.

use thiserror::Error;

/// Errors raised while normalizing, parsing or interpreting an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// The text is not a well-formed expression.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Well-formed, but outside the whitelisted grammar.
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    /// An operator or function was applied to values of the wrong type.
    #[error("type error: {0}")]
    Type(String),

    #[error("modulo by zero")]
    ModuloByZero,

    /// Nesting exceeded the parser or interpreter depth limit.
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),

    /// A name survived binding but is not bound in any scope.
    #[error("unknown name: {0}")]
    UnknownName(String),
}

impl ExprError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }

    /// Whether the single-comparison fallback should be attempted.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }
}

/// Result type alias for expression operations.
pub type ExprResult<T> = Result<T, ExprError>;
