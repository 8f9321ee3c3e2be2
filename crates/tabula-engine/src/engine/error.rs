//! Formula error types.

use thiserror::Error;

/// Result type for tokenizing and parsing.
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors raised while turning formula text into an expression tree.
///
/// These never escape [`evaluate`](super::evaluate): they become
/// [`ErrorCode::Generic`](super::ErrorCode::Generic).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    #[error("unexpected character '{found}' at offset {pos}")]
    UnexpectedChar { pos: usize, found: char },

    #[error("unknown word '{0}'")]
    UnknownWord(String),

    #[error("'{0}' must be preceded by a space")]
    UnspacedOperator(&'static str),

    #[error("'{0}' must be followed directly by '('")]
    DetachedFunction(&'static str),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("only one comparison is allowed per expression")]
    ChainedComparison,
}
