//! Typed results of formula evaluation.

use std::fmt;

use super::format::format_number;

/// The closed set of evaluation error tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed syntax, bad literal, type mismatch or division by (near) zero.
    Generic,
    /// A formula names a cell that isn't in the workbook.
    Ref,
    /// A cell depends on itself, directly or through other cells.
    Cycle,
}

impl ErrorCode {
    /// The tag shown in place of a value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Generic => "#ERROR",
            ErrorCode::Ref => "#REF",
            ErrorCode::Cycle => "#CYCLE",
        }
    }

    /// Human-readable description for auxiliary display.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::Generic => "invalid formula or operand",
            ErrorCode::Ref => "reference to a missing cell",
            ErrorCode::Cycle => "circular reference",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating a formula.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Error(ErrorCode),
}

impl Value {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Value::Error(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Value::Error(code) => Some(*code),
            _ => None,
        }
    }

    /// Value used when comparing: numbers as-is, booleans as 1.0 / 0.0.
    pub(crate) fn comparison_key(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Error(_) => None,
        }
    }
}

impl From<ErrorCode> for Value {
    fn from(code: ErrorCode) -> Self {
        Value::Error(code)
    }
}

/// Display string consumed by the grid.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Error(code) => f.write_str(code.as_str()),
        }
    }
}
