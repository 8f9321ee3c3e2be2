//! Error types for Tabula core.

use thiserror::Error;

/// Errors raised by workbook operations.
///
/// Formula problems are not errors here: they end up in a cell's display
/// and error message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TabulaError {
    #[error("Unknown cell: {0}")]
    UnknownCell(String),

    #[error("Invalid cell name: {0}")]
    InvalidCellName(String),

    #[error("Grid of {rows} x {columns} cells exceeds the limit of {max} cells")]
    GridTooLarge {
        rows: usize,
        columns: usize,
        max: usize,
    },

    #[error("No {0} left to remove")]
    EmptyDimension(&'static str),
}

pub type Result<T> = std::result::Result<T, TabulaError>;
