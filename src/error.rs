//! Error types for the Tabula command-line driver

use thiserror::Error;

/// Errors raised while reading the command line
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Invalid number for {option}: {value}")]
    InvalidNumber { option: String, value: String },

    #[error("Invalid assignment '{0}': expected CELL=TEXT")]
    InvalidAssignment(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
