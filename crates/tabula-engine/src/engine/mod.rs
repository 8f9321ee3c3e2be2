//! Formula engine API.
//!
//! This module provides the computation core of the spreadsheet:
//!
//! - [`CellRef`] - Cell name parsing (A1 notation ↔ row/col indices)
//! - [`CellContent`] - Classification of raw cell text
//! - [`validate`] - Structural syntax check run before evaluation
//! - [`parse_formula`] - Tokenize and parse a formula body into an [`Expr`]
//! - [`evaluate`], [`Evaluator`] - Typed evaluation against a [`CellLookup`]
//! - [`extract_dependencies`] - Cell names referenced by a formula
//! - [`detect_cycle`], [`has_cycle`] - Circular dependency detection
//! - [`format_number`] - Display formatting for numbers

mod ast;
mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod error;
mod eval;
mod format;
mod lexer;
mod parser;
mod validate;
mod value;

pub use ast::{BinaryOp, Expr, Function};
pub use cell::CellContent;
pub use cell_ref::CellRef;
pub use cycle::{detect_cycle, has_cycle};
pub use deps::extract_dependencies;
pub use error::{FormulaError, FormulaResult};
pub use eval::{CellLookup, EPSILON, Evaluator, evaluate};
pub use format::format_number;
pub use lexer::{Token, tokenize};
pub use parser::parse_formula;
pub use validate::{SyntaxError, validate};
pub use value::{ErrorCode, Value};
