//! tabula-core - UI-agnostic workbook model + recalculation.

pub mod error;
pub mod workbook;

pub use error::{Result, TabulaError};
pub use workbook::{Cell, Workbook};

pub use tabula_engine::engine::CellRef;
