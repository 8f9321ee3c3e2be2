use std::collections::{HashMap, HashSet};

use crate::error::{Result, TabulaError};
use tabula_engine::engine::{CellLookup, CellRef};

/// A cell: raw text plus the display state derived from it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    /// What the user typed. The single source of truth.
    pub raw: String,
    /// Cached display string, valid until the cell or a dependency changes.
    pub display: String,
    /// Human-readable message when the display shows an error tag.
    pub error: Option<String>,
}

impl Cell {
    pub fn new(raw: impl Into<String>) -> Self {
        Cell {
            raw: raw.into(),
            ..Cell::default()
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A rectangular grid of cells keyed by name.
///
/// Holds exactly `rows × columns` cells. Edits are recorded in a pending set
/// so the next recalculation only touches what they can affect.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    pub(crate) cells: HashMap<CellRef, Cell>,
    pub(crate) rows: usize,
    pub(crate) columns: usize,
    pub(crate) pending: HashSet<CellRef>,
}

impl Workbook {
    /// Largest number of cells a workbook may hold.
    pub const MAX_CELLS: usize = 1 << 20;

    /// Create a workbook with `rows × columns` empty cells.
    pub fn new(rows: usize, columns: usize) -> Result<Self> {
        let mut cells = HashMap::with_capacity(Self::check_size(rows, columns)?);
        for row in 0..rows {
            for col in 0..columns {
                cells.insert(CellRef::new(col, row), Cell::default());
            }
        }
        Ok(Workbook {
            cells,
            rows,
            columns,
            pending: HashSet::new(),
        })
    }

    /// Cell count of a `rows × columns` grid, if it is within [`Self::MAX_CELLS`].
    pub(crate) fn check_size(rows: usize, columns: usize) -> Result<usize> {
        rows.checked_mul(columns)
            .filter(|&count| count <= Self::MAX_CELLS)
            .ok_or(TabulaError::GridTooLarge {
                rows,
                columns,
                max: Self::MAX_CELLS,
            })
    }

    /// Build a workbook from rows of raw text. Short rows are padded with
    /// empty cells up to the widest row. Every non-empty cell is pending.
    pub fn from_rows<R, S>(rows: R) -> Result<Self>
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);

        let mut workbook = Workbook::new(rows.len(), width)?;
        for (row, values) in rows.into_iter().enumerate() {
            for (col, raw) in values.into_iter().enumerate() {
                if raw.is_empty() {
                    continue;
                }
                let cell = CellRef::new(col, row);
                if let Some(slot) = workbook.cells.get_mut(&cell) {
                    slot.raw = raw;
                    workbook.pending.insert(cell);
                }
            }
        }
        Ok(workbook)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        self.cells.contains_key(cell)
    }

    pub fn cell(&self, cell: &CellRef) -> Option<&Cell> {
        self.cells.get(cell)
    }

    pub fn raw(&self, cell: &CellRef) -> Option<&str> {
        self.cells.get(cell).map(|c| c.raw.as_str())
    }

    /// All cell names in row-major order.
    pub fn cell_names(&self) -> Vec<CellRef> {
        let mut names: Vec<CellRef> = self.cells.keys().cloned().collect();
        names.sort_by_key(|c| (c.row, c.col));
        names
    }

    /// Cells edited since the last recalculation.
    pub fn pending(&self) -> &HashSet<CellRef> {
        &self.pending
    }

    pub fn take_pending(&mut self) -> HashSet<CellRef> {
        std::mem::take(&mut self.pending)
    }
}

impl CellLookup for Workbook {
    fn raw_text(&self, cell: &CellRef) -> Option<&str> {
        self.raw(cell)
    }
}
