use super::{Cell, Workbook};
use crate::error::{Result, TabulaError};
use tabula_engine::engine::CellRef;

/// Dimension for row/column operations
#[derive(Copy, Clone)]
enum Dimension {
    Row,
    Column,
}

impl Dimension {
    fn name(&self) -> &'static str {
        match self {
            Dimension::Row => "row",
            Dimension::Column => "column",
        }
    }

    /// Get the coordinate value from a CellRef for this dimension
    fn get_coord(&self, cell_ref: &CellRef) -> usize {
        match self {
            Dimension::Row => cell_ref.row,
            Dimension::Column => cell_ref.col,
        }
    }

    /// Cells along the other dimension at `coord`.
    fn line(&self, coord: usize, len: usize) -> impl Iterator<Item = CellRef> {
        let dim = *self;
        (0..len).map(move |i| match dim {
            Dimension::Row => CellRef::new(i, coord),
            Dimension::Column => CellRef::new(coord, i),
        })
    }
}

impl Workbook {
    fn extent(&self, dim: Dimension) -> usize {
        match dim {
            Dimension::Row => self.rows,
            Dimension::Column => self.columns,
        }
    }

    fn extent_mut(&mut self, dim: Dimension) -> &mut usize {
        match dim {
            Dimension::Row => &mut self.rows,
            Dimension::Column => &mut self.columns,
        }
    }

    fn cross_extent(&self, dim: Dimension) -> usize {
        match dim {
            Dimension::Row => self.columns,
            Dimension::Column => self.rows,
        }
    }

    /// Set a cell's raw text and mark it for recalculation.
    pub fn set_raw(&mut self, cell: &CellRef, raw: impl Into<String>) -> Result<()> {
        let slot = self
            .cells
            .get_mut(cell)
            .ok_or_else(|| TabulaError::UnknownCell(cell.to_string()))?;
        slot.raw = raw.into();
        self.pending.insert(cell.clone());
        Ok(())
    }

    /// Like [`Workbook::set_raw`], addressing the cell by name.
    pub fn set(&mut self, name: &str, raw: impl Into<String>) -> Result<()> {
        let cell =
            CellRef::parse(name).ok_or_else(|| TabulaError::InvalidCellName(name.to_string()))?;
        self.set_raw(&cell, raw)
    }

    /// Generic append operation for row or column
    fn append_dimension(&mut self, dim: Dimension) {
        let coord = self.extent(dim);
        let new_cells: Vec<CellRef> = dim.line(coord, self.cross_extent(dim)).collect();
        for cell_ref in new_cells {
            self.cells.insert(cell_ref.clone(), Cell::default());
            // Formulas that named this cell were #REF until now.
            self.pending.insert(cell_ref);
        }
        *self.extent_mut(dim) += 1;
    }

    /// Generic remove-last operation for row or column
    fn remove_last_dimension(&mut self, dim: Dimension) -> Result<()> {
        let Some(coord) = self.extent(dim).checked_sub(1) else {
            return Err(TabulaError::EmptyDimension(dim.name()));
        };

        let removed: Vec<CellRef> = self
            .cells
            .keys()
            .filter(|cell_ref| dim.get_coord(cell_ref) == coord)
            .cloned()
            .collect();
        for cell_ref in removed {
            self.cells.remove(&cell_ref);
            // Dependents must now show #REF.
            self.pending.insert(cell_ref);
        }
        *self.extent_mut(dim) = coord;
        Ok(())
    }

    /// Append an empty row below the last one
    pub fn add_row(&mut self) {
        self.append_dimension(Dimension::Row);
    }

    /// Append an empty column right of the last one
    pub fn add_column(&mut self) {
        self.append_dimension(Dimension::Column);
    }

    /// Delete the last row
    pub fn remove_last_row(&mut self) -> Result<()> {
        self.remove_last_dimension(Dimension::Row)
    }

    /// Delete the last column
    pub fn remove_last_column(&mut self) -> Result<()> {
        self.remove_last_dimension(Dimension::Column)
    }

    /// Grow the grid until `cell` is allocated. Fails, leaving the grid
    /// untouched, if that would exceed [`Workbook::MAX_CELLS`].
    pub fn grow_to_fit(&mut self, cell: &CellRef) -> Result<()> {
        let rows = self.rows.max(cell.row.saturating_add(1));
        let columns = self.columns.max(cell.col.saturating_add(1));
        Workbook::check_size(rows, columns)?;

        while self.columns <= cell.col {
            self.add_column();
        }
        while self.rows <= cell.row {
            self.add_row();
        }
        Ok(())
    }
}
