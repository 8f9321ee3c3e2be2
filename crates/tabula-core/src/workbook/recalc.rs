//! Recalculation of cell display state.
//!
//! Each cell goes through validation, the cycle gate and evaluation, in that
//! order. A pass evaluates against the workbook as it is and only writes
//! results back once every target is computed, so cells can share one
//! evaluator (and its memo) without seeing half-updated state.

use std::collections::{HashSet, VecDeque};

use super::Workbook;
use tabula_engine::engine::{
    CellContent, CellRef, ErrorCode, Evaluator, Value, extract_dependencies, has_cycle, validate,
};

/// Display state computed for one cell.
struct Outcome {
    display: String,
    error: Option<String>,
}

impl Outcome {
    fn clean(display: impl Into<String>) -> Self {
        Outcome {
            display: display.into(),
            error: None,
        }
    }

    fn failed(code: ErrorCode, message: impl Into<String>) -> Self {
        Outcome {
            display: code.as_str().to_string(),
            error: Some(message.into()),
        }
    }
}

impl Workbook {
    /// Recompute a single cell.
    pub fn recalc_cell(&mut self, cell: &CellRef) {
        self.recalc_cells([cell.clone()]);
    }

    /// Recompute every cell. Clears the pending set.
    pub fn recalc_all(&mut self) {
        let targets = self.cell_names();
        log::debug!("recalculating all {} cells", targets.len());
        self.recalc_cells(targets);
        self.pending.clear();
    }

    /// Recompute the changed cells and everything that depends on them,
    /// directly or transitively. `changed` is cleared afterwards.
    pub fn recalc_changed(&mut self, changed: &mut HashSet<CellRef>) {
        if changed.is_empty() {
            return;
        }

        let dependents = self.find_dependents(changed);
        log::debug!(
            "recalculating {} changed cells and {} dependents",
            changed.len(),
            dependents.len()
        );

        let mut targets: HashSet<CellRef> = changed.iter().cloned().collect();
        targets.extend(dependents);
        self.recalc_cells(targets);
        changed.clear();
    }

    /// Recompute everything affected by edits since the last recalculation.
    pub fn recalc_pending(&mut self) {
        let mut pending = self.take_pending();
        self.recalc_changed(&mut pending);
    }

    /// All formula cells that (transitively) mention a cell in `changed`.
    ///
    /// Breadth-first over the reverse dependency relation. A cell is never
    /// enqueued twice, so cyclic references terminate.
    pub fn find_dependents(&self, changed: &HashSet<CellRef>) -> HashSet<CellRef> {
        let formulas: Vec<(&CellRef, Vec<CellRef>)> = self
            .cells
            .iter()
            .filter(|(_, cell)| CellContent::classify(&cell.raw).is_formula())
            .map(|(cell_ref, cell)| (cell_ref, extract_dependencies(&cell.raw)))
            .collect();

        let mut result = HashSet::new();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<CellRef> = changed.iter().cloned().collect();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            for (candidate, deps) in &formulas {
                if deps.contains(&current) && result.insert((*candidate).clone()) {
                    queue.push_back((*candidate).clone());
                }
            }
        }

        result
    }

    fn recalc_cells(&mut self, targets: impl IntoIterator<Item = CellRef>) {
        let outcomes: Vec<(CellRef, Outcome)> = {
            let mut evaluator = Evaluator::new(&*self);
            targets
                .into_iter()
                .filter_map(|cell| {
                    let outcome = self.compute(&mut evaluator, &cell)?;
                    Some((cell, outcome))
                })
                .collect()
        };

        for (cell_ref, outcome) in outcomes {
            if let Some(cell) = self.cells.get_mut(&cell_ref) {
                cell.display = outcome.display;
                cell.error = outcome.error;
            }
        }
    }

    /// None when the cell isn't in the workbook (e.g. a removed row).
    fn compute(&self, evaluator: &mut Evaluator<'_, Workbook>, cell: &CellRef) -> Option<Outcome> {
        let raw = self.raw(cell)?;
        let outcome = match CellContent::classify(raw) {
            CellContent::Empty => Outcome::clean(""),
            CellContent::Literal(text) => Outcome::clean(text),
            CellContent::Formula(formula) => {
                if let Err(err) = validate(formula) {
                    Outcome::failed(ErrorCode::Generic, err.to_string())
                } else if has_cycle(cell, self) {
                    Outcome::failed(ErrorCode::Cycle, ErrorCode::Cycle.description())
                } else {
                    match evaluator.cell_value(cell) {
                        Value::Error(code) => Outcome::failed(code, code.description()),
                        value => Outcome::clean(value.to_string()),
                    }
                }
            }
        };
        log::trace!("{cell}: {}", outcome.display);
        Some(outcome)
    }
}
