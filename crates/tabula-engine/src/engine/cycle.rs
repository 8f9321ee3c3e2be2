//! Circular dependency detection for formula cells.
//!
//! Before a formula is evaluated we verify it can't recurse into itself
//! (e.g., A1 references B1, B1 references C1, C1 references A1). This is a
//! depth-first search with a `visited` set (known safe or being explored)
//! and an on-stack set (ancestors on the current path), driven by an
//! explicit work stack.

use std::collections::HashSet;

use super::CellLookup;
use super::cell_ref::CellRef;
use super::deps::extract_dependencies;

/// Detect circular dependencies starting from a cell.
/// Returns Some(cycle_path) if a cycle is found, None otherwise. The path
/// starts at `start` and ends with the cell that was revisited.
pub fn detect_cycle<L: CellLookup + ?Sized>(start: &CellRef, cells: &L) -> Option<Vec<CellRef>> {
    let path = find_cycle(start, cells)?;
    log::debug!(
        "circular reference: {}",
        path.iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    Some(path)
}

/// Whether evaluating `start` would recurse into itself.
pub fn has_cycle<L: CellLookup + ?Sized>(start: &CellRef, cells: &L) -> bool {
    detect_cycle(start, cells).is_some()
}

/// A cell on the current path and the dependencies it has left to explore.
struct Frame {
    cell: CellRef,
    deps: std::vec::IntoIter<CellRef>,
}

impl Frame {
    fn new(cell: CellRef, raw: &str) -> Self {
        Frame {
            deps: extract_dependencies(raw).into_iter(),
            cell,
        }
    }
}

// Explicit work stack: chains can be far longer than the thread stack allows.
fn find_cycle<L: CellLookup + ?Sized>(start: &CellRef, cells: &L) -> Option<Vec<CellRef>> {
    let raw = cells.raw_text(start)?;
    let mut visited = HashSet::from([start.clone()]);
    let mut on_stack = HashSet::from([start.clone()]);
    let mut frames = vec![Frame::new(start.clone(), raw)];

    while let Some(frame) = frames.last_mut() {
        let Some(dep) = frame.deps.next() else {
            if let Some(done) = frames.pop() {
                on_stack.remove(&done.cell);
            }
            continue;
        };
        let Some(raw) = cells.raw_text(&dep) else {
            continue;
        };

        if on_stack.contains(&dep) {
            let mut path: Vec<CellRef> = frames.iter().map(|f| f.cell.clone()).collect();
            path.push(dep);
            return Some(path);
        }
        if !visited.insert(dep.clone()) {
            continue;
        }

        on_stack.insert(dep.clone());
        frames.push(Frame::new(dep, raw));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn sheet(cells: &[(&str, &str)]) -> HashMap<CellRef, String> {
        cells
            .iter()
            .map(|(name, raw)| (CellRef::parse(name).unwrap(), raw.to_string()))
            .collect()
    }

    fn cell(name: &str) -> CellRef {
        CellRef::parse(name).unwrap()
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let cells = sheet(&[("A1", "=(A1+1)")]);
        assert_eq!(detect_cycle(&cell("A1"), &cells), Some(vec![cell("A1"), cell("A1")]));
    }

    #[test]
    fn mutual_and_ring_cycles() {
        let cells = sheet(&[("A1", "=(B1)"), ("B1", "=(A1)")]);
        assert!(has_cycle(&cell("A1"), &cells));

        let cells = sheet(&[("A1", "=(B1+1)"), ("B1", "=(C1*2)"), ("C1", "=(A1-3)")]);
        assert_eq!(
            detect_cycle(&cell("B1"), &cells),
            Some(vec![cell("B1"), cell("C1"), cell("A1"), cell("B1")])
        );
    }

    #[test]
    fn reaching_a_cycle_counts() {
        let cells = sheet(&[("A1", "=(B1)"), ("B1", "=(C1)"), ("C1", "=(B1)")]);
        assert!(has_cycle(&cell("A1"), &cells));
    }

    #[test]
    fn diamonds_and_missing_cells_are_not_cycles() {
        let cells = sheet(&[
            ("A1", "=(B1+C1)"),
            ("B1", "=(D1)"),
            ("C1", "=(D1*2)"),
            ("D1", "5"),
            ("E1", "=(Z99)"),
        ]);
        assert!(!has_cycle(&cell("A1"), &cells));
        assert!(!has_cycle(&cell("E1"), &cells));
        assert!(!has_cycle(&cell("Q7"), &cells));
    }

    #[test]
    fn literals_never_cycle() {
        // Looks like a reference, but isn't a formula.
        let cells = sheet(&[("A1", "A1")]);
        assert!(!has_cycle(&cell("A1"), &cells));
    }

    fn column_chain(len: usize) -> HashMap<CellRef, String> {
        (0..len)
            .map(|row| {
                let raw = if row + 1 == len {
                    "1".to_string()
                } else {
                    format!("=(A{}+1)", row + 2)
                };
                (CellRef::new(0, row), raw)
            })
            .collect()
    }

    #[test]
    fn long_chains_do_not_exhaust_the_stack() {
        let mut cells = column_chain(100_000);
        assert!(!has_cycle(&cell("A1"), &cells));

        cells.insert(cell("A100000"), "=(A1)".to_string());
        let path = detect_cycle(&cell("A50000"), &cells).unwrap();
        assert_eq!(path.len(), 100_001);
        assert_eq!(path.first(), Some(&cell("A50000")));
        assert_eq!(path.last(), Some(&cell("A50000")));
    }
}
