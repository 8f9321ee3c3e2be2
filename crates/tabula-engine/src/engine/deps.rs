//! Dependency extraction from formula text.
//!
//! Scans a formula for cell names (`[A-Z]+[0-9]+`) and returns each distinct
//! cell once, in the order it first appears. The scan is purely textual:
//! it doesn't need the formula to be valid.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::cell::CellContent;
use super::cell_ref::CellRef;

/// Extract all cell references from a formula as dependencies.
/// Non-formula text has no dependencies.
pub fn extract_dependencies(text: &str) -> Vec<CellRef> {
    if !CellContent::classify(text).is_formula() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut deps = Vec::new();
    for m in cell_ref_re().find_iter(text) {
        // Matches like "A0" can never name a cell.
        let Some(cell) = CellRef::parse(m.as_str()) else {
            continue;
        };
        if seen.insert(cell.clone()) {
            deps.push(cell);
        }
    }
    deps
}

fn cell_ref_re() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| {
        Regex::new(r"[A-Z]+[0-9]+").expect("dependency cell reference regex must compile")
    })
}
