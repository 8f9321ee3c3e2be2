//! Formula evaluation.
//!
//! Formulas are validated, tokenized and parsed into an [`Expr`] tree, then
//! evaluated by a tree walk. Cell names are resolved on demand through a
//! [`CellLookup`], so a formula cell referenced by another formula is
//! evaluated in turn. The first error anywhere in the tree wins.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::BuildHasher;

use super::ast::{BinaryOp, Expr, Function};
use super::cell::CellContent;
use super::cell_ref::CellRef;
use super::deps::extract_dependencies;
use super::parser::parse_formula;
use super::validate::validate;
use super::value::{ErrorCode, Value};

/// Closeness threshold for `=`, `<>` and near-zero divisors.
pub const EPSILON: f64 = 1e-4;

/// Read access to the raw text of a workbook snapshot.
pub trait CellLookup {
    /// Raw text of `cell`, or None if the cell isn't allocated.
    fn raw_text(&self, cell: &CellRef) -> Option<&str>;
}

impl<S: BuildHasher> CellLookup for HashMap<CellRef, String, S> {
    fn raw_text(&self, cell: &CellRef) -> Option<&str> {
        self.get(cell).map(String::as_str)
    }
}

impl CellLookup for BTreeMap<CellRef, String> {
    fn raw_text(&self, cell: &CellRef) -> Option<&str> {
        self.get(cell).map(String::as_str)
    }
}

impl<T: CellLookup + ?Sized> CellLookup for &T {
    fn raw_text(&self, cell: &CellRef) -> Option<&str> {
        (**self).raw_text(cell)
    }
}

/// Evaluate formula text against a workbook snapshot.
///
/// Text that isn't a formula (no leading `=`) or fails validation evaluates
/// to [`ErrorCode::Generic`].
pub fn evaluate<L: CellLookup + ?Sized>(text: &str, cells: &L) -> Value {
    Evaluator::new(cells).evaluate(text)
}

/// Evaluates formulas against one snapshot, remembering resolved cells.
///
/// Evaluation is a pure function of the snapshot, so one evaluator can be
/// shared by a whole recalculation pass. Create a new one after any edit.
pub struct Evaluator<'a, L: CellLookup + ?Sized> {
    cells: &'a L,
    memo: HashMap<CellRef, Value>,
    resolving: HashSet<CellRef>,
}

impl<'a, L: CellLookup + ?Sized> Evaluator<'a, L> {
    pub fn new(cells: &'a L) -> Self {
        Self {
            cells,
            memo: HashMap::new(),
            resolving: HashSet::new(),
        }
    }

    /// Evaluate a whole formula, including its leading `=`.
    pub fn evaluate(&mut self, text: &str) -> Value {
        let CellContent::Formula(formula) = CellContent::classify(text) else {
            return ErrorCode::Generic.into();
        };
        if let Err(err) = validate(formula) {
            log::trace!("rejected {formula:?}: {err}");
            return ErrorCode::Generic.into();
        }

        match parse_formula(&formula[1..]) {
            Ok(expr) => self.eval_expr(&expr),
            Err(err) => {
                log::trace!("could not parse {formula:?}: {err}");
                ErrorCode::Generic.into()
            }
        }
    }

    /// Value of a cell as seen by a formula that references it.
    ///
    /// Missing cells are `#REF`, empty cells are 0, literals must be numbers
    /// and formulas are evaluated. A cell that is reached again while it is
    /// still being resolved is `#CYCLE`.
    pub fn cell_value(&mut self, cell: &CellRef) -> Value {
        if let Some(value) = self.memo.get(cell) {
            return *value;
        }
        if self.resolving.contains(cell) {
            return ErrorCode::Cycle.into();
        }

        let cells = self.cells;
        let Some(raw) = cells.raw_text(cell) else {
            return ErrorCode::Ref.into();
        };
        let value = match CellContent::classify(raw) {
            CellContent::Formula(formula) => return self.resolve(cell.clone(), formula),
            content => content
                .number()
                .map_or(ErrorCode::Generic.into(), Value::Number),
        };

        log::trace!("{cell} = {value}");
        self.memo.insert(cell.clone(), value);
        value
    }

    /// Evaluate a formula cell after the formula cells it depends on.
    ///
    /// Dependencies are walked depth-first with an explicit stack and
    /// evaluated in post-order, so by the time a formula runs every cell it
    /// names is memoized (or still resolving, which reads as `#CYCLE`).
    /// Recursion depth then follows formula nesting, not chain length.
    fn resolve(&mut self, start: CellRef, formula: &'a str) -> Value {
        let cells = self.cells;
        let mut value = Value::Error(ErrorCode::Generic);

        self.resolving.insert(start.clone());
        let mut stack = vec![Resolving::new(start, formula)];
        while let Some(top) = stack.last_mut() {
            if let Some(dep) = top.deps.next() {
                if self.memo.contains_key(&dep) || self.resolving.contains(&dep) {
                    continue;
                }
                if let Some(CellContent::Formula(formula)) =
                    cells.raw_text(&dep).map(CellContent::classify)
                {
                    self.resolving.insert(dep.clone());
                    stack.push(Resolving::new(dep, formula));
                }
                continue;
            }

            let Some(done) = stack.pop() else {
                break;
            };
            value = self.evaluate(done.formula);
            self.resolving.remove(&done.cell);
            log::trace!("{} = {value}", done.cell);
            self.memo.insert(done.cell, value);
        }
        value
    }

    fn eval_expr(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Cell(name) => match CellRef::parse(name) {
                Some(cell) => self.cell_value(&cell),
                None => ErrorCode::Ref.into(),
            },
            Expr::Call { function, arg } => match self.eval_expr(arg) {
                Value::Number(n) => match function {
                    Function::Inc => Value::Number(n + 1.0),
                    Function::Dec => Value::Number(n - 1.0),
                },
                err @ Value::Error(_) => err,
                Value::Boolean(_) => ErrorCode::Generic.into(),
            },
            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left);
                if !left.is_ok() {
                    return left;
                }
                let right = self.eval_expr(right);
                if !right.is_ok() {
                    return right;
                }
                if op.is_comparison() {
                    compare(*op, left, right)
                } else {
                    arithmetic(*op, left, right)
                }
            }
        }
    }
}

/// A formula cell waiting on its dependencies.
struct Resolving<'a> {
    cell: CellRef,
    formula: &'a str,
    deps: std::vec::IntoIter<CellRef>,
}

impl<'a> Resolving<'a> {
    fn new(cell: CellRef, formula: &'a str) -> Self {
        Resolving {
            cell,
            formula,
            deps: extract_dependencies(formula).into_iter(),
        }
    }
}

/// Numbers compare with numbers and booleans with booleans; mixing is an error.
fn compare(op: BinaryOp, left: Value, right: Value) -> Value {
    let same_kind = matches!(
        (left, right),
        (Value::Number(_), Value::Number(_)) | (Value::Boolean(_), Value::Boolean(_))
    );
    let (true, Some(a), Some(b)) = (same_kind, left.comparison_key(), right.comparison_key())
    else {
        return ErrorCode::Generic.into();
    };

    let result = match op {
        BinaryOp::Equal => (a - b).abs() < EPSILON,
        BinaryOp::NotEqual => (a - b).abs() > EPSILON,
        BinaryOp::LessThan => a < b,
        BinaryOp::LessEqual => a <= b,
        BinaryOp::GreaterThan => a > b,
        BinaryOp::GreaterEqual => a >= b,
        _ => return ErrorCode::Generic.into(),
    };
    Value::Boolean(result)
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Value {
    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return ErrorCode::Generic.into();
    };

    let result = match op {
        BinaryOp::Add => Some(a + b),
        BinaryOp::Subtract => Some(a - b),
        BinaryOp::Multiply => Some(a * b),
        BinaryOp::Divide if b.abs() < EPSILON => None,
        BinaryOp::Divide => Some(a / b),
        BinaryOp::Div if b.abs() < EPSILON => None,
        BinaryOp::Div => (a as i64).checked_div(b as i64).map(|q| q as f64),
        BinaryOp::Mod => (a as i64).checked_rem(b as i64).map(|r| r as f64),
        _ => None,
    };

    match result {
        Some(n) if n.is_finite() => Value::Number(n),
        _ => ErrorCode::Generic.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(cells: &[(&str, &str)]) -> HashMap<CellRef, String> {
        cells
            .iter()
            .map(|(name, raw)| (CellRef::parse(name).unwrap(), raw.to_string()))
            .collect()
    }

    fn eval(text: &str) -> Value {
        evaluate(text, &HashMap::<CellRef, String>::new())
    }

    #[test]
    fn arithmetic_follows_precedence() {
        assert_eq!(eval("=(5+3)"), Value::Number(8.0));
        assert_eq!(eval("=(10-4-2)"), Value::Number(4.0));
        assert_eq!(eval("=((5+3)*2)"), Value::Number(16.0));
        assert_eq!(eval("=2+3*4"), Value::Number(14.0));
        assert_eq!(eval("=(20/4)"), Value::Number(5.0));
        assert_eq!(eval("=100/10/5"), Value::Number(2.0));
        assert_eq!(eval("=-5+2"), Value::Number(-3.0));
    }

    #[test]
    fn mod_and_div_truncate() {
        assert_eq!(eval("=(17 mod 5)"), Value::Number(2.0));
        assert_eq!(eval("=(20 div 3)"), Value::Number(6.0));
        assert_eq!(eval("=(7.9 div 2.2)"), Value::Number(3.0));
        assert_eq!(eval("=(-7 mod 3)"), Value::Number(-1.0));
        assert_eq!(eval("=(10 mod 0.5)"), Value::Error(ErrorCode::Generic));
        assert_eq!(eval("=(10 mod 0)"), Value::Error(ErrorCode::Generic));
    }

    #[test]
    fn division_by_near_zero_is_an_error() {
        assert_eq!(eval("=(10/0)"), Value::Error(ErrorCode::Generic));
        assert_eq!(eval("=(10/0.00001)"), Value::Error(ErrorCode::Generic));
        assert_eq!(eval("=(10 div 0)"), Value::Error(ErrorCode::Generic));
        assert_eq!(eval("=(10 div 0.5)"), Value::Error(ErrorCode::Generic));
    }

    #[test]
    fn inc_and_dec_compose() {
        assert_eq!(eval("=(inc(5))"), Value::Number(6.0));
        assert_eq!(eval("=(dec(dec(5)))"), Value::Number(3.0));
        assert_eq!(eval("=(inc(dec(10)))"), Value::Number(10.0));
        assert_eq!(eval("=inc(2)*3"), Value::Number(9.0));
        assert_eq!(eval("=inc(1<2)"), Value::Error(ErrorCode::Generic));
    }

    #[test]
    fn comparisons_use_epsilon_for_equality() {
        assert_eq!(eval("=(10=10)"), Value::Boolean(true));
        assert_eq!(eval("=(10<>10)"), Value::Boolean(false));
        assert_eq!(eval("=(10=10.00001)"), Value::Boolean(true));
        assert_eq!(eval("=(10<>10.00001)"), Value::Boolean(false));
        assert_eq!(eval("=(10<10.00001)"), Value::Boolean(true));
        assert_eq!(eval("=(10>=10)"), Value::Boolean(true));
        assert_eq!(eval("=(5>10)"), Value::Boolean(false));
    }

    #[test]
    fn booleans_compare_only_with_booleans() {
        assert_eq!(eval("=(1<2)=(3<4)"), Value::Boolean(true));
        assert_eq!(eval("=(1<2)>(3>4)"), Value::Boolean(true));
        assert_eq!(eval("=(1<2)=1"), Value::Error(ErrorCode::Generic));
        assert_eq!(eval("=(1<2)+1"), Value::Error(ErrorCode::Generic));
    }

    #[test]
    fn cell_references_resolve_recursively() {
        let cells = sheet(&[("A1", "10"), ("A2", "5"), ("A3", "=(A1+A2)"), ("B1", "")]);
        assert_eq!(evaluate("=(A3*2)", &cells), Value::Number(30.0));
        assert_eq!(evaluate("=(B1+5)", &cells), Value::Number(5.0));
        assert_eq!(evaluate("=(Z9+1)", &cells), Value::Error(ErrorCode::Ref));
        assert_eq!(evaluate("=(A0+1)", &cells), Value::Error(ErrorCode::Ref));
    }

    #[test]
    fn non_numeric_literals_are_errors() {
        let cells = sheet(&[("A1", "hello"), ("A2", "=(1/0)"), ("A3", "=(A9)")]);
        assert_eq!(evaluate("=(A1+1)", &cells), Value::Error(ErrorCode::Generic));
        assert_eq!(evaluate("=(A2+A3)", &cells), Value::Error(ErrorCode::Generic));
        // The left operand's error wins.
        assert_eq!(evaluate("=(A3+A2)", &cells), Value::Error(ErrorCode::Ref));
    }

    #[test]
    fn invalid_text_is_generic_error() {
        assert_eq!(eval(""), Value::Error(ErrorCode::Generic));
        assert_eq!(eval("42"), Value::Error(ErrorCode::Generic));
        assert_eq!(eval("=(1++2)"), Value::Error(ErrorCode::Generic));
        assert_eq!(eval("=(1  +2)"), Value::Error(ErrorCode::Generic));
        assert_eq!(eval("=(1<2<3)"), Value::Error(ErrorCode::Generic));
        assert_eq!(eval("=sum(1)"), Value::Error(ErrorCode::Generic));
    }

    #[test]
    fn overflow_is_an_error_not_infinity() {
        assert_eq!(eval("=1e308*10"), Value::Error(ErrorCode::Generic));
    }

    #[test]
    fn cycles_without_the_gate_are_reported() {
        let cells = sheet(&[("A1", "=(B1+1)"), ("B1", "=(A1+1)")]);
        let mut evaluator = Evaluator::new(&cells);
        assert_eq!(
            evaluator.cell_value(&CellRef::parse("A1").unwrap()),
            Value::Error(ErrorCode::Cycle)
        );
    }

    #[test]
    fn memo_is_shared_across_calls() {
        let cells = sheet(&[("A1", "=(2*3)"), ("B1", "=(A1+A1)"), ("C1", "=(B1*A1)")]);
        let mut evaluator = Evaluator::new(&cells);
        assert_eq!(evaluator.evaluate("=(B1)"), Value::Number(12.0));
        assert_eq!(evaluator.evaluate("=(C1)"), Value::Number(72.0));
        assert_eq!(evaluator.memo.len(), 3);
    }

    #[test]
    fn long_reference_chains_evaluate() {
        let len = 100_000;
        let cells: HashMap<CellRef, String> = (0..len)
            .map(|row| {
                let raw = if row + 1 == len {
                    "1".to_string()
                } else {
                    format!("=(A{}+1)", row + 2)
                };
                (CellRef::new(0, row), raw)
            })
            .collect();
        assert_eq!(evaluate("=(A1)", &cells), Value::Number(len as f64));
    }

    #[test]
    fn diamond_dependencies_resolve_once() {
        let cells = sheet(&[
            ("A1", "=(B1+C1)"),
            ("B1", "=(D1*2)"),
            ("C1", "=(D1+B1)"),
            ("D1", "=(inc(4))"),
        ]);
        let mut evaluator = Evaluator::new(&cells);
        assert_eq!(evaluator.evaluate("=(A1)"), Value::Number(25.0));
        assert_eq!(evaluator.memo.len(), 4);
    }
}
