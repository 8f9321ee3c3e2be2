//! Classification of raw cell text.
//!
//! Raw text is the single source of truth for a cell. It is classified once
//! into [`CellContent`] so callers don't re-test the `=` prefix at every layer:
//! - whitespace-only text is [`CellContent::Empty`]
//! - text starting with `=` is a [`CellContent::Formula`]
//! - anything else is a [`CellContent::Literal`], shown verbatim

/// The kind of content held in a cell's raw text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellContent<'a> {
    Empty,
    Literal(&'a str),
    /// Formula text including the leading `=`.
    Formula(&'a str),
}

impl<'a> CellContent<'a> {
    pub fn classify(raw: &'a str) -> CellContent<'a> {
        if raw.trim().is_empty() {
            CellContent::Empty
        } else if raw.starts_with('=') {
            CellContent::Formula(raw)
        } else {
            CellContent::Literal(raw)
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellContent::Formula(_))
    }

    /// Numeric value of a literal, as seen by arithmetic.
    /// Empty cells count as 0; text that isn't a finite number has no value.
    pub fn number(&self) -> Option<f64> {
        match self {
            CellContent::Empty => Some(0.0),
            CellContent::Literal(text) => parse_number(text),
            CellContent::Formula(_) => None,
        }
    }
}

pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
