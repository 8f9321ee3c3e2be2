//! Structural syntax check for raw cell text.
//!
//! Runs before any evaluation is attempted. It only looks at the shape of the
//! text: whitespace, parenthesis balance and operator adjacency. Operator
//! arity, function names and cell-name shape are left to the evaluator.

use thiserror::Error;

/// Operator pairs that can never appear next to each other.
const ILLEGAL_SEQUENCES: [&str; 10] = ["++", "+-", "+*", "+/", "--", "-*", "-/", "**", "*/", "//"];

const ARITHMETIC_OPERATORS: [char; 4] = ['+', '-', '*', '/'];

/// Why a piece of cell text was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("empty expression")]
    Empty,

    #[error("empty expression after '='")]
    EmptyFormula,

    #[error("double spaces are not allowed")]
    DoubleSpace,

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("illegal operator sequence '{0}'")]
    IllegalOperatorSequence(&'static str),

    #[error("expression cannot start with '{0}'")]
    LeadingOperator(char),

    #[error("expression cannot end with '{0}'")]
    TrailingOperator(char),
}

/// Validate raw cell text.
///
/// Text that doesn't start with `=` is a literal and always valid, unless it
/// is blank.
pub fn validate(text: &str) -> Result<(), SyntaxError> {
    if text.trim().is_empty() {
        return Err(SyntaxError::Empty);
    }

    let Some(body) = text.strip_prefix('=') else {
        return Ok(());
    };
    let body = body.trim();

    if body.is_empty() {
        return Err(SyntaxError::EmptyFormula);
    }
    if body.contains("  ") {
        return Err(SyntaxError::DoubleSpace);
    }
    if !parentheses_balanced(body) {
        return Err(SyntaxError::UnbalancedParentheses);
    }
    check_operators(body)
}

fn parentheses_balanced(body: &str) -> bool {
    let mut depth = 0i64;
    for c in body.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn check_operators(body: &str) -> Result<(), SyntaxError> {
    if let Some(seq) = ILLEGAL_SEQUENCES
        .iter()
        .copied()
        .find(|seq| body.contains(seq))
    {
        return Err(SyntaxError::IllegalOperatorSequence(seq));
    }

    // `body` is trimmed and non-empty here.
    if let Some(first) = body.chars().next()
        && ARITHMETIC_OPERATORS.contains(&first)
        && first != '-'
    {
        return Err(SyntaxError::LeadingOperator(first));
    }
    if let Some(last) = body.chars().last()
        && ARITHMETIC_OPERATORS.contains(&last)
    {
        return Err(SyntaxError::TrailingOperator(last));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_valid() {
        assert_eq!(validate("hello"), Ok(()));
        assert_eq!(validate("12"), Ok(()));
        assert_eq!(validate("a  b"), Ok(()));
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(validate(""), Err(SyntaxError::Empty));
        assert_eq!(validate("  \t"), Err(SyntaxError::Empty));
        assert_eq!(validate("= "), Err(SyntaxError::EmptyFormula));
    }

    #[test]
    fn well_formed_formulas_pass() {
        for text in ["=(5+3)", "=(17 mod 5)", "=-5+2", "=(inc(dec(10)))", "=(A1>=B2)"] {
            assert_eq!(validate(text), Ok(()), "{text}");
        }
    }

    #[test]
    fn double_space_is_rejected() {
        assert_eq!(validate("=(1  + 2)"), Err(SyntaxError::DoubleSpace));
    }

    #[test]
    fn parentheses_must_balance_at_every_point() {
        assert_eq!(validate("=((1+2)"), Err(SyntaxError::UnbalancedParentheses));
        assert_eq!(validate("=(1+2))"), Err(SyntaxError::UnbalancedParentheses));
        assert_eq!(validate("=)1+2("), Err(SyntaxError::UnbalancedParentheses));
    }

    #[test]
    fn illegal_operator_pairs_are_rejected() {
        for (text, seq) in [
            ("=(1++2)", "++"),
            ("=(1+-2)", "+-"),
            ("=(1+*2)", "+*"),
            ("=(1+/2)", "+/"),
            ("=(1--2)", "--"),
            ("=(1-*2)", "-*"),
            ("=(1-/2)", "-/"),
            ("=(1**2)", "**"),
            ("=(1*/2)", "*/"),
            ("=(1//2)", "//"),
        ] {
            assert_eq!(
                validate(text),
                Err(SyntaxError::IllegalOperatorSequence(seq)),
                "{text}"
            );
        }
    }

    #[test]
    fn leading_and_trailing_operators() {
        assert_eq!(validate("=*2"), Err(SyntaxError::LeadingOperator('*')));
        assert_eq!(validate("=+2"), Err(SyntaxError::LeadingOperator('+')));
        assert_eq!(validate("=-2"), Ok(()));
        assert_eq!(validate("=2-"), Err(SyntaxError::TrailingOperator('-')));
        assert_eq!(validate("=2 /"), Err(SyntaxError::TrailingOperator('/')));
    }

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(
            SyntaxError::IllegalOperatorSequence("++").to_string(),
            "illegal operator sequence '++'"
        );
    }
}
