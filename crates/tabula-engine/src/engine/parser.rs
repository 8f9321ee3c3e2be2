//! Formula parser
//!
//! A precedence-climbing parser over the token sequence. Levels, lowest first:
//!
//! 1. comparison (`= <> < <= > >=`), at most one per nesting level
//! 2. additive (`+ -`), left-associative
//! 3. multiplicative (`* / mod div`), left-associative
//! 4. `inc(..)` / `dec(..)`, parenthesised groups, numbers and cell names

use super::ast::{BinaryOp, Expr, Function};
use super::error::{FormulaError, FormulaResult};
use super::lexer::{Token, tokenize};

/// Parse a formula body (the text after `=`) into an expression tree.
pub fn parse_formula(body: &str) -> FormulaResult<Expr> {
    let tokens = tokenize(body)?;
    let mut parser = FormulaParser { tokens, pos: 0 };
    let expr = parser.parse_comparison()?;

    // Make sure we consumed all input
    if let Some(token) = parser.peek() {
        return Err(FormulaError::UnexpectedToken(token.to_string()));
    }
    Ok(expr)
}

struct FormulaParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl FormulaParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_right_paren(&mut self) -> FormulaResult<()> {
        match self.next() {
            Some(Token::RightParen) => Ok(()),
            Some(other) => Err(FormulaError::UnexpectedToken(other.to_string())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn parse_comparison(&mut self) -> FormulaResult<Expr> {
        let left = self.parse_additive()?;
        let Some(op) = self.peek().and_then(comparison_op) else {
            return Ok(left);
        };
        self.pos += 1;
        let right = self.parse_additive()?;

        if self.peek().and_then(comparison_op).is_some() {
            return Err(FormulaError::ChainedComparison);
        }
        Ok(Expr::binary(op, left, right))
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                Some(Token::Mod) => BinaryOp::Mod,
                Some(Token::Div) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Cell(name)) => Ok(Expr::Cell(name)),
            Some(Token::LeftParen) => {
                let inner = self.parse_comparison()?;
                self.expect_right_paren()?;
                Ok(inner)
            }
            Some(Token::Inc) => self.parse_call(Function::Inc),
            Some(Token::Dec) => self.parse_call(Function::Dec),
            Some(other) => Err(FormulaError::UnexpectedToken(other.to_string())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn parse_call(&mut self, function: Function) -> FormulaResult<Expr> {
        // The lexer guarantees '(' follows the function name.
        match self.next() {
            Some(Token::LeftParen) => {}
            Some(other) => return Err(FormulaError::UnexpectedToken(other.to_string())),
            None => return Err(FormulaError::UnexpectedEnd),
        }
        let arg = self.parse_comparison()?;
        self.expect_right_paren()?;
        Ok(Expr::Call {
            function,
            arg: Box::new(arg),
        })
    }
}

fn comparison_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Equal => Some(BinaryOp::Equal),
        Token::NotEqual => Some(BinaryOp::NotEqual),
        Token::LessThan => Some(BinaryOp::LessThan),
        Token::LessEqual => Some(BinaryOp::LessEqual),
        Token::GreaterThan => Some(BinaryOp::GreaterThan),
        Token::GreaterEqual => Some(BinaryOp::GreaterEqual),
        _ => None,
    }
}
