//! Formula tokenizer.
//!
//! Turns the formula body (text after `=`) into an immutable token sequence.
//! Two-character comparison operators are matched before their one-character
//! prefixes, so `>=` never reads as `>` followed by `=`.

use std::fmt;

use super::cell::parse_number;
use super::error::{FormulaError, FormulaResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    /// Upper-case letters followed by digits, e.g. `AB12`.
    Cell(String),
    Plus,
    Minus,
    Star,
    Slash,
    Mod,
    Div,
    Inc,
    Dec,
    LeftParen,
    RightParen,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl Token {
    fn is_comparison(&self) -> bool {
        matches!(
            self,
            Token::Equal
                | Token::NotEqual
                | Token::LessThan
                | Token::LessEqual
                | Token::GreaterThan
                | Token::GreaterEqual
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "'{}'", n),
            Token::Cell(name) => write!(f, "'{}'", name),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::Mod => f.write_str("'mod'"),
            Token::Div => f.write_str("'div'"),
            Token::Inc => f.write_str("'inc'"),
            Token::Dec => f.write_str("'dec'"),
            Token::LeftParen => f.write_str("'('"),
            Token::RightParen => f.write_str("')'"),
            Token::Equal => f.write_str("'='"),
            Token::NotEqual => f.write_str("'<>'"),
            Token::LessThan => f.write_str("'<'"),
            Token::LessEqual => f.write_str("'<='"),
            Token::GreaterThan => f.write_str("'>'"),
            Token::GreaterEqual => f.write_str("'>='"),
        }
    }
}

/// Tokenize a formula body.
pub fn tokenize(input: &str) -> FormulaResult<Vec<Token>> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> FormulaResult<Vec<Token>> {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.pos += 1;
                continue;
            }

            let token = match c {
                b'+' => self.single(Token::Plus),
                b'*' => self.single(Token::Star),
                b'/' => self.single(Token::Slash),
                b'(' => self.single(Token::LeftParen),
                b')' => self.single(Token::RightParen),
                b'=' => self.single(Token::Equal),
                b'<' => match self.peek_at(1) {
                    Some(b'=') => self.double(Token::LessEqual),
                    Some(b'>') => self.double(Token::NotEqual),
                    _ => self.single(Token::LessThan),
                },
                b'>' => match self.peek_at(1) {
                    Some(b'=') => self.double(Token::GreaterEqual),
                    _ => self.single(Token::GreaterThan),
                },
                b'-' if self.starts_operand() && self.number_follows(1) => self.scan_number()?,
                b'-' => self.single(Token::Minus),
                b'0'..=b'9' => self.scan_number()?,
                b'.' if self.number_follows(0) => self.scan_number()?,
                c if c.is_ascii_alphabetic() => self.scan_word()?,
                _ => {
                    let found = self.input[self.pos..].chars().next().unwrap_or('?');
                    return Err(FormulaError::UnexpectedChar {
                        pos: self.pos,
                        found,
                    });
                }
            };
            self.tokens.push(token);
        }
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn double(&mut self, token: Token) -> Token {
        self.pos += 2;
        token
    }

    /// A minus sign here would begin an operand rather than subtract.
    fn starts_operand(&self) -> bool {
        match self.tokens.last() {
            None | Some(Token::LeftParen) => true,
            Some(token) => token.is_comparison(),
        }
    }

    /// Does a number literal start `offset` bytes ahead?
    fn number_follows(&self, offset: usize) -> bool {
        match self.peek_at(offset) {
            Some(c) if c.is_ascii_digit() => true,
            Some(b'.') => self.peek_at(offset + 1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        self.eat_digits();
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.eat_digits();
        }

        // Exponent, only when digits actually follow.
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let digits_at = match self.peek_at(1) {
                Some(b'+' | b'-') => 2,
                _ => 1,
            };
            if self.peek_at(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += digits_at;
                self.eat_digits();
            }
        }

        let text = &self.input[start..self.pos];
        parse_number(text)
            .map(Token::Number)
            .ok_or_else(|| FormulaError::InvalidNumber(text.to_string()))
    }

    fn scan_word(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let word = &self.input[start..self.pos];

        if word.bytes().all(|c| c.is_ascii_uppercase())
            && self.peek().is_some_and(|c| c.is_ascii_digit())
        {
            self.eat_digits();
            return Ok(Token::Cell(self.input[start..self.pos].to_string()));
        }

        match word {
            "mod" => self.word_operator(start, "mod", Token::Mod),
            "div" => self.word_operator(start, "div", Token::Div),
            "inc" => self.function(Token::Inc, "inc"),
            "dec" => self.function(Token::Dec, "dec"),
            _ => Err(FormulaError::UnknownWord(word.to_string())),
        }
    }

    fn word_operator(
        &self,
        start: usize,
        name: &'static str,
        token: Token,
    ) -> FormulaResult<Token> {
        let spaced = start
            .checked_sub(1)
            .and_then(|i| self.bytes.get(i))
            .is_some_and(|c| c.is_ascii_whitespace());
        if spaced {
            Ok(token)
        } else {
            Err(FormulaError::UnspacedOperator(name))
        }
    }

    fn function(&self, token: Token, name: &'static str) -> FormulaResult<Token> {
        if self.peek() == Some(b'(') {
            Ok(token)
        } else {
            Err(FormulaError::DetachedFunction(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn arithmetic_tokens() {
        assert_eq!(
            tokenize("(10-4)*A1").unwrap(),
            vec![
                Token::LeftParen,
                Token::Number(10.0),
                Token::Minus,
                Token::Number(4.0),
                Token::RightParen,
                Token::Star,
                Token::Cell("A1".into()),
            ]
        );
    }

    #[test]
    fn comparison_operators_prefer_two_chars() {
        assert_eq!(
            tokenize("1>=2<=3<>4>5<6=7").unwrap(),
            vec![
                Token::Number(1.0),
                Token::GreaterEqual,
                Token::Number(2.0),
                Token::LessEqual,
                Token::Number(3.0),
                Token::NotEqual,
                Token::Number(4.0),
                Token::GreaterThan,
                Token::Number(5.0),
                Token::LessThan,
                Token::Number(6.0),
                Token::Equal,
                Token::Number(7.0),
            ]
        );
    }

    #[test]
    fn leading_minus_is_a_negative_literal() {
        assert_eq!(
            tokenize("-5-3").unwrap(),
            vec![Token::Number(-5.0), Token::Minus, Token::Number(3.0)]
        );
        assert_eq!(
            tokenize("inc(-2)").unwrap(),
            vec![
                Token::Inc,
                Token::LeftParen,
                Token::Number(-2.0),
                Token::RightParen
            ]
        );
        assert_eq!(
            tokenize("1>-2").unwrap(),
            vec![Token::Number(1.0), Token::GreaterThan, Token::Number(-2.0)]
        );
        // After an arithmetic operator the minus stays binary.
        assert_eq!(
            tokenize("2*-3").unwrap(),
            vec![
                Token::Number(2.0),
                Token::Star,
                Token::Minus,
                Token::Number(3.0)
            ]
        );
    }

    #[test]
    fn word_operators_need_a_leading_space() {
        assert_eq!(
            tokenize("17 mod 5").unwrap(),
            vec![Token::Number(17.0), Token::Mod, Token::Number(5.0)]
        );
        assert_eq!(
            tokenize("17mod 5"),
            Err(FormulaError::UnspacedOperator("mod"))
        );
    }

    #[test]
    fn functions_need_an_attached_paren() {
        assert_eq!(tokenize("inc (5)"), Err(FormulaError::DetachedFunction("inc")));
        assert_eq!(tokenize("dec"), Err(FormulaError::DetachedFunction("dec")));
    }

    #[test]
    fn numbers_with_fraction_and_exponent() {
        assert_eq!(tokenize("2.5").unwrap(), vec![Token::Number(2.5)]);
        assert_eq!(tokenize(".5").unwrap(), vec![Token::Number(0.5)]);
        assert_eq!(tokenize("1e3").unwrap(), vec![Token::Number(1000.0)]);
        assert_eq!(tokenize("1E-2").unwrap(), vec![Token::Number(0.01)]);
    }

    #[test]
    fn unknown_words_and_characters() {
        assert_eq!(tokenize("sum(1)"), Err(FormulaError::UnknownWord("sum".into())));
        assert_eq!(tokenize("a1"), Err(FormulaError::UnknownWord("a".into())));
        assert_eq!(
            tokenize("1 & 2"),
            Err(FormulaError::UnexpectedChar { pos: 2, found: '&' })
        );
    }
}
