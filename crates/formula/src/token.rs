//! Formula tokenizer.
//!
//! Scans a formula left to right into a flat token stream. Only letters,
//! digits, `.`, `+ - * / ( ) [ ]`, `,` and whitespace may appear outside a
//! bracketed variable; inside brackets everything up to the closing `]` is the
//! variable name, spaces and `/` included.

use crate::ast::BinaryOperator;
use crate::error::{FormulaError, FormulaResult};

/// Token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    /// A run of letters not followed by `(`. The grammar has no use for it,
    /// the parser reports it.
    Identifier(String),
    Operator(BinaryOperator),
    LParen,
    RParen,
    Comma,
    /// `[Name]`, carrying the name verbatim.
    VariableRef(String),
    /// A run of letters immediately followed by `(`.
    FunctionName(String),
}

impl core::fmt::Display for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {n}"),
            Token::Identifier(name) => write!(f, "identifier '{name}'"),
            Token::Operator(op) => write!(f, "'{op}'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::VariableRef(name) => write!(f, "variable [{name}]"),
            Token::FunctionName(name) => write!(f, "function '{name}'"),
        }
    }
}

/// Tokenize a formula string.
///
/// # Example
/// ```rust
/// use millerp_formula::{tokenize, Token};
///
/// let tokens = tokenize("[Rate / Kg]*2").unwrap();
/// assert_eq!(tokens[0], Token::VariableRef("Rate / Kg".into()));
/// ```
pub fn tokenize(formula: &str) -> FormulaResult<Vec<Token>> {
    Tokenizer::new(formula).run()
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    /// Byte offsets of `(` not yet closed.
    open_parens: Vec<usize>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
            open_parens: Vec::new(),
        }
    }

    fn run(mut self) -> FormulaResult<Vec<Token>> {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
                continue;
            }

            let token = match c {
                '[' => self.scan_variable()?,
                '.' | '0'..='9' => self.scan_number()?,
                c if c.is_alphabetic() => self.scan_identifier(),
                '(' => {
                    self.open_parens.push(self.pos);
                    self.advance();
                    Token::LParen
                }
                ')' => {
                    // An unmatched ')' is a grammar problem; the parser reports it.
                    self.open_parens.pop();
                    self.advance();
                    Token::RParen
                }
                ',' => {
                    self.advance();
                    Token::Comma
                }
                ']' => {
                    return Err(FormulaError::tokenize(self.pos, "unmatched ']'"));
                }
                c => match BinaryOperator::from_char(c) {
                    Some(op) => {
                        self.advance();
                        Token::Operator(op)
                    }
                    None => {
                        return Err(FormulaError::tokenize(
                            self.pos,
                            format!("unexpected character '{c}'"),
                        ));
                    }
                },
            };
            self.tokens.push(token);
        }

        if let Some(&position) = self.open_parens.first() {
            return Err(FormulaError::tokenize(position, "unterminated '('"));
        }

        Ok(self.tokens)
    }

    fn scan_variable(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip '['

        let rest = &self.input[self.pos..];
        let end = rest
            .find(']')
            .ok_or_else(|| FormulaError::tokenize(start, "unterminated '['"))?;
        let name = &rest[..end];

        if name.is_empty() {
            return Err(FormulaError::tokenize(start, "empty variable reference '[]'"));
        }
        if let Some(offset) = name.find('[') {
            return Err(FormulaError::tokenize(
                self.pos + offset,
                "'[' inside a variable reference",
            ));
        }

        let token = Token::VariableRef(name.to_string());
        self.pos += end + 1; // Name plus closing ']'
        Ok(token)
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        let mut seen_dot = false;

        while let Some(c) = self.peek_char() {
            match c {
                '0'..='9' => self.advance(),
                '.' if !seen_dot => {
                    seen_dot = true;
                    self.advance();
                }
                '.' => {
                    return Err(FormulaError::tokenize(
                        self.pos,
                        "number has more than one '.'",
                    ));
                }
                _ => break,
            }
        }

        let text = &self.input[start..self.pos];
        if text == "." {
            return Err(FormulaError::tokenize(start, "'.' is not a number"));
        }
        let value = text
            .parse::<f64>()
            .map_err(|e| FormulaError::tokenize(start, format!("invalid number '{text}': {e}")))?;
        Ok(Token::Number(value))
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self.peek_char().is_some_and(char::is_alphabetic) {
            self.advance();
        }
        let text = self.input[start..self.pos].to_string();

        if self.peek_char() == Some('(') {
            Token::FunctionName(text)
        } else {
            Token::Identifier(text)
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }
}
