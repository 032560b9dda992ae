//! Formula parser.
//!
//! A recursive descent parser over the token stream:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := Number | VariableRef | '-' factor | '(' expr ')'
//!         | FunctionName '(' expr (',' expr)* ')'
//! ```
//!
//! Unary minus binds tighter than `*` and `/`. Anything outside this grammar
//! (assignment, comparison, strings, bare identifiers) is a parse error.

use crate::ast::{BinaryOperator, Expr};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::Function;
use crate::token::{Token, tokenize};

/// Maximum AST depth accepted by the parser and the evaluator.
pub const MAX_DEPTH: usize = 100;

/// Tokenize and parse a formula string into an AST.
///
/// # Example
/// ```rust
/// use millerp_formula::parse_formula;
///
/// let ast = parse_formula("[H]+[I]").unwrap();
/// let ast = parse_formula("Round(([H]/([igstper]+100))*[igstper],0)").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<Expr> {
    let tokens = tokenize(formula)?;
    parse(&tokens)
}

/// Parse a token stream into an AST.
pub fn parse(tokens: &[Token]) -> FormulaResult<Expr> {
    if tokens.is_empty() {
        return Err(FormulaError::parse("empty formula"));
    }

    let mut parser = Parser::new(tokens);
    let node = parser.parse_expression()?;

    // Make sure we consumed all input
    match parser.current_token() {
        None => Ok(node.expr),
        Some(Token::RParen) => Err(FormulaError::parse("unmatched ')'")),
        Some(token) => Err(FormulaError::parse(format!(
            "unexpected {token} after expression"
        ))),
    }
}

/// An expression together with the depth of its tree.
struct Node {
    expr: Expr,
    depth: usize,
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Current recursion depth of `parse_factor`.
    nesting: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            nesting: 0,
        }
    }

    // === Helper methods ===

    fn current_token(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, context: &str) -> FormulaResult<()> {
        match self.consume() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(FormulaError::parse(format!(
                "expected {expected} {context}, got {token}"
            ))),
            None => Err(FormulaError::parse(format!(
                "expected {expected} {context}, got end of formula"
            ))),
        }
    }

    fn node(&self, expr: Expr, depth: usize) -> FormulaResult<Node> {
        if depth > MAX_DEPTH {
            return Err(FormulaError::TooComplex { limit: MAX_DEPTH });
        }
        Ok(Node { expr, depth })
    }

    fn binary(&self, op: BinaryOperator, left: Node, right: Node) -> FormulaResult<Node> {
        let depth = left.depth.max(right.depth) + 1;
        self.node(Expr::binary(op, left.expr, right.expr), depth)
    }

    // === Grammar ===

    fn parse_expression(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_term()?;

        while let Some(Token::Operator(op @ (BinaryOperator::Add | BinaryOperator::Subtract))) =
            self.current_token()
        {
            self.consume();
            let right = self.parse_term()?;
            left = self.binary(*op, left, right)?;
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_factor()?;

        while let Some(Token::Operator(op @ (BinaryOperator::Multiply | BinaryOperator::Divide))) =
            self.current_token()
        {
            self.consume();
            let right = self.parse_factor()?;
            left = self.binary(*op, left, right)?;
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> FormulaResult<Node> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(FormulaError::TooComplex { limit: MAX_DEPTH });
        }
        let result = self.parse_factor_inner();
        self.nesting -= 1;
        result
    }

    fn parse_factor_inner(&mut self) -> FormulaResult<Node> {
        let token = self
            .consume()
            .ok_or_else(|| FormulaError::parse("unexpected end of formula"))?;

        match token {
            Token::Number(value) => self.node(Expr::Number(*value), 1),
            Token::VariableRef(name) => self.node(Expr::Variable(name.clone()), 1),
            Token::Operator(BinaryOperator::Subtract) => {
                let inner = self.parse_factor()?;
                self.node(Expr::negate(inner.expr), inner.depth + 1)
            }
            Token::LParen => {
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen, "to close '('")?;
                Ok(inner)
            }
            Token::FunctionName(name) => self.parse_call(name),
            Token::RParen => Err(FormulaError::parse("unexpected ')'")),
            Token::Identifier(name) => Err(FormulaError::parse(format!(
                "unexpected identifier '{name}' (variables are written as [{name}])"
            ))),
            other => Err(FormulaError::parse(format!("unexpected {other}"))),
        }
    }

    fn parse_call(&mut self, name: &str) -> FormulaResult<Node> {
        let function =
            Function::lookup(name).ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

        self.expect(&Token::LParen, &format!("after {}", function.name()))?;

        let mut args = Vec::new();
        let mut depth = 0;
        loop {
            let arg = self.parse_expression()?;
            depth = depth.max(arg.depth);
            args.push(arg.expr);

            match self.consume() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                Some(token) => {
                    return Err(FormulaError::parse(format!(
                        "expected ',' or ')' in {} call, got {token}",
                        function.name()
                    )));
                }
                None => {
                    return Err(FormulaError::parse(format!(
                        "unterminated {} call",
                        function.name()
                    )));
                }
            }
        }

        function.check_arity(args.len())?;
        self.node(Expr::Call { function, args }, depth + 1)
    }
}
