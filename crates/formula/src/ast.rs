//! Formula abstract syntax tree.

use std::collections::BTreeSet;

use crate::functions::Function;

/// Formula expression AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// Bracketed variable reference, by exact name (`[Rate / Kg]` → `"Rate / Kg"`).
    Variable(String),
    /// Binary arithmetic.
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary minus.
    Negate(Box<Expr>),
    /// Call to a whitelisted function.
    Call { function: Function, args: Vec<Expr> },
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn negate(inner: Expr) -> Self {
        Expr::Negate(Box::new(inner))
    }

    /// Names of all variables referenced anywhere in the expression.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Expr::Number(_) => {}
                Expr::Variable(name) => {
                    names.insert(name.as_str());
                }
                Expr::Binary { left, right, .. } => {
                    stack.push(left.as_ref());
                    stack.push(right.as_ref());
                }
                Expr::Negate(inner) => stack.push(inner.as_ref()),
                Expr::Call { args, .. } => stack.extend(args.iter()),
            }
        }
        names
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(BinaryOperator::Add),
            '-' => Some(BinaryOperator::Subtract),
            '*' => Some(BinaryOperator::Multiply),
            '/' => Some(BinaryOperator::Divide),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
        }
    }
}

impl core::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
