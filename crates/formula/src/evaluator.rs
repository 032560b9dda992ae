//! Formula evaluator.
//!
//! Reduces an AST to a number. Arithmetic is plain `f64`; the only refusals
//! are division by zero, missing variables, excessive depth and results that
//! are not finite.

use crate::ast::{BinaryOperator, Expr};
use crate::context::Resolve;
use crate::error::{FormulaError, FormulaResult};
use crate::parser::{MAX_DEPTH, parse_formula};

/// Evaluate an AST against a resolver (usually a [`crate::VariableContext`]).
pub fn evaluate<R: Resolve + ?Sized>(expr: &Expr, resolver: &R) -> FormulaResult<f64> {
    evaluate_at(expr, resolver, 1)
}

/// Parse and evaluate a formula string in one go.
pub fn evaluate_formula<R: Resolve + ?Sized>(formula: &str, resolver: &R) -> FormulaResult<f64> {
    let expr = parse_formula(formula)?;
    evaluate(&expr, resolver)
}

fn evaluate_at<R: Resolve + ?Sized>(expr: &Expr, resolver: &R, depth: usize) -> FormulaResult<f64> {
    // Parsed trees never get here; hand-built ones might.
    if depth > MAX_DEPTH {
        return Err(FormulaError::TooComplex { limit: MAX_DEPTH });
    }

    let value = match expr {
        Expr::Number(n) => *n,
        Expr::Variable(name) => resolver.resolve(name)?,
        Expr::Negate(inner) => -evaluate_at(inner, resolver, depth + 1)?,
        Expr::Binary { op, left, right } => {
            let left = evaluate_at(left, resolver, depth + 1)?;
            let right = evaluate_at(right, resolver, depth + 1)?;
            apply_binary(*op, left, right)?
        }
        Expr::Call { function, args } => {
            let values = args
                .iter()
                .map(|arg| evaluate_at(arg, resolver, depth + 1))
                .collect::<FormulaResult<Vec<f64>>>()?;
            function.apply(&values)?
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite)
    }
}

fn apply_binary(op: BinaryOperator, left: f64, right: f64) -> FormulaResult<f64> {
    Ok(match op {
        BinaryOperator::Add => left + right,
        BinaryOperator::Subtract => left - right,
        BinaryOperator::Multiply => left * right,
        BinaryOperator::Divide => {
            if right == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            left / right
        }
    })
}
