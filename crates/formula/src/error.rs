//! Formula error types.

use thiserror::Error;

/// Result type for formula operations.
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors raised while tokenizing, parsing or evaluating a formula.
///
/// None of these are swallowed inside the crate; callers decide what a failed
/// formula means for their invoice.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// The formula text contains something the tokenizer does not accept.
    #[error("tokenize error at position {position}: {message}")]
    Tokenize { position: usize, message: String },

    /// The token stream does not match the grammar.
    #[error("parse error: {0}")]
    Parse(String),

    /// A call to a function outside the whitelist.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A whitelisted function called with the wrong number of arguments.
    #[error("wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A bracketed variable with no value in the context.
    #[error("unknown variable: [{0}]")]
    UnknownVariable(String),

    /// The right operand of `/` evaluated to zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Nesting deeper than the parser/evaluator accepts.
    #[error("formula too complex: nesting exceeds {limit} levels")]
    TooComplex { limit: usize },

    /// Arithmetic overflowed to infinity or produced NaN.
    #[error("result is not a finite number")]
    NonFinite,
}

impl FormulaError {
    pub(crate) fn tokenize(position: usize, message: impl Into<String>) -> Self {
        Self::Tokenize {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Short, stable name of the error kind (used as a structured log field).
    pub fn kind(&self) -> &'static str {
        match self {
            FormulaError::Tokenize { .. } => "tokenize",
            FormulaError::Parse(_) => "parse",
            FormulaError::UnknownFunction(_) => "unknown_function",
            FormulaError::ArgumentCount { .. } => "argument_count",
            FormulaError::UnknownVariable(_) => "unknown_variable",
            FormulaError::DivisionByZero => "division_by_zero",
            FormulaError::TooComplex { .. } => "too_complex",
            FormulaError::NonFinite => "non_finite",
        }
    }

    /// True for errors detected before any value is looked up.
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            FormulaError::Tokenize { .. }
                | FormulaError::Parse(_)
                | FormulaError::UnknownFunction(_)
                | FormulaError::ArgumentCount { .. }
        )
    }
}
