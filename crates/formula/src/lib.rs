//! `millerp-formula`: the invoice formula language.
//!
//! Invoice-type configurations store arithmetic formulas written against named
//! business variables (`[Rate / Kg]*[Total Kgs]`). This crate turns such a
//! formula into tokens, parses them into an AST and evaluates the AST against a
//! [`VariableContext`].
//!
//! The grammar is closed: numbers, bracketed variables, `+ - * /`, parentheses
//! and the whitelisted functions in [`functions`]. Nothing else is accepted.
//!
//! ```rust,ignore
//! use millerp_formula::{CompiledFormula, VariableContext};
//!
//! let formula = CompiledFormula::compile("[Rate / Kg]*[Total Kgs]")?;
//! let ctx = VariableContext::new().with("Rate / Kg", 250.0).with("Total Kgs", 5280.0);
//! assert_eq!(formula.evaluate(&ctx)?, 1_320_000.0);
//! ```

pub mod ast;
pub mod compiled;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod token;

pub use ast::{BinaryOperator, Expr};
pub use compiled::CompiledFormula;
pub use context::{LenientResolver, Resolve, VariableContext};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_formula};
pub use functions::Function;
pub use parser::{MAX_DEPTH, parse, parse_formula};
pub use token::{Token, tokenize};
