//! Formulas parsed once and evaluated many times.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::ast::Expr;
use crate::context::Resolve;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::evaluate;
use crate::parser::parse_formula;

/// A formula string together with its parsed AST.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
    source: String,
    expr: Expr,
}

impl CompiledFormula {
    pub fn compile(source: impl Into<String>) -> FormulaResult<Self> {
        let source = source.into();
        let expr = parse_formula(&source)?;
        Ok(Self { source, expr })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Variables the formula reads.
    pub fn variables(&self) -> BTreeSet<&str> {
        self.expr.variables()
    }

    pub fn evaluate<R: Resolve + ?Sized>(&self, resolver: &R) -> FormulaResult<f64> {
        evaluate(&self.expr, resolver)
    }
}

impl FromStr for CompiledFormula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl core::fmt::Display for CompiledFormula {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VariableContext;

    #[test]
    fn compiled_formula_evaluates_against_many_contexts() {
        let formula: CompiledFormula = "[Rate / Kg]*[Total Kgs]".parse().unwrap();
        assert_eq!(formula.source(), "[Rate / Kg]*[Total Kgs]");

        let names: Vec<&str> = formula.variables().into_iter().collect();
        assert_eq!(names, vec!["Rate / Kg", "Total Kgs"]);

        for (rate, kgs) in [(250.0, 5280.0), (180.5, 100.0), (0.0, 1.0)] {
            let ctx = VariableContext::new()
                .with("Rate / Kg", rate)
                .with("Total Kgs", kgs);
            assert_eq!(formula.evaluate(&ctx), Ok(rate * kgs));
        }
    }

    #[test]
    fn compile_reports_syntax_errors() {
        let err = CompiledFormula::compile("[H]+").unwrap_err();
        assert!(err.is_syntax_error());
        assert_eq!(err.kind(), "parse");
    }
}
