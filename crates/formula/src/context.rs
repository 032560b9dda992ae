//! Variable context and resolution of bracketed references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use millerp_core::{DomainError, DomainResult};

use crate::error::{FormulaError, FormulaResult};

/// Resolves a bracketed variable name to a value during evaluation.
pub trait Resolve {
    fn resolve(&self, name: &str) -> FormulaResult<f64>;
}

/// Values of named business variables, keyed by the exact text between the
/// brackets (`"Rate / Kg"`, `"Total Kgs"`, `"H"`).
///
/// Serializes as a flat JSON object of name → number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableContext {
    values: BTreeMap<String, f64>,
}

impl VariableContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing any previous value.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(name.into(), value)
    }

    /// Write a value that must not exist yet.
    pub fn define(&mut self, name: impl Into<String>, value: f64) -> DomainResult<()> {
        let name = name.into();
        if self.values.contains_key(&name) {
            return Err(DomainError::conflict(format!(
                "variable [{name}] is already defined"
            )));
        }
        self.values.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl Resolve for VariableContext {
    fn resolve(&self, name: &str) -> FormulaResult<f64> {
        self.get(name)
            .ok_or_else(|| FormulaError::UnknownVariable(name.to_string()))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for VariableContext {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

impl<K: Into<String>> Extend<(K, f64)> for VariableContext {
    fn extend<T: IntoIterator<Item = (K, f64)>>(&mut self, iter: T) {
        self.values
            .extend(iter.into_iter().map(|(name, value)| (name.into(), value)));
    }
}

/// Legacy-compatible resolution: a missing variable reads as `0`.
///
/// Only for configurations that explicitly opt into the old behaviour; strict
/// resolution through [`VariableContext`] is the default everywhere.
#[derive(Debug, Clone, Copy)]
pub struct LenientResolver<'a> {
    context: &'a VariableContext,
}

impl<'a> LenientResolver<'a> {
    pub fn new(context: &'a VariableContext) -> Self {
        Self { context }
    }
}

impl Resolve for LenientResolver<'_> {
    fn resolve(&self, name: &str) -> FormulaResult<f64> {
        Ok(self.context.get(name).unwrap_or_else(|| {
            tracing::warn!(variable = name, "unknown variable read as 0 (legacy mode)");
            0.0
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_requires_exact_name() {
        let ctx = VariableContext::new().with("Rate / Kg", 250.0);

        assert_eq!(ctx.resolve("Rate / Kg"), Ok(250.0));
        assert_eq!(
            ctx.resolve("Rate/Kg"),
            Err(FormulaError::UnknownVariable("Rate/Kg".into()))
        );
        assert_eq!(
            ctx.resolve("rate / kg"),
            Err(FormulaError::UnknownVariable("rate / kg".into()))
        );
    }

    #[test]
    fn define_is_write_once() {
        let mut ctx = VariableContext::new();
        ctx.define("Charity", 12.5).unwrap();

        let err = ctx.define("Charity", 0.0).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(ctx.get("Charity"), Some(12.5));
    }

    #[test]
    fn lenient_resolver_reads_missing_as_zero() {
        let ctx = VariableContext::new().with("H", 100.0);
        let lenient = LenientResolver::new(&ctx);

        assert_eq!(lenient.resolve("H"), Ok(100.0));
        assert_eq!(lenient.resolve("Freight"), Ok(0.0));
    }

    #[test]
    fn deserializes_from_flat_json_object() {
        let ctx: VariableContext =
            serde_json::from_str(r#"{"Rate / Kg": 250, "Total Kgs": 5280.5}"#).unwrap();

        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("Total Kgs"), Some(5280.5));
        let names: Vec<&str> = ctx.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Rate / Kg", "Total Kgs"]);
    }

    #[test]
    fn collects_from_pairs() {
        let mut ctx: VariableContext = [("H", 10.0), ("I", 2.0)].into_iter().collect();
        ctx.extend([("Charity", 1.0)]);
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.remove("I"), Some(2.0));
        assert!(!ctx.contains("I"));
    }
}
