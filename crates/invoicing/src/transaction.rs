//! Seeding the base context from a despatch/invoice line.
//!
//! Formulas read transaction values by the names the mill's configurations
//! use. This builder produces those names, including the gross amount `H`.

use serde::{Deserialize, Serialize};

use millerp_core::{DomainError, DomainResult};
use millerp_formula::VariableContext;

use crate::stage::{GROSS_AMOUNT_VAR, Stage};

pub const RATE_VAR: &str = "Rate / Kg";
pub const QUANTITY_VAR: &str = "Total Kgs";
pub const CHARITY_RATE_VAR: &str = "Charity / Kg";
pub const IGST_PERCENT_VAR: &str = "igstper";

/// Numeric inputs of one invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLine {
    /// Rate per kg.
    pub rate: f64,
    /// Quantity in kg.
    pub quantity: f64,
    #[serde(default)]
    pub charity_rate: Option<f64>,
    /// Configured tax percentage.
    #[serde(default)]
    pub tax_percent: Option<f64>,
    /// Further named inputs (freight, discount, ...), by formula name.
    #[serde(default)]
    pub extra: Vec<(String, f64)>,
}

impl TransactionLine {
    pub fn new(rate: f64, quantity: f64) -> Self {
        Self {
            rate,
            quantity,
            charity_rate: None,
            tax_percent: None,
            extra: Vec::new(),
        }
    }

    pub fn with_charity_rate(mut self, charity_rate: f64) -> Self {
        self.charity_rate = Some(charity_rate);
        self
    }

    pub fn with_tax_percent(mut self, tax_percent: f64) -> Self {
        self.tax_percent = Some(tax_percent);
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: f64) -> Self {
        self.extra.push((name.into(), value));
        self
    }

    /// Gross amount: rate × quantity.
    pub fn gross_amount(&self) -> f64 {
        self.rate * self.quantity
    }

    /// Build the base context for [`crate::compute_invoice`].
    ///
    /// Fails if a value is not finite, if an extra input repeats a name, or if
    /// it tries to supply a stage output.
    pub fn into_context(self) -> DomainResult<VariableContext> {
        let gross = self.gross_amount();
        let mut context = VariableContext::new();

        let mut values = vec![
            (RATE_VAR.to_string(), self.rate),
            (QUANTITY_VAR.to_string(), self.quantity),
            (GROSS_AMOUNT_VAR.to_string(), gross),
        ];
        if let Some(rate) = self.charity_rate {
            values.push((CHARITY_RATE_VAR.to_string(), rate));
        }
        if let Some(percent) = self.tax_percent {
            values.push((IGST_PERCENT_VAR.to_string(), percent));
        }
        values.extend(self.extra);

        for (name, value) in values {
            if !value.is_finite() {
                return Err(DomainError::validation(format!(
                    "[{name}] must be a finite number"
                )));
            }
            if let Some(stage) = Stage::producing(&name) {
                return Err(DomainError::validation(format!(
                    "[{name}] is computed by the {stage} stage"
                )));
            }
            context.define(name, value)?;
        }

        Ok(context)
    }
}
