//! Invoice-type configuration.
//!
//! An invoice type is a stored set of formulas, one per [`Stage`], plus a
//! rounding policy. It is owned by an external configuration store and handed
//! to this crate as a value (typically deserialized from JSON).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use millerp_core::{DomainError, DomainResult, InvoiceTypeId, ValueObject};

use crate::error::StageComputationError;
use crate::pipeline::InvoicePipeline;
use crate::rounding::RoundingPolicy;
use crate::stage::Stage;

/// One formula slot of an invoice type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaSlot {
    #[serde(default)]
    pub enabled: bool,
    /// An empty formula on an enabled slot evaluates to 0.
    #[serde(default)]
    pub formula: String,
}

impl ValueObject for FormulaSlot {}

impl FormulaSlot {
    pub fn enabled(formula: impl Into<String>) -> Self {
        Self {
            enabled: true,
            formula: formula.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    fn enabled_empty() -> Self {
        Self::enabled("")
    }

    /// True when the formula has no content (whitespace only counts as empty).
    pub fn is_blank(&self) -> bool {
        self.formula.trim().is_empty()
    }
}

/// What a failing stage does to the computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Abort with [`StageComputationError`].
    #[default]
    Strict,
    /// Old behaviour: missing variables read as 0 and a failing stage contributes 0.
    LegacyZero,
}

/// Configuration of one invoice type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTypeConfig {
    /// Identity issued by the configuration store, if it sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<InvoiceTypeId>,
    pub name: String,
    #[serde(default)]
    pub charity: FormulaSlot,
    #[serde(default)]
    pub igst: FormulaSlot,
    #[serde(default)]
    pub cgst: FormulaSlot,
    #[serde(default)]
    pub sgst: FormulaSlot,
    #[serde(default = "FormulaSlot::enabled_empty")]
    pub assessable_value: FormulaSlot,
    #[serde(default = "FormulaSlot::enabled_empty")]
    pub sub_total: FormulaSlot,
    #[serde(default = "FormulaSlot::enabled_empty")]
    pub final_value: FormulaSlot,
    #[serde(default)]
    pub rounding: Option<RoundingPolicy>,
    #[serde(default)]
    pub error_mode: ErrorMode,
}

impl InvoiceTypeConfig {
    /// New configuration with optional stages disabled and the assessable,
    /// sub-total and final stages enabled with empty formulas.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            charity: FormulaSlot::disabled(),
            igst: FormulaSlot::disabled(),
            cgst: FormulaSlot::disabled(),
            sgst: FormulaSlot::disabled(),
            assessable_value: FormulaSlot::enabled_empty(),
            sub_total: FormulaSlot::enabled_empty(),
            final_value: FormulaSlot::enabled_empty(),
            rounding: None,
            error_mode: ErrorMode::Strict,
        }
    }

    /// Parse a configuration handed over by the configuration store.
    pub fn from_json(json: &str) -> DomainResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| DomainError::validation(format!("invoice type config: {e}")))
    }

    pub fn with_id(mut self, id: InvoiceTypeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_slot(mut self, stage: Stage, slot: FormulaSlot) -> Self {
        *self.slot_mut(stage) = slot;
        self
    }

    /// Enable `stage` with `formula`.
    pub fn with_formula(self, stage: Stage, formula: impl Into<String>) -> Self {
        self.with_slot(stage, FormulaSlot::enabled(formula))
    }

    pub fn with_rounding(mut self, policy: RoundingPolicy) -> Self {
        self.rounding = Some(policy);
        self
    }

    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    pub fn slot(&self, stage: Stage) -> &FormulaSlot {
        match stage {
            Stage::Charity => &self.charity,
            Stage::Igst => &self.igst,
            Stage::Cgst => &self.cgst,
            Stage::Sgst => &self.sgst,
            Stage::AssessableValue => &self.assessable_value,
            Stage::SubTotal => &self.sub_total,
            Stage::FinalValue => &self.final_value,
        }
    }

    fn slot_mut(&mut self, stage: Stage) -> &mut FormulaSlot {
        match stage {
            Stage::Charity => &mut self.charity,
            Stage::Igst => &mut self.igst,
            Stage::Cgst => &mut self.cgst,
            Stage::Sgst => &mut self.sgst,
            Stage::AssessableValue => &mut self.assessable_value,
            Stage::SubTotal => &mut self.sub_total,
            Stage::FinalValue => &mut self.final_value,
        }
    }

    /// Compile every enabled formula and report the first one that does not parse.
    pub fn validate(&self) -> Result<(), StageComputationError> {
        InvoicePipeline::new(self).validate()
    }

    /// Variables the caller must seed: everything enabled formulas read that
    /// is not a stage output.
    pub fn required_inputs(&self) -> Result<BTreeSet<String>, StageComputationError> {
        let pipeline = InvoicePipeline::new(self);
        pipeline.validate()?;

        Ok(pipeline
            .formulas()
            .flat_map(|(_, formula)| formula.variables())
            .filter(|name| Stage::producing(name).is_none())
            .map(str::to_string)
            .collect())
    }
}
