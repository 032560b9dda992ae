//! Output of one invoice computation.

use serde::{Deserialize, Serialize};

use millerp_core::ValueObject;

use crate::stage::Stage;

/// Unrounded value of every stage; a stage that did not run holds 0.
///
/// Serialized flat under the stage names, except the final stage, which is
/// `final_value_unrounded` so it cannot be mistaken for the rounded total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageValues {
    pub charity: f64,
    pub igst: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub assessable_value: f64,
    pub sub_total: f64,
    #[serde(rename = "final_value_unrounded")]
    pub final_value: f64,
}

impl ValueObject for StageValues {}

impl StageValues {
    pub fn get(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Charity => self.charity,
            Stage::Igst => self.igst,
            Stage::Cgst => self.cgst,
            Stage::Sgst => self.sgst,
            Stage::AssessableValue => self.assessable_value,
            Stage::SubTotal => self.sub_total,
            Stage::FinalValue => self.final_value,
        }
    }

    pub fn set(&mut self, stage: Stage, value: f64) {
        let slot = match stage {
            Stage::Charity => &mut self.charity,
            Stage::Igst => &mut self.igst,
            Stage::Cgst => &mut self.cgst,
            Stage::Sgst => &mut self.sgst,
            Stage::AssessableValue => &mut self.assessable_value,
            Stage::SubTotal => &mut self.sub_total,
            Stage::FinalValue => &mut self.final_value,
        };
        *slot = value;
    }
}

/// Values computed for one invoice.
///
/// `final_value` is the final stage after the rounding policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationResult {
    #[serde(flatten)]
    pub components: StageValues,
    pub final_value: f64,
    /// Present only under reverse rounding: `final_value − final_value_unrounded`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_off: Option<f64>,
    /// Stages whose failure was replaced by 0 in legacy mode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zeroed_stages: Vec<Stage>,
}

impl ComputationResult {
    /// Unrounded value of a stage.
    pub fn get(&self, stage: Stage) -> f64 {
        self.components.get(stage)
    }

    pub fn charity(&self) -> f64 {
        self.components.charity
    }

    pub fn igst_amount(&self) -> f64 {
        self.components.igst
    }

    /// Total tax across the IGST/CGST/SGST stages.
    pub fn tax_amount(&self) -> f64 {
        self.components.igst + self.components.cgst + self.components.sgst
    }

    pub fn assessable_value(&self) -> f64 {
        self.components.assessable_value
    }

    pub fn sub_total(&self) -> f64 {
        self.components.sub_total
    }

    pub fn unrounded_final_value(&self) -> f64 {
        self.components.final_value
    }
}
