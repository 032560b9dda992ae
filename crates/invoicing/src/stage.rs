//! Pipeline stages and the variable names they own.

use serde::{Deserialize, Serialize};

/// Gross amount (`rate × quantity`), supplied by the caller.
pub const GROSS_AMOUNT_VAR: &str = "H";

/// One named step of the invoice computation.
///
/// Stages run in declaration order; each writes its value into the working
/// context under [`Stage::output_variable`] before the next one starts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Charity,
    /// Inter-state GST.
    Igst,
    /// Central GST (intra-state split).
    Cgst,
    /// State GST (intra-state split).
    Sgst,
    AssessableValue,
    SubTotal,
    FinalValue,
}

impl Stage {
    /// Fixed evaluation order.
    pub const ORDER: [Stage; 7] = [
        Stage::Charity,
        Stage::Igst,
        Stage::Cgst,
        Stage::Sgst,
        Stage::AssessableValue,
        Stage::SubTotal,
        Stage::FinalValue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Charity => "charity",
            Stage::Igst => "igst",
            Stage::Cgst => "cgst",
            Stage::Sgst => "sgst",
            Stage::AssessableValue => "assessable_value",
            Stage::SubTotal => "sub_total",
            Stage::FinalValue => "final_value",
        }
    }

    /// Name later formulas use to read this stage's value (`[Charity]`, `[I]`, ...).
    pub fn output_variable(self) -> &'static str {
        match self {
            Stage::Charity => "Charity",
            Stage::Igst => "igstamt",
            Stage::Cgst => "cgstamt",
            Stage::Sgst => "sgstamt",
            Stage::AssessableValue => "I",
            Stage::SubTotal => "SubTotal",
            Stage::FinalValue => "FinalValue",
        }
    }

    /// Stage whose output variable is `name`, if any.
    pub fn producing(name: &str) -> Option<Stage> {
        Self::ORDER
            .into_iter()
            .find(|stage| stage.output_variable() == name)
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn output_variables_are_unique() {
        let names: HashSet<&str> = Stage::ORDER.iter().map(|s| s.output_variable()).collect();
        assert_eq!(names.len(), Stage::ORDER.len());
        assert!(!names.contains(GROSS_AMOUNT_VAR));
    }

    #[test]
    fn order_matches_declaration_order() {
        let mut sorted = Stage::ORDER;
        sorted.sort();
        assert_eq!(sorted, Stage::ORDER);
    }

    #[test]
    fn producing_maps_back_to_stage() {
        assert_eq!(Stage::producing("I"), Some(Stage::AssessableValue));
        assert_eq!(Stage::producing("igstamt"), Some(Stage::Igst));
        assert_eq!(Stage::producing("H"), None);
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&Stage::AssessableValue).unwrap(),
            "\"assessable_value\""
        );
    }
}
