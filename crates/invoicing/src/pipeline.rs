//! Formula pipeline orchestration.
//!
//! Stages run in [`Stage::ORDER`]. Each stage evaluates its formula against
//! the working context and writes the value under its output variable, so a
//! later formula can read `[Charity]`, `[igstamt]` or `[I]`. Only the final
//! value goes through the rounding policy.
//!
//! The pipeline is a pure function of its inputs: no IO, no shared state.

use millerp_core::InvoiceTypeId;
use millerp_formula::{CompiledFormula, FormulaError, LenientResolver, VariableContext};

use crate::config::{ErrorMode, InvoiceTypeConfig};
use crate::error::StageComputationError;
use crate::result::{ComputationResult, StageValues};
use crate::rounding::RoundingPolicy;
use crate::stage::Stage;

/// Compute all stage values and the rounded final value for one invoice.
pub fn compute_invoice(
    config: &InvoiceTypeConfig,
    base: VariableContext,
) -> Result<ComputationResult, StageComputationError> {
    InvoicePipeline::new(config).compute(base)
}

/// What a stage does when the pipeline reaches it.
#[derive(Debug, Clone, PartialEq)]
enum StagePlan {
    Disabled,
    /// Enabled with an empty formula: contributes 0.
    Empty,
    Formula(CompiledFormula),
    /// Enabled, but the formula does not compile.
    Invalid(FormulaError),
}

/// An invoice type with its formulas compiled, ready to run against any
/// number of transaction contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoicePipeline {
    invoice_type_id: Option<InvoiceTypeId>,
    name: String,
    plans: Vec<(Stage, StagePlan)>,
    rounding: Option<RoundingPolicy>,
    error_mode: ErrorMode,
}

impl InvoicePipeline {
    pub fn new(config: &InvoiceTypeConfig) -> Self {
        let plans = Stage::ORDER
            .into_iter()
            .map(|stage| (stage, plan_for(config, stage)))
            .collect();

        Self {
            invoice_type_id: config.id,
            name: config.name.clone(),
            plans,
            rounding: config.rounding,
            error_mode: config.error_mode,
        }
    }

    /// First stage (in pipeline order) whose enabled formula does not compile.
    pub fn validate(&self) -> Result<(), StageComputationError> {
        self.plans
            .iter()
            .find_map(|(stage, plan)| match plan {
                StagePlan::Invalid(err) => Some(StageComputationError::new(*stage, err.clone())),
                _ => None,
            })
            .map_or(Ok(()), Err)
    }

    /// Compiled formulas of enabled stages, in pipeline order.
    pub fn formulas(&self) -> impl Iterator<Item = (Stage, &CompiledFormula)> {
        self.plans.iter().filter_map(|(stage, plan)| match plan {
            StagePlan::Formula(formula) => Some((*stage, formula)),
            _ => None,
        })
    }

    pub fn compute(
        &self,
        base: VariableContext,
    ) -> Result<ComputationResult, StageComputationError> {
        let mut context = base;
        for stage in Stage::ORDER {
            if let Some(value) = context.remove(stage.output_variable()) {
                tracing::warn!(
                    invoice_type = %self.name,
                    variable = stage.output_variable(),
                    value,
                    "caller supplied a stage output; it is recomputed"
                );
            }
        }

        let mut components = StageValues::default();
        let mut zeroed_stages = Vec::new();

        for (stage, plan) in &self.plans {
            let stage = *stage;
            let outcome = match plan {
                StagePlan::Disabled | StagePlan::Empty => Ok(0.0),
                StagePlan::Formula(formula) => self.evaluate(formula, &context),
                StagePlan::Invalid(err) => Err(err.clone()),
            };

            let value = match outcome {
                Ok(value) => value,
                Err(err) => match self.error_mode {
                    ErrorMode::Strict => {
                        tracing::debug!(
                            invoice_type = %self.name,
                            stage = %stage,
                            error_kind = err.kind(),
                            "stage failed"
                        );
                        return Err(StageComputationError::new(stage, err));
                    }
                    ErrorMode::LegacyZero => {
                        tracing::warn!(
                            invoice_type = %self.name,
                            stage = %stage,
                            error = %err,
                            "stage failed; using 0 (legacy mode)"
                        );
                        zeroed_stages.push(stage);
                        0.0
                    }
                },
            };

            tracing::debug!(stage = %stage, value, "stage computed");

            // Output names are unique per stage and were cleared above.
            let previous = context.insert(stage.output_variable(), value);
            debug_assert!(previous.is_none());
            components.set(stage, value);
        }

        let unrounded = components.final_value;
        let (final_value, round_off) = match self.rounding {
            Some(policy) => {
                let rounded = policy.apply(unrounded);
                (rounded.value, rounded.round_off)
            }
            None => (unrounded, None),
        };

        tracing::info!(
            invoice_type = %self.name,
            invoice_type_id = self.invoice_type_id.map(tracing::field::display),
            final_value,
            round_off = ?round_off,
            "invoice computed"
        );

        Ok(ComputationResult {
            components,
            final_value,
            round_off,
            zeroed_stages,
        })
    }

    fn evaluate(
        &self,
        formula: &CompiledFormula,
        context: &VariableContext,
    ) -> Result<f64, FormulaError> {
        match self.error_mode {
            ErrorMode::Strict => formula.evaluate(context),
            ErrorMode::LegacyZero => formula.evaluate(&LenientResolver::new(context)),
        }
    }
}

fn plan_for(config: &InvoiceTypeConfig, stage: Stage) -> StagePlan {
    let slot = config.slot(stage);
    if !slot.enabled {
        return StagePlan::Disabled;
    }
    if slot.is_blank() {
        return StagePlan::Empty;
    }
    match CompiledFormula::compile(slot.formula.as_str()) {
        Ok(formula) => StagePlan::Formula(formula),
        Err(err) => StagePlan::Invalid(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormulaSlot;
    use crate::rounding::{RoundingDirection, RoundingPolicy};
    use pretty_assertions::assert_eq;

    const IGST_FORMULA: &str = "Round(([H]/([igstper]+100))*[igstper],0)";

    fn yarn_context() -> VariableContext {
        VariableContext::new()
            .with("Rate / Kg", 250.0)
            .with("Total Kgs", 5280.0)
            .with("H", 1_320_000.0)
            .with("igstper", 5.0)
            .with("Charity / Kg", 0.05)
    }

    fn inter_state_config() -> InvoiceTypeConfig {
        InvoiceTypeConfig::new("Yarn sale (inter-state)")
            .with_formula(Stage::Igst, IGST_FORMULA)
            .with_formula(Stage::AssessableValue, "[H]+[igstamt]")
            .with_formula(Stage::SubTotal, "[I]")
            .with_formula(Stage::FinalValue, "[SubTotal]")
    }

    #[test]
    fn disabled_charity_contributes_zero_and_igst_feeds_assessable_value() {
        let result = compute_invoice(&inter_state_config(), yarn_context()).unwrap();

        assert_eq!(result.charity(), 0.0);
        assert_eq!(result.igst_amount(), 62_857.0);
        assert_eq!(result.assessable_value(), 1_382_857.0);
        assert_eq!(result.final_value, 1_382_857.0);
        assert_eq!(result.round_off, None);
        assert!(result.zeroed_stages.is_empty());
    }

    #[test]
    fn empty_sub_total_is_zero_and_final_stage_still_runs() {
        let config = inter_state_config()
            .with_formula(Stage::SubTotal, "")
            .with_formula(Stage::FinalValue, "[I]+[SubTotal]");

        let result = compute_invoice(&config, yarn_context()).unwrap();

        assert_eq!(result.sub_total(), 0.0);
        assert_eq!(result.final_value, 1_382_857.0);
    }

    #[test]
    fn charity_value_chains_into_assessable_value() {
        let config = InvoiceTypeConfig::new("Yarn sale with charity")
            .with_formula(Stage::Charity, "[Total Kgs]*[Charity / Kg]")
            .with_formula(Stage::AssessableValue, "[H]+[Charity]")
            .with_formula(Stage::SubTotal, "[I]")
            .with_formula(Stage::FinalValue, "[SubTotal]");

        let result = compute_invoice(&config, yarn_context()).unwrap();

        assert_eq!(result.charity(), 264.0);
        assert_eq!(result.assessable_value(), 1_320_264.0);
        assert_eq!(result.final_value, 1_320_264.0);
    }

    #[test]
    fn disabled_stage_reads_as_zero_downstream() {
        let config = inter_state_config()
            .with_formula(Stage::AssessableValue, "[H]+[Charity]+[igstamt]");

        let result = compute_invoice(&config, yarn_context()).unwrap();
        assert_eq!(result.assessable_value(), 1_382_857.0);
    }

    #[test]
    fn disabled_stage_formula_is_never_parsed() {
        let config = inter_state_config().with_slot(
            Stage::Charity,
            FormulaSlot {
                enabled: false,
                formula: "[[[ not a formula".into(),
            },
        );

        let result = compute_invoice(&config, yarn_context()).unwrap();
        assert_eq!(result.charity(), 0.0);
    }

    #[test]
    fn intra_state_split_uses_cgst_and_sgst() {
        let config = InvoiceTypeConfig::new("Yarn sale (intra-state)")
            .with_formula(Stage::Cgst, "Round([H]*[cgstper]/100, 2)")
            .with_formula(Stage::Sgst, "Round([H]*[sgstper]/100, 2)")
            .with_formula(Stage::AssessableValue, "[H]")
            .with_formula(Stage::SubTotal, "[I]+[cgstamt]+[sgstamt]")
            .with_formula(Stage::FinalValue, "[SubTotal]");

        let ctx = yarn_context().with("cgstper", 2.5).with("sgstper", 2.5);
        let result = compute_invoice(&config, ctx).unwrap();

        assert_eq!(result.get(Stage::Cgst), 33_000.0);
        assert_eq!(result.get(Stage::Sgst), 33_000.0);
        assert_eq!(result.tax_amount(), 66_000.0);
        assert_eq!(result.final_value, 1_386_000.0);
    }

    #[test]
    fn only_the_final_value_is_rounded() {
        let config = InvoiceTypeConfig::new("rounded")
            .with_formula(Stage::AssessableValue, "[H]/3")
            .with_formula(Stage::SubTotal, "[I]")
            .with_formula(Stage::FinalValue, "[SubTotal]+0.5")
            .with_rounding(RoundingPolicy::forward(0));

        let ctx = VariableContext::new().with("H", 100.0);
        let result = compute_invoice(&config, ctx).unwrap();

        assert_eq!(result.assessable_value(), 100.0 / 3.0);
        assert_eq!(result.sub_total(), 100.0 / 3.0);
        assert_eq!(result.unrounded_final_value(), 100.0 / 3.0 + 0.5);
        assert_eq!(result.final_value, 34.0);
        assert_eq!(result.round_off, None);
    }

    #[test]
    fn reverse_rounding_exposes_round_off() {
        let config = InvoiceTypeConfig::new("reverse")
            .with_formula(Stage::FinalValue, "[H]+0.25")
            .with_rounding(RoundingPolicy::reverse(0));

        let result = compute_invoice(&config, VariableContext::new().with("H", 1_000.0)).unwrap();
        assert_eq!(result.final_value, 1_000.0);
        assert_eq!(result.round_off, Some(-0.25));

        let config = config.with_rounding(
            RoundingPolicy::reverse(0).with_direction(RoundingDirection::Up),
        );
        let result = compute_invoice(&config, VariableContext::new().with("H", 1_000.0)).unwrap();
        assert_eq!(result.final_value, 1_001.0);
        assert_eq!(result.round_off, Some(0.75));
    }

    #[test]
    fn failing_stage_is_tagged_and_stops_the_pipeline() {
        let config = inter_state_config().with_formula(Stage::Charity, "[Total Kgs]*[Charity Rate]");

        let err = compute_invoice(&config, yarn_context()).unwrap_err();
        assert_eq!(
            err,
            StageComputationError::new(
                Stage::Charity,
                FormulaError::UnknownVariable("Charity Rate".into())
            )
        );
        assert_eq!(
            err.to_string(),
            "charity stage failed: unknown variable: [Charity Rate]"
        );
    }

    #[test]
    fn division_by_zero_is_not_replaced_by_zero() {
        let config = inter_state_config().with_formula(Stage::SubTotal, "[I]/([igstper]-5)");

        let err = compute_invoice(&config, yarn_context()).unwrap_err();
        assert_eq!(err.stage, Stage::SubTotal);
        assert_eq!(err.source, FormulaError::DivisionByZero);
    }

    #[test]
    fn syntax_error_surfaces_at_its_stage() {
        let config = inter_state_config().with_formula(Stage::FinalValue, "[SubTotal] +* 2");

        let err = compute_invoice(&config, yarn_context()).unwrap_err();
        assert_eq!(err.stage, Stage::FinalValue);
        assert!(err.source.is_syntax_error());
    }

    #[test]
    fn legacy_mode_zeroes_failing_stages_and_continues() {
        let config = inter_state_config()
            .with_formula(Stage::Charity, "[Total Kgs]*[Charity Rate]")
            .with_formula(Stage::SubTotal, "[I]/0")
            .with_formula(Stage::FinalValue, "[I]+[SubTotal]+[Charity]")
            .with_error_mode(ErrorMode::LegacyZero);

        let result = compute_invoice(&config, yarn_context()).unwrap();

        // Missing variable reads as 0, so charity succeeds with 0.
        assert_eq!(result.charity(), 0.0);
        assert_eq!(result.sub_total(), 0.0);
        assert_eq!(result.zeroed_stages, vec![Stage::SubTotal]);
        assert_eq!(result.final_value, 1_382_857.0);
    }

    #[test]
    fn caller_supplied_stage_outputs_are_recomputed() {
        let ctx = yarn_context().with("igstamt", 1.0).with("I", 2.0);

        let result = compute_invoice(&inter_state_config(), ctx).unwrap();
        assert_eq!(result.igst_amount(), 62_857.0);
        assert_eq!(result.assessable_value(), 1_382_857.0);
    }

    #[test]
    fn earlier_stage_cannot_read_a_later_output() {
        let config = inter_state_config().with_formula(Stage::Charity, "[I]*0.01");

        let err = compute_invoice(&config, yarn_context().with("I", 5.0)).unwrap_err();
        assert_eq!(err.stage, Stage::Charity);
        assert_eq!(err.source, FormulaError::UnknownVariable("I".into()));
    }

    #[test]
    fn pipeline_is_reusable_and_shareable_across_threads() {
        let pipeline = InvoicePipeline::new(&inter_state_config());

        std::thread::scope(|scope| {
            let handles: Vec<_> = (1..=4)
                .map(|i| {
                    let pipeline = &pipeline;
                    scope.spawn(move || {
                        let gross = 105_000.0 * f64::from(i);
                        let ctx = VariableContext::new().with("H", gross).with("igstper", 5.0);
                        pipeline.compute(ctx).map(|r| r.final_value)
                    })
                })
                .collect();

            for (i, handle) in (1..=4).zip(handles) {
                let expected = 105_000.0 * f64::from(i) + 5_000.0 * f64::from(i);
                assert_eq!(handle.join().unwrap(), Ok(expected));
            }
        });
    }

    #[test]
    fn result_serializes_with_stage_names() {
        let result = compute_invoice(&inter_state_config(), yarn_context()).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["igst"], 62_857.0);
        assert_eq!(json["assessable_value"], 1_382_857.0);
        assert_eq!(json["final_value_unrounded"], 1_382_857.0);
        assert_eq!(json["final_value"], 1_382_857.0);
        assert!(json.get("components").is_none());
        assert!(json.get("round_off").is_none());
    }

    #[test]
    fn rounded_and_unrounded_final_values_have_distinct_keys() {
        let config = InvoiceTypeConfig::new("reverse")
            .with_formula(Stage::FinalValue, "[H]+0.4")
            .with_rounding(RoundingPolicy::reverse(0));

        let result = compute_invoice(&config, VariableContext::new().with("H", 10.0)).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object["final_value_unrounded"], 10.4);
        assert_eq!(object["final_value"], 10.0);
        assert_eq!(object["round_off"], -0.4);
        assert!(object.values().all(serde_json::Value::is_number));

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "assessable_value",
                "cgst",
                "charity",
                "final_value",
                "final_value_unrounded",
                "igst",
                "round_off",
                "sgst",
                "sub_total",
            ]
        );
    }
}
