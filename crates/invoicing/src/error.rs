//! Pipeline errors.

use thiserror::Error;

use millerp_core::DomainError;
use millerp_formula::FormulaError;

use crate::stage::Stage;

/// A formula failed while computing one stage of an invoice.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{stage} stage failed: {source}")]
pub struct StageComputationError {
    pub stage: Stage,
    #[source]
    pub source: FormulaError,
}

impl StageComputationError {
    pub fn new(stage: Stage, source: FormulaError) -> Self {
        Self { stage, source }
    }
}

impl From<StageComputationError> for DomainError {
    fn from(err: StageComputationError) -> Self {
        DomainError::validation(err.to_string())
    }
}
