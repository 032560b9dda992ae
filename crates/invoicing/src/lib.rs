//! Invoice calculation pipeline.
//!
//! Each invoice type is a stored configuration of formulas (charity, tax,
//! assessable value, sub-total, final value). This crate runs those formulas
//! in a fixed order against one transaction's values, chaining each result
//! into the next, and applies the rounding policy to the final value.
//!
//! Pure domain logic: no IO, no HTTP, no storage.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod result;
pub mod rounding;
pub mod stage;
pub mod transaction;

pub use config::{ErrorMode, FormulaSlot, InvoiceTypeConfig};
pub use error::StageComputationError;
pub use pipeline::{InvoicePipeline, compute_invoice};
pub use result::{ComputationResult, StageValues};
pub use rounding::{Rounded, RoundingDirection, RoundingMode, RoundingPolicy, apply_rounding};
pub use stage::{GROSS_AMOUNT_VAR, Stage};
pub use transaction::TransactionLine;
