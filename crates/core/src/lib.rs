//! `millerp-core`: shared domain building blocks for the mill ERP.
//!
//! Domain primitives only; nothing here does IO.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::InvoiceTypeId;
pub use value_object::ValueObject;
