//! Value object trait: equality by value, not identity.
//!
//! Invoice-type configuration is made of value objects: a formula slot, a
//! rounding policy or a computed result are fully described by their fields.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one with the new values.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct RoundingPolicy {
///     digits: i32,
///     mode: RoundingMode,
/// }
///
/// impl ValueObject for RoundingPolicy {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
