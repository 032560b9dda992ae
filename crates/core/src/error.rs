//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Formula and pipeline failures have their own error types; they convert
/// into this one where a caller only cares that configuration or input was
/// rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Rejected input or configuration (malformed JSON, a formula that does
    /// not compile, a non-finite transaction value).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier did not parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A value written twice where only one write is allowed.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = DomainError::validation("charity formula is malformed");
        assert_eq!(err.to_string(), "validation failed: charity formula is malformed");

        let err = DomainError::conflict("variable [H] is already defined");
        assert_eq!(err.to_string(), "conflict: variable [H] is already defined");
    }
}
