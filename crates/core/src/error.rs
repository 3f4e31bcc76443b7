//! Domain error model.

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Category of a single input violation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required field was absent.
    Required,
    /// The value had the wrong JSON type.
    Type,
    /// A string was shorter or longer than allowed.
    Length,
    /// A number was outside its allowed range.
    Range,
    /// A decimal carried more fractional digits than allowed.
    Precision,
    /// The payload carried a key the schema does not know.
    UnknownField,
    /// A partial update carried no updatable field at all.
    NoFields,
    /// The value collides with an existing row (unique constraint).
    Duplicate,
}

/// One violation reported by input validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Storage
/// failures are classified by the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed validation. `details` lists every violation found.
    #[error("{message}")]
    InvalidInput {
        message: String,
        details: Vec<FieldViolation>,
    },

    /// A requested resource does not exist (or is logically deleted).
    #[error("{0}")]
    NotFound(String),

    /// The shared secret was missing or wrong.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn invalid_input(message: impl Into<String>, details: Vec<FieldViolation>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Violations attached to an `InvalidInput`; empty for other kinds.
    pub fn details(&self) -> &[FieldViolation] {
        match self {
            DomainError::InvalidInput { details, .. } => details,
            _ => &[],
        }
    }
}
