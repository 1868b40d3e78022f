//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
///
/// These are the codes surfaced to transport clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidFormat,

    // State errors
    InvariantViolated,

    // Authorization errors
    Unauthorized,

    // External dependency errors
    IntentTimeout,
    LookupTimeout,
    LookupUnavailable,
    StoreUnavailable,

    // Infrastructure errors
    InternalError,
}

impl ErrorCode {
    /// Returns true if a client may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::IntentTimeout
                | ErrorCode::LookupTimeout
                | ErrorCode::LookupUnavailable
                | ErrorCode::StoreUnavailable
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::InvariantViolated => "INVARIANT_VIOLATED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::IntentTimeout => "INTENT_TIMEOUT",
            ErrorCode::LookupTimeout => "LOOKUP_TIMEOUT",
            ErrorCode::LookupUnavailable => "LOOKUP_UNAVAILABLE",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("thread_id");
        assert_eq!(format!("{}", err), "Field 'thread_id' cannot be empty");
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("slot", "unknown slot name");
        assert_eq!(
            format!("{}", err),
            "Field 'slot' has invalid format: unknown slot name"
        );
    }

    #[test]
    fn only_external_failures_are_retryable() {
        assert!(ErrorCode::IntentTimeout.is_retryable());
        assert!(ErrorCode::LookupTimeout.is_retryable());
        assert!(ErrorCode::LookupUnavailable.is_retryable());
        assert!(ErrorCode::StoreUnavailable.is_retryable());
        assert!(!ErrorCode::ValidationFailed.is_retryable());
        assert!(!ErrorCode::InvariantViolated.is_retryable());
    }
}
