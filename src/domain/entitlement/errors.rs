//! Entitlement-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidProductType | 400 |
//! | InvalidStatus | 400 |
//! | ValidationFailed | 400 |
//! | NotFound | 404 |
//! | Timeout | 500 |
//! | Persistence | 500 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, UserId, ValidationError};

/// Errors raised by entitlement policy and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntitlementError {
    /// Product type string is not one of the known billing types.
    #[error("Invalid product type: {0}")]
    InvalidProductType(String),

    /// Status string is not one of the known statuses.
    #[error("Invalid entitlement status: {0}")]
    InvalidStatus(String),

    /// No entitlement exists for this user.
    #[error("No entitlement found for user: {0}")]
    NotFound(UserId),

    /// Input failed validation.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// A persistence call did not complete in time.
    #[error("Operation timed out after {0}s")]
    Timeout(u64),

    /// Storage layer failure.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl EntitlementError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EntitlementError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        EntitlementError::Persistence(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EntitlementError::InvalidProductType(_) => ErrorCode::InvalidProductType,
            EntitlementError::InvalidStatus(_) => ErrorCode::InvalidStatus,
            EntitlementError::NotFound(_) => ErrorCode::EntitlementNotFound,
            EntitlementError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            EntitlementError::Timeout(_) => ErrorCode::Timeout,
            EntitlementError::Persistence(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns true if a redelivery of the same input could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EntitlementError::Timeout(_) | EntitlementError::Persistence(_)
        )
    }
}

impl From<DomainError> for EntitlementError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidProductType => EntitlementError::InvalidProductType(err.message),
            ErrorCode::InvalidStatus => EntitlementError::InvalidStatus(err.message),
            ErrorCode::ValidationFailed => EntitlementError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => EntitlementError::Persistence(err.to_string()),
        }
    }
}

impl From<ValidationError> for EntitlementError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => {
                EntitlementError::validation(field, "must not be empty")
            }
            ValidationError::InvalidFormat { field, reason } => {
                EntitlementError::validation(field, reason)
            }
        }
    }
}

impl From<EntitlementError> for DomainError {
    fn from(err: EntitlementError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
