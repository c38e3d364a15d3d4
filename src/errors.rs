use sea_orm::error::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Errors produced by the domain services.
///
/// Validation failures are rejected defensively even when a well-behaved
/// caller (the UI disabling an action) would never trigger them.
#[derive(Error, Debug, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = ServiceError::NotFound("Order 42 not found".to_string());
        assert_eq!(err.to_string(), "Not found: Order 42 not found");

        let err = ServiceError::InvalidStatus("Refunded".to_string());
        assert_eq!(err.to_string(), "Invalid status: Refunded");
    }
}
