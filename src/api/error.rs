// ==========================================
// Delivery Route Back Office - API layer error types
// ==========================================
// Role: convert repository errors into caller-facing errors
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API layer errors
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== Caller errors =====
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("business rule violated: {0}")]
    BusinessRuleViolation(String),

    #[error("invalid state transition: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ===== Infrastructure errors =====
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{entity} {id}"))
            }
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result alias for the API layer
pub type ApiResult<T> = Result<T, ApiError>;
