//! Service error taxonomy

use crate::models::ValidationError;

/// Errors returned by every content service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input rejected; the message is safe to show to the caller
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Storage failure; details are logged, not returned
    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err.0)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
