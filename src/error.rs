//! Error types shared by the persistence boundary and the workflow controller.
use crate::model::FieldError;
use thiserror::Error;

/// Failure reported by a [`crate::persistence::PersistenceService`] call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// A concrete field-level problem the caller should display.
    #[error("validation failed: {0}")]
    Validation(FieldError),
    /// The request itself failed.
    #[error("request failed: {0}")]
    Request(String),
    /// Validation failed and the errors are already attached to the item's
    /// fields; nothing further to show.
    #[error("validation errors already reported on the item")]
    Reported { errors: Vec<FieldError> },
}

impl ServiceError {
    pub fn has_payload(&self) -> bool {
        !matches!(self, ServiceError::Reported { .. })
    }
}

/// Errors raised by workflow operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("email delivery failed: {0}")]
    DeliveryFailed(String),
    #[error("publish menu was torn down")]
    Cancelled,
}
