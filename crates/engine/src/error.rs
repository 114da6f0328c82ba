use thiserror::Error;

use deadsync_common::error::AppError;

use crate::store::StoreError;

/// Errors that abort a dispatch. Channel failures are never errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed request, raised before any record is created.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The pending record could not be created; no channel was attempted.
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// The dispatch task itself panicked after the record was created.
    #[error("Dispatch aborted: {0}")]
    Aborted(String),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Validation(msg) => AppError::Validation(msg),
            DispatchError::Store(e) => AppError::StoreWrite(e.to_string()),
            DispatchError::Aborted(msg) => AppError::Internal(msg),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => AppError::Database(e),
            StoreError::NotFound(id) => AppError::NotFound(format!("Notification {} not found", id)),
            other => AppError::StoreWrite(other.to_string()),
        }
    }
}
