//! Error types for the biblioteca core

use thiserror::Error;

use crate::store::StoreError;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    /// The human-readable message carried by the error, without the class
    /// prefix. This is what the notifier surfaces to the user.
    pub fn message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::BusinessRule(msg) => msg.clone(),
            AppError::Store(e) => e.to_string(),
        }
    }

    /// Prepend the failing operation to the message, keeping the error class
    pub fn context(self, op: &str) -> Self {
        match self {
            AppError::Validation(msg) => AppError::Validation(format!("{}: {}", op, msg)),
            AppError::NotFound(msg) => AppError::NotFound(format!("{}: {}", op, msg)),
            AppError::Conflict(msg) => AppError::Conflict(format!("{}: {}", op, msg)),
            AppError::BusinessRule(msg) => AppError::BusinessRule(format!("{}: {}", op, msg)),
            AppError::Store(e) => {
                AppError::Store(StoreError::Backend(format!("{}: {}", op, e)))
            }
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
