use thiserror::Error;
use uuid::Uuid;

use crate::features::tickets::models::TicketStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The requested status change is not in the transition table.
    #[error("Illegal transition: {from} -> {to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    /// A transition guard needs an artifact (e.g. an after-photo) that does not exist.
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// Raised at commit time when another dispatch filled the technician first.
    #[error("Technician {technician_id} is at capacity")]
    CapacityExceeded { technician_id: Uuid },

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures the caller may retry after re-reading state.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Conflict(_) | AppError::CapacityExceeded { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
