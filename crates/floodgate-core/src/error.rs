//! Domain-level error types.

use floodgate_shared::FieldError;
use thiserror::Error;

/// Domain errors - admission logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid client id: {0}")]
    InvalidClientId(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
}
