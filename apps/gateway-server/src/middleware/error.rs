//! Error handling middleware - structured JSON error bodies.

use std::fmt;
use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use floodgate_core::DomainError;
use floodgate_shared::{ErrorResponse, FieldError};

/// Application-level error type. Rejections (503) are not errors and never
/// pass through here; this covers what the gateway itself refuses or fails.
#[derive(Debug)]
pub enum AppError {
    Validation(Vec<FieldError>),
    NotFound(String),
    Throttled(Duration),
    Timeout { request_id: String },
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation failed on {} field(s)", errors.len()),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Throttled(wait) => write!(f, "Throttled, retry in {:?}", wait),
            AppError::Timeout { request_id } => write!(f, "Request {} timed out", request_id),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Throttled(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        let error = match self {
            AppError::Validation(errors) => ErrorResponse::validation(errors.clone()),
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::Throttled(wait) => {
                // Round up so clients never retry early
                let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
                builder.insert_header(("Retry-After", secs.to_string()));
                ErrorResponse::throttled(secs)
            }
            AppError::Timeout { request_id } => {
                ErrorResponse::request_timeout().with_request_id(request_id)
            }
            AppError::Internal(_) => ErrorResponse::internal_error(),
        };

        builder.json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidClientId(id) => AppError::Validation(vec![FieldError::new(
                "clientId",
                format!("invalid client id: {id}"),
            )]),
            DomainError::Validation(errors) => AppError::Validation(errors),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
