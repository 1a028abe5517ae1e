//! Structured error bodies (RFC 7807 problem details plus a stable `code`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Machine-readable error code. Clients branch on this, never on `detail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    SysOverload,
    RateLimit,
    Maintenance,
    ValidationError,
    RequestTimeout,
    InternalError,
    Throttled,
    NotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SysOverload => "SYS_OVERLOAD",
            ErrorCode::RateLimit => "RATE_LIMIT",
            ErrorCode::Maintenance => "MAINTENANCE",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::RequestTimeout => "REQUEST_TIMEOUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::Throttled => "THROTTLED",
            ErrorCode::NotFound => "NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown error code: {0}")]
pub struct UnknownErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = match s {
            "SYS_OVERLOAD" => ErrorCode::SysOverload,
            "RATE_LIMIT" => ErrorCode::RateLimit,
            "MAINTENANCE" => ErrorCode::Maintenance,
            "VALIDATION_ERROR" => ErrorCode::ValidationError,
            "REQUEST_TIMEOUT" => ErrorCode::RequestTimeout,
            "INTERNAL_ERROR" => ErrorCode::InternalError,
            "THROTTLED" => ErrorCode::Throttled,
            "NOT_FOUND" => ErrorCode::NotFound,
            other => return Err(UnknownErrorCode(other.to_string())),
        };
        Ok(code)
    }
}

/// One invalid input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Problem details body returned for every non-2xx response.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type.
    pub title: String,

    /// The HTTP status code.
    pub status: u16,

    /// Stable machine-readable code.
    pub code: ErrorCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Seconds the client should wait before retrying.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(status: u16, code: ErrorCode, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            code,
            detail: None,
            request_id: None,
            retry_after: None,
            errors: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }

    pub fn service_unavailable(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::new(503, code, "Service Unavailable").with_detail(detail)
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::new(400, ErrorCode::ValidationError, "Bad Request")
            .with_detail("Request validation failed")
            .with_errors(errors)
    }

    pub fn request_timeout() -> Self {
        Self::new(408, ErrorCode::RequestTimeout, "Request Timeout")
    }

    pub fn throttled(retry_after: u64) -> Self {
        Self::new(429, ErrorCode::Throttled, "Too Many Requests").with_retry_after(retry_after)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, ErrorCode::NotFound, "Not Found").with_detail(detail)
    }

    pub fn internal_error() -> Self {
        Self::new(500, ErrorCode::InternalError, "Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_serializes_screaming_snake() {
        let body = ErrorResponse::service_unavailable(ErrorCode::SysOverload, "busy")
            .with_retry_after(30)
            .with_request_id("req-1");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["code"], "SYS_OVERLOAD");
        assert_eq!(json["status"], 503);
        assert_eq!(json["retryAfter"], 30);
        assert_eq!(json["requestId"], "req-1");
        assert_eq!(json["type"], "about:blank");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_code_round_trips_through_str() {
        for code in [
            ErrorCode::SysOverload,
            ErrorCode::RateLimit,
            ErrorCode::ValidationError,
            ErrorCode::RequestTimeout,
            ErrorCode::InternalError,
        ] {
            assert_eq!(code.as_str().parse::<ErrorCode>().unwrap(), code);
        }
        assert!("NOPE".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn test_validation_body_lists_fields() {
        let body = ErrorResponse::validation(vec![FieldError::new("load", "must be within [0, 1]")]);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["errors"][0]["field"], "load");
    }
}
