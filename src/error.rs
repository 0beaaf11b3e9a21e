use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GranaryError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Query cancelled")]
    Cancelled,

    #[error("Corpus unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GranaryError>;

impl GranaryError {
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        GranaryError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_record(id: impl Into<String>, reason: impl Into<String>) -> Self {
        GranaryError::InvalidRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GranaryError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            GranaryError::InvalidRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GranaryError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GranaryError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GranaryError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GranaryError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GranaryError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            GranaryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GranaryError::NotFound(_) => StatusCode::NOT_FOUND,
            GranaryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GranaryError::Timeout { .. } | GranaryError::Cancelled | GranaryError::Unavailable(_)
        )
    }
}

impl From<std::io::Error> for GranaryError {
    fn from(e: std::io::Error) -> Self {
        GranaryError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for GranaryError {
    fn from(e: serde_json::Error) -> Self {
        GranaryError::Json(e.to_string())
    }
}

// Axum IntoResponse implementation (feature-gated)
#[cfg(feature = "axum-support")]
use axum::response::{IntoResponse, Json, Response};
#[cfg(feature = "axum-support")]
use serde::Serialize;

/// Response header carrying the same id as the error body's `requestId`.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// JSON body of every error response. It is also attached to the response
/// as an extension so middleware can restamp `request_id`.
#[cfg(feature = "axum-support")]
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error: String,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(feature = "axum-support")]
impl IntoResponse for GranaryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_code, suggestion) = match &self {
            GranaryError::InvalidParameter { name, .. } => (
                "invalid_parameter",
                match name.as_str() {
                    "addedSince" | "modifiedSince" => Some(
                        "Use an RFC 3339 timestamp such as 2015-11-28T13:15:30Z or a date such as 2015-11-28"
                            .to_string(),
                    ),
                    "offset" | "rows" => {
                        Some("Use a single non-negative integer".to_string())
                    }
                    _ => None,
                },
            ),
            GranaryError::InvalidRecord { .. } => ("invalid_record", None),
            GranaryError::Io(_) => ("io_error", None),
            GranaryError::Json(_) => ("json_error", None),
            GranaryError::Config(_) => ("config_error", None),
            GranaryError::Timeout { .. } => (
                "timeout",
                Some("Retry after a short delay or narrow the query".to_string()),
            ),
            GranaryError::Cancelled => ("cancelled", None),
            GranaryError::Unavailable(_) => (
                "unavailable",
                Some("Retry after a short delay".to_string()),
            ),
            GranaryError::NotFound(_) => ("not_found", None),
            GranaryError::Internal(_) => ("internal_error", None),
        };

        let request_id = format!("req_gr_{}", uuid::Uuid::new_v4());
        let error_response = ErrorResponse {
            status: "ERROR",
            error: error_code.to_string(),
            message: self.to_string(),
            request_id: request_id.clone(),
            suggestion,
        };

        let mut response = (status, Json(error_response.clone())).into_response();
        response.extensions_mut().insert(error_response);
        if let Ok(value) = http::HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        if self.is_retryable() {
            response
                .headers_mut()
                .insert("Retry-After", http::HeaderValue::from_static("1"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            GranaryError::invalid_parameter("rows", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GranaryError::Timeout { elapsed_ms: 5 }.status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            GranaryError::Unavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GranaryError::invalid_record("a1", "duplicate id").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(GranaryError::Cancelled.is_retryable());
        assert!(GranaryError::Timeout { elapsed_ms: 1 }.is_retryable());
        assert!(!GranaryError::invalid_parameter("offset", "negative").is_retryable());
        assert!(!GranaryError::Json("eof".into()).is_retryable());
    }

    #[test]
    fn messages_name_the_parameter() {
        let e = GranaryError::invalid_parameter("addedSince", "'yesterday' is not a date");
        assert_eq!(
            e.to_string(),
            "Invalid parameter 'addedSince': 'yesterday' is not a date"
        );
    }

    #[cfg(feature = "axum-support")]
    #[test]
    fn error_body_is_attached_as_extension() {
        let response = GranaryError::Unavailable("no corpus".into()).into_response();
        let body = response.extensions().get::<ErrorResponse>().unwrap().clone();
        assert_eq!(body.error, "unavailable");
        assert_eq!(response.headers()[REQUEST_ID_HEADER], body.request_id.as_str());
        assert_eq!(response.headers()["retry-after"], "1");
    }
}
