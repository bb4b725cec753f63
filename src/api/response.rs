//! JSON envelope shared by every `/api/v1` endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Current time as RFC 3339 UTC.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Always true.
    pub success: bool,
    /// Response time.
    pub timestamp: String,
    /// Payload.
    pub data: T,
    /// Human-readable summary.
    pub message: String,
}

/// Wrap `data` in a success envelope.
pub fn ok<T: Serialize>(data: T, message: impl Into<String>) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        timestamp: timestamp(),
        data,
        message: message.into(),
    })
}

/// Error details inside a failure envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    timestamp: String,
    error: ErrorBody,
}

/// Error returned by API handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status.
    pub status: StatusCode,
    /// Error body.
    pub body: ErrorBody,
}

impl ApiError {
    /// Create an error with the given status and code.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    /// 400 with the given code.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// 404 with the given code.
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            success: false,
            timestamp: timestamp(),
            error: self.body,
        };
        (self.status, Json(body)).into_response()
    }
}
