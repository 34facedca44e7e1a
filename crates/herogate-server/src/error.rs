//! Client-facing error type for the HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A classified, expected failure surfaced to the client, as opposed to an
/// unexpected defect.
///
/// Operational errors carry a message safe to show; non-operational ones are
/// logged in full and collapsed to a generic 500 so no internal detail
/// leaks.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    operational: bool,
}

impl ApiError {
    /// 404: the requested hero does not exist upstream.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            operational: true,
        }
    }

    /// 503: the upstream is unavailable or retries are exhausted.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
            operational: true,
        }
    }

    /// 500: an unclassified defect; the message is logged, never surfaced.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            operational: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if !self.operational {
            tracing::error!(status = %self.status, message = %self.message, "unexpected error");
            let body = json!({"status": "error", "message": "Internal Server Error"});
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }

        let body = json!({"status": "error", "message": self.message});
        (self.status, Json(body)).into_response()
    }
}
