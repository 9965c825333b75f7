//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use docvault_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Human-readable error, e.g. `"Folder not found"`.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
}

/// An `AppError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// The status code and machine code for the error kind.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self.0.kind {
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::InvalidPath => (StatusCode::BAD_REQUEST, "INVALID_PATH"),
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::Expired => (StatusCode::GONE, "EXPIRED"),
            ErrorKind::InvalidPassword => (StatusCode::UNAUTHORIZED, "INVALID_PASSWORD"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::Serialization => (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR"),
            ErrorKind::CycleDetected
            | ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let message = match self.0.kind {
            ErrorKind::Authorization => {
                debug!(reason = %self.0.message, "Request denied");
                "Unauthorized".to_string()
            }
            _ if status.is_server_error() => {
                error!(kind = %self.0.kind, error = %self.0, "Internal server error");
                "Internal server error".to_string()
            }
            _ => self.0.message,
        };

        let body = ApiErrorResponse {
            error: message,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::not_found("Folder not found"), StatusCode::NOT_FOUND),
            (AppError::authorization("Unauthorized"), StatusCode::FORBIDDEN),
            (AppError::invalid_path("bad"), StatusCode::BAD_REQUEST),
            (AppError::expired("old"), StatusCode::GONE),
            (AppError::invalid_password("no"), StatusCode::UNAUTHORIZED),
            (AppError::conflict("dup"), StatusCode::CONFLICT),
            (AppError::cycle_detected("loop"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status().0, expected);
        }
    }

    #[test]
    fn test_denials_hide_details() {
        let response = ApiError(AppError::authorization("Missing capability 'x'")).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
