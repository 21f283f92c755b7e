//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::model::ModelError;
use crate::store::StoreError;
use crate::views::ViewError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid bearer token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Login or session error
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Document could not be decoded or encoded
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Document store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ViewError> for ApiError {
    fn from(e: ViewError) -> Self {
        match e {
            ViewError::Model(e) => ApiError::Model(e),
            ViewError::Store(e) => ApiError::Store(e),
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// HTTP status and machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Auth(e) => match e {
                AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
                AuthError::SessionNotFound | AuthError::SessionExpired => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
                }
                AuthError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "AUTH_UNAVAILABLE"),
            },
            ApiError::Model(_) => (StatusCode::BAD_REQUEST, "INVALID_DOCUMENT"),
            ApiError::Store(e) => match e {
                StoreError::Conflict { .. } => (StatusCode::CONFLICT, "VERSION_CONFLICT"),
                StoreError::InvalidKey(_) => (StatusCode::BAD_REQUEST, "INVALID_KEY"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentKey;

    #[test]
    fn test_status_codes() {
        let conflict = ApiError::Store(StoreError::Conflict {
            key: DocumentKey::new("hospitalData", "status"),
            expected: 1,
            actual: 2,
        });
        assert_eq!(conflict.status_and_code(), (StatusCode::CONFLICT, "VERSION_CONFLICT"));

        let bad_login = ApiError::Auth(AuthError::InvalidCredentials);
        assert_eq!(bad_login.status_and_code().0, StatusCode::UNAUTHORIZED);

        let down = ApiError::Auth(AuthError::Unavailable("offline".to_string()));
        assert_eq!(down.status_and_code().0, StatusCode::SERVICE_UNAVAILABLE);
    }
}
