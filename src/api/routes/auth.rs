//! Auth Routes
//!
//! - POST /api/v1/auth/login - Exchange credentials for a bearer token
//! - POST /api/v1/auth/logout - End the current session
//! - GET /api/v1/auth/me - The logged-in user

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{LoginRequest, LoginResponse, UserResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{Authenticated, BearerToken};
use crate::api::state::AppState;
use crate::views::{self, LogoutOutcome};

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let session = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse::from(session)))
}

/// POST /api/v1/auth/logout
///
/// Always answers with the notification to show; the status code tells
/// whether the client should follow the redirect. A token whose session is
/// already gone still signs out, so a stale client can always leave.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> (StatusCode, Json<LogoutOutcome>) {
    let outcome = views::logout(state.auth.as_ref(), &token).await;

    let status = if outcome.succeeded() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(outcome))
}

/// GET /api/v1/auth/me
pub async fn me(auth: Authenticated) -> Json<UserResponse> {
    Json(UserResponse::from(&auth.user))
}
