//! Status Routes
//!
//! - GET /api/v1/status - Status document with dashboard metrics
//! - PUT /api/v1/status - Replace the status document from form values

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{StatusResponse, UpdateStatusRequest, UpdateStatusResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::Authenticated;
use crate::api::state::AppState;
use crate::model::HospitalStatus;
use crate::store::Precondition;
use crate::views::{status_key, submit_notification, write_status, ConflictPolicy, DashboardState};

/// GET /api/v1/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    _auth: Authenticated,
) -> ApiResult<Json<StatusResponse>> {
    let snapshot = state.store.get(&status_key()).await?;

    let status = snapshot
        .data
        .as_ref()
        .map(HospitalStatus::from_document)
        .transpose()?;

    let metrics = DashboardState {
        status: status.clone(),
        loading: false,
    }
    .metrics();

    Ok(Json(StatusResponse {
        exists: status.is_some(),
        version: snapshot.version,
        status: status.unwrap_or_default(),
        metrics,
    }))
}

/// PUT /api/v1/status
///
/// Same write as the Resources view submit. Failures still carry the
/// notification to show.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<(StatusCode, Json<UpdateStatusResponse>)> {
    let precondition = match (req.if_version, state.conflict_policy) {
        (Some(version), _) => Precondition::Version(version),
        (None, ConflictPolicy::LastWriteWins) => Precondition::None,
        (None, ConflictPolicy::RejectStale) => {
            return Err(ApiError::Validation(
                "ifVersion is required when stale writes are rejected".to_string(),
            ))
        }
    };

    let result = write_status(state.store.as_ref(), &req.form, precondition).await;
    let notification = submit_notification(&result);

    match result {
        Ok(snapshot) => {
            tracing::info!(user = %auth.user.email, version = snapshot.version, "Status updated over HTTP");
            Ok((
                StatusCode::OK,
                Json(UpdateStatusResponse {
                    notification,
                    version: Some(snapshot.version),
                }),
            ))
        }
        Err(e) => {
            let (status, _) = ApiError::from(e).status_and_code();
            Ok((
                status,
                Json(UpdateStatusResponse {
                    notification,
                    version: None,
                }),
            ))
        }
    }
}
