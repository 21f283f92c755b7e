//! Document Routes
//!
//! Raw access to any document in the store.
//!
//! - GET /api/v1/documents/:collection/:id - Current snapshot
//! - PUT /api/v1/documents/:collection/:id - Full overwrite

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{DocumentResponse, WriteDocumentRequest};
use crate::api::error::ApiResult;
use crate::api::extract::Authenticated;
use crate::api::state::AppState;
use crate::store::{DocumentKey, DocumentWrite, Precondition};

/// GET /api/v1/documents/:collection/:id
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    _auth: Authenticated,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Json<DocumentResponse>> {
    let key = DocumentKey::new(collection, id);
    let snapshot = state.store.get(&key).await?;
    Ok(Json(DocumentResponse::from(snapshot)))
}

/// PUT /api/v1/documents/:collection/:id
pub async fn put_document(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Path((collection, id)): Path<(String, String)>,
    Json(req): Json<WriteDocumentRequest>,
) -> ApiResult<Json<DocumentResponse>> {
    let key = DocumentKey::new(collection, id);

    let write = DocumentWrite {
        data: req.data,
        server_timestamps: req.server_timestamps,
        precondition: req
            .if_version
            .map_or(Precondition::None, Precondition::Version),
    };

    let snapshot = state.store.set(&key, write).await?;
    tracing::debug!(user = %auth.user.email, document = %key, version = snapshot.version, "Document written");

    Ok(Json(DocumentResponse::from(snapshot)))
}
