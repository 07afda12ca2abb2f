use crate::auth::models::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{extract_direct_upload, validate_content_type, validate_file_size};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use lane_core::AppError;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DirectUploadResponse {
    pub success: bool,
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

/// Receive file bytes for a previously issued upload descriptor.
///
/// Only the local backend has no external signing authority, so its uploads
/// are proxied through this route; the cloud backends reject it because
/// their clients upload straight to the bucket.
#[utoipa::path(
    post,
    path = "/api/v0/files/direct-upload",
    tag = "files",
    responses(
        (status = 201, description = "File stored", body = DirectUploadResponse),
        (status = 400, description = "Invalid multipart body", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(
        user_id = %owner.user_id,
        operation = "direct_upload"
    )
)]
pub async fn direct_upload(
    owner: OwnerContext,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (key, data, content_type) = extract_direct_upload(multipart).await?;

    validate_file_size(data.len(), state.config.max_upload_size_bytes())?;
    validate_content_type(&content_type, state.config.allowed_content_types())?;

    // Uploads may only land under the authenticated owner's prefix.
    if !key.starts_with(&format!("{}/", owner.user_id)) {
        return Err(HttpAppError::from(AppError::InvalidInput(
            "Upload key does not belong to the authenticated user".to_string(),
        )));
    }

    let size = data.len();
    let file_url = state.storage.put_object(&key, &content_type, data).await?;

    tracing::info!(
        user_id = %owner.user_id,
        key = %key,
        size_bytes = size,
        "Direct upload stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(DirectUploadResponse {
            success: true,
            file_url,
        }),
    ))
}
