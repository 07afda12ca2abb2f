use crate::auth::models::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use lane_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const MAX_BATCH_SIZE: usize = 50;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteFilesRequest {
    #[serde(rename = "fileUrls")]
    pub file_urls: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteFilesResponse {
    pub success: bool,
    #[serde(rename = "deletedKeys")]
    pub deleted_keys: Vec<String>,
}

/// Delete a batch of stored files by their public URLs.
///
/// Best-effort and partial-failure tolerant: every URL is attempted
/// regardless of earlier failures, and one bad URL never blocks the rest.
/// Callers that delete the owning record deliberately ignore storage
/// failures; losing a blob must never block deleting the record.
#[utoipa::path(
    post,
    path = "/api/v0/files/delete",
    tag = "files",
    request_body = DeleteFilesRequest,
    responses(
        (status = 200, description = "Deletion attempted for every URL", body = DeleteFilesResponse),
        (status = 400, description = "Missing or empty fileUrls", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, body),
    fields(
        user_id = %owner.user_id,
        operation = "delete_files"
    )
)]
pub async fn delete_files(
    owner: OwnerContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<DeleteFilesRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    // An empty list is a client bug, not a no-op; reject it before any
    // provider call.
    if body.file_urls.is_empty() {
        return Err(HttpAppError::from(AppError::InvalidInput(
            "fileUrls must be a non-empty array".to_string(),
        )));
    }
    if body.file_urls.len() > MAX_BATCH_SIZE {
        return Err(HttpAppError::from(AppError::BadRequest(format!(
            "Batch size exceeds maximum of {}",
            MAX_BATCH_SIZE
        ))));
    }

    let mut deleted_keys = Vec::with_capacity(body.file_urls.len());
    for url in &body.file_urls {
        match state.storage.extract_key(url) {
            Ok(key) => deleted_keys.push(key),
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "Delete requested for unmappable URL");
            }
        }
    }

    let failures = state.storage.delete_objects(&body.file_urls).await;
    if failures > 0 {
        tracing::warn!(
            user_id = %owner.user_id,
            attempted = body.file_urls.len(),
            failures = failures,
            "Batch deletion completed with failures"
        );
    } else {
        tracing::info!(
            user_id = %owner.user_id,
            attempted = body.file_urls.len(),
            "Batch deletion completed"
        );
    }

    Ok(Json(DeleteFilesResponse {
        success: true,
        deleted_keys,
    }))
}
