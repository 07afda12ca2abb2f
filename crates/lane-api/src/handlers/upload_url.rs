use crate::auth::models::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::validate_content_type;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use lane_storage::UploadOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct UploadUrlQuery {
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadUrlResponse {
    /// URL the client uploads the file bytes to
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
    /// Form fields the client must include with the upload
    pub fields: HashMap<String, String>,
    /// Public URL the file will be reachable at once uploaded
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

/// Issue an upload descriptor for the authenticated owner.
///
/// The client uploads directly to the returned URL; for the cloud backends
/// the bytes never transit this server.
#[utoipa::path(
    get,
    path = "/api/v0/files/upload-url",
    tag = "files",
    params(
        ("content_type" = Option<String>, Query, description = "Expected content type of the upload")
    ),
    responses(
        (status = 200, description = "Upload descriptor issued", body = UploadUrlResponse),
        (status = 400, description = "Invalid content type", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, query),
    fields(
        user_id = %owner.user_id,
        operation = "get_upload_url"
    )
)]
pub async fn get_upload_url(
    owner: OwnerContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadUrlQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    if let Some(ref content_type) = query.content_type {
        validate_content_type(content_type, state.config.allowed_content_types())?;
    }

    let options = UploadOptions {
        content_type: query.content_type,
    };

    let descriptor = state.storage.issue_upload(owner.user_id, &options).await?;

    tracing::info!(
        user_id = %owner.user_id,
        key = %descriptor.key,
        "Issued upload descriptor"
    );

    Ok(Json(UploadUrlResponse {
        upload_url: descriptor.upload_url,
        fields: descriptor.fields,
        file_url: descriptor.file_url,
    }))
}
