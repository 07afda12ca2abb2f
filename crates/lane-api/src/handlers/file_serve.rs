//! Public file route for the local storage backend.
//!
//! Cloud backends serve objects from the bucket or CDN directly; this route
//! only exists so locally stored files are reachable at their public URL.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use lane_core::AppError;
use std::sync::Arc;

/// Map a stored key's extension to the served content type.
fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Serve a stored file by key. Public; keys are unguessable and the URLs are
/// deliberately shareable.
#[tracing::instrument(skip(state), fields(operation = "serve_file"))]
pub async fn serve_file(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let data = state.storage.download(&key).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&key))
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(data))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_maps_to_content_type() {
        assert_eq!(content_type_for("a/b.jpg"), "image/jpeg");
        assert_eq!(content_type_for("a/b.png"), "image/png");
        assert_eq!(content_type_for("a/b"), "application/octet-stream");
        assert_eq!(content_type_for("a/b.bin"), "application/octet-stream");
    }
}
