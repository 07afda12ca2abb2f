//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Memory Lane Storage API",
        version = "0.1.0",
        description = "Upload-descriptor issuance and file deletion across pluggable storage backends (local filesystem, S3-compatible, GCS). All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::upload_url::get_upload_url,
        handlers::direct_upload::direct_upload,
        handlers::file_delete::delete_files,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        handlers::upload_url::UploadUrlResponse,
        handlers::direct_upload::DirectUploadResponse,
        handlers::file_delete::DeleteFilesRequest,
        handlers::file_delete::DeleteFilesResponse,
    )),
    tags(
        (name = "files", description = "Upload descriptors and file lifecycle")
    )
)]
pub struct ApiDoc;

/// Returns the OpenAPI spec served at /api-docs/openapi.json.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
