//! Route setup: public routes plus the authenticated /api/v0 surface.

use crate::api_doc::get_openapi_spec;
use crate::auth::middleware::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Extra room on top of the file-size limit for multipart framing.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(get_openapi_spec())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the application router around the shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let files = Router::new()
        .route("/files/upload-url", get(handlers::upload_url::get_upload_url))
        .route("/files/delete", post(handlers::file_delete::delete_files))
        .route(
            "/files/direct-upload",
            post(handlers::direct_upload::direct_upload),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/v0", files)
        .route("/media/{*key}", get(handlers::file_serve::serve_file))
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_spec))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_size_bytes() + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(state.config.cors_origins()))
        .with_state(state)
}
