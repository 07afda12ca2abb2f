use crate::auth::models::{JwtClaims, OwnerContext};
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use lane_core::AppError;
use std::sync::Arc;

/// Verify the bearer token and install `OwnerContext` in request extensions.
///
/// Token issuance lives in the account service; this middleware only checks
/// the HS256 signature and expiry and surfaces the owner id to handlers.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    let decoding_key = DecodingKey::from_secret(state.config.jwt_secret().as_bytes());
    let claims = match decode::<JwtClaims>(token, &decoding_key, &Validation::new(Algorithm::HS256))
    {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!(error = %e, "Token verification failed");
            return HttpAppError(AppError::Unauthorized("Invalid token".to_string()))
                .into_response();
        }
    };

    request.extensions_mut().insert(OwnerContext {
        user_id: claims.sub,
    });
    next.run(request).await
}
