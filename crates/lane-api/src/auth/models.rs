use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
///
/// Tokens are issued by the account service; this API only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid, // user_id
    pub exp: i64,  // expiration timestamp
    pub iat: i64,  // issued at timestamp
}

/// Authenticated owner extracted from the bearer token and stored in request
/// extensions. The storage layer trusts this value; it is never read from a
/// request body.
#[derive(Debug, Clone, Copy)]
pub struct OwnerContext {
    pub user_id: Uuid,
}

// Implement FromRequestParts for OwnerContext to work with Multipart.
// Extension cannot be used with Multipart, so we extract directly from
// request parts.
impl<S> FromRequestParts<S> for OwnerContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OwnerContext>()
            .copied()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Missing owner context".to_string(),
                        details: None,
                        error_type: None,
                        code: "MISSING_OWNER_CONTEXT".to_string(),
                        recoverable: false,
                    }),
                )
            })
    }
}
