use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderValue},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::{error::AppError, state::AppState};

/// Header carrying the raw token (no `Bearer` scheme).
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Resolve the caller's identity from the token header, if any.
pub fn resolve_identity(keys: &JwtKeys, header: Option<&HeaderValue>) -> Result<Uuid, AppError> {
    let token = header
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthenticated)?;

    keys.verify(token).map(|claims| claims.sub).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::InvalidToken
    })
}

/// Verified user ID of the request; rejects before the handler runs.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_identity(&state.keys, parts.headers.get(TOKEN_HEADER)).map(AuthUser)
    }
}
