// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{common::error::AppError, config::AppState, models::auth::Principal};

// The guard itself: resolves the bearer token and stores the principal in the
// request extensions for the extractors below.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    let principal = app_state
        .auth_service
        .validate_token(bearer.token())
        .await?;

    tracing::debug!(id = %principal.id, role = ?principal.role, "Authenticated request");
    request.extensions_mut().insert(AuthenticatedUser(principal));
    Ok(next.run(request).await)
}

/// Any caller that passed `auth_guard`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

/// Same as `AuthenticatedUser`, but nurses are turned away with 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(principal) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            tracing::warn!(id = %principal.id, path = %parts.uri.path(), "Nurse denied admin route");
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(principal))
    }
}
