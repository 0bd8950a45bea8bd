// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::auth::{Admin, AuthResponse, CreateAdminPayload, LoginPayload, Principal},
};

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Bearer token for the admin or nurse", body = AuthResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Wrong credentials")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Auth",
    responses(
        (status = 200, description = "The caller behind the token", body = Principal),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(principal): AuthenticatedUser) -> Json<Principal> {
    Json(principal)
}

#[utoipa::path(
    post,
    path = "/api/admins",
    tag = "Auth",
    request_body = CreateAdminPayload,
    responses(
        (status = 201, description = "Admin created", body = Admin),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Username already taken")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_admin(
    State(app_state): State<AppState>,
    AdminUser(caller): AdminUser,
    Json(payload): Json<CreateAdminPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let admin = app_state.auth_service.create_admin(&payload).await?;
    tracing::info!(created_by = %caller.id, admin_id = %admin.id, "Admin account added");

    Ok((StatusCode::CREATED, Json(admin)))
}
