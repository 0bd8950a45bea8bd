// src/handlers/nurses.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::nurse::{CreateNursePayload, Nurse, UpdateNursePayload},
};

#[utoipa::path(
    post,
    path = "/api/nurses",
    tag = "Nurses",
    request_body = CreateNursePayload,
    responses(
        (status = 201, description = "Nurse registered with zero weekly hours", body = Nurse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "E-mail already registered")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_nurse(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreateNursePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let nurse = app_state.nurse_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(nurse)))
}

#[utoipa::path(
    get,
    path = "/api/nurses",
    tag = "Nurses",
    responses((status = 200, description = "All nurses, by name", body = Vec<Nurse>)),
    security(("api_jwt" = []))
)]
pub async fn list_nurses(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Nurse>>, AppError> {
    Ok(Json(app_state.nurse_service.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/nurses/{id}",
    tag = "Nurses",
    params(("id" = Uuid, Path, description = "Nurse id")),
    responses(
        (status = 200, description = "The nurse", body = Nurse),
        (status = 404, description = "Unknown nurse")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_nurse(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Nurse>, AppError> {
    Ok(Json(app_state.nurse_service.get(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/nurses/{id}",
    tag = "Nurses",
    params(("id" = Uuid, Path, description = "Nurse id")),
    request_body = UpdateNursePayload,
    responses(
        (status = 200, description = "Updated profile", body = Nurse),
        (status = 404, description = "Unknown nurse"),
        (status = 409, description = "E-mail already registered")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_nurse(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNursePayload>,
) -> Result<Json<Nurse>, AppError> {
    payload.validate()?;

    Ok(Json(app_state.nurse_service.update(id, &payload).await?))
}
