// src/handlers/work_days.rs

use axum::{
    extract::{Path, Query, State},
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
    models::work_day::{CreateWorkDayPayload, UpdateRequiredPayload, WorkDay, WorkDayRange},
};

#[utoipa::path(
    post,
    path = "/api/workdays",
    tag = "Work Days",
    request_body = CreateWorkDayPayload,
    responses(
        (status = 201, description = "Work day created", body = WorkDay),
        (status = 409, description = "A work day already exists for this date and shift")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_work_day(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreateWorkDayPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let work_day = app_state
        .work_day_service
        .create(payload.date, payload.shift_type, payload.required_employees)
        .await?;

    Ok((StatusCode::CREATED, Json(work_day)))
}

#[utoipa::path(
    get,
    path = "/api/workdays",
    tag = "Work Days",
    params(WorkDayRange),
    responses((status = 200, description = "Work days by date, day before night", body = Vec<WorkDay>)),
    security(("api_jwt" = []))
)]
pub async fn list_work_days(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(range): Query<WorkDayRange>,
) -> Result<Json<Vec<WorkDay>>, AppError> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(AppError::BadRequest("'from' must not be after 'to'".into()));
        }
    }

    Ok(Json(app_state.work_day_service.list(range.from, range.to).await?))
}

#[utoipa::path(
    get,
    path = "/api/workdays/{id}",
    tag = "Work Days",
    params(("id" = Uuid, Path, description = "Work day id")),
    responses(
        (status = 200, description = "The work day", body = WorkDay),
        (status = 404, description = "Unknown work day")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_work_day(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkDay>, AppError> {
    Ok(Json(app_state.work_day_service.get(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/workdays/{id}/required",
    tag = "Work Days",
    params(("id" = Uuid, Path, description = "Work day id")),
    request_body = UpdateRequiredPayload,
    responses(
        (status = 200, description = "Updated staffing requirement", body = WorkDay),
        (status = 404, description = "Unknown work day")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_required(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequiredPayload>,
) -> Result<Json<WorkDay>, AppError> {
    payload.validate()?;

    let work_day = app_state
        .work_day_service
        .update_required(id, payload.required_employees)
        .await?;

    Ok(Json(work_day))
}
