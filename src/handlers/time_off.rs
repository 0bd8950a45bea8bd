// src/handlers/time_off.rs

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
    models::time_off::{DecideTimeOffPayload, SubmitTimeOffPayload, TimeOffFilter, TimeOffRequest},
};

// Nurses file for themselves; an admin must name the nurse.
#[utoipa::path(
    post,
    path = "/api/time-off",
    tag = "Time Off",
    request_body = SubmitTimeOffPayload,
    responses(
        (status = 201, description = "Pending request filed", body = TimeOffRequest),
        (status = 403, description = "A nurse filing for someone else"),
        (status = 409, description = "An open request already exists for this date")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(payload): Json<SubmitTimeOffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let nurse_id = match (principal.is_admin(), payload.nurse_id) {
        (true, Some(nurse_id)) => nurse_id,
        (true, None) => {
            return Err(AppError::BadRequest(
                "nurseId is required when an admin files a request".into(),
            ));
        }
        (false, Some(nurse_id)) if nurse_id != principal.id => return Err(AppError::Forbidden),
        (false, _) => principal.id,
    };

    let request = app_state.time_off_service.submit(nurse_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/time-off",
    tag = "Time Off",
    params(TimeOffFilter),
    responses((status = 200, description = "Requests by date", body = Vec<TimeOffRequest>)),
    security(("api_jwt" = []))
)]
pub async fn list(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(mut filter): Query<TimeOffFilter>,
) -> Result<Json<Vec<TimeOffRequest>>, AppError> {
    // Nurses only ever see their own requests
    if !principal.is_admin() {
        filter.nurse_id = Some(principal.id);
    }

    Ok(Json(app_state.time_off_service.list(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/time-off/{id}",
    tag = "Time Off",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "The request", body = TimeOffRequest),
        (status = 404, description = "Unknown request")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TimeOffRequest>, AppError> {
    let request = app_state.time_off_service.get(id).await?;
    if !principal.is_admin() && request.nurse_id != principal.id {
        return Err(AppError::NotFound(format!("Time-off request {}", id)));
    }

    Ok(Json(request))
}

#[utoipa::path(
    put,
    path = "/api/time-off/{id}/decision",
    tag = "Time Off",
    params(("id" = Uuid, Path, description = "Request id")),
    request_body = DecideTimeOffPayload,
    responses(
        (status = 200, description = "Request approved or denied", body = TimeOffRequest),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Request was already decided")
    ),
    security(("api_jwt" = []))
)]
pub async fn decide(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecideTimeOffPayload>,
) -> Result<Json<TimeOffRequest>, AppError> {
    let request = app_state
        .time_off_service
        .decide(id, payload.decision, admin.id)
        .await?;

    Ok(Json(request))
}
