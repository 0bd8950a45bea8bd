// src/handlers/schedule.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::{
        assignment::{
            AssignedNurses, CoverageSummary, NurseWeekResponse, PublishSchedulePayload,
            PublishScheduleResponse,
        },
        work_day::SlotQuery,
    },
};

#[utoipa::path(
    get,
    path = "/api/schedule",
    tag = "Schedule",
    params(SlotQuery),
    responses((status = 200, description = "Nurses assigned or called in", body = AssignedNurses)),
    security(("api_jwt" = []))
)]
pub async fn list_assigned(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(slot): Query<SlotQuery>,
) -> Result<Json<AssignedNurses>, AppError> {
    let assigned_nurses = app_state
        .coverage_service
        .list_assigned(slot.date, slot.shift_type)
        .await?;

    Ok(Json(AssignedNurses { assigned_nurses }))
}

#[utoipa::path(
    get,
    path = "/api/schedule/{nurseId}/{startDate}",
    tag = "Schedule",
    params(
        ("nurseId" = Uuid, Path, description = "Nurse id"),
        ("startDate" = NaiveDate, Path, description = "First day of the seven-day window")
    ),
    responses(
        (status = 200, description = "Active shifts in the window", body = NurseWeekResponse),
        (status = 404, description = "Unknown nurse")
    ),
    security(("api_jwt" = []))
)]
pub async fn nurse_week(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path((nurse_id, start_date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<NurseWeekResponse>, AppError> {
    let data = app_state
        .coverage_service
        .nurse_week(nurse_id, start_date)
        .await?;

    Ok(Json(NurseWeekResponse {
        success: true,
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/api/coverage",
    tag = "Schedule",
    params(SlotQuery),
    responses(
        (status = 200, description = "Active headcount against the requirement", body = CoverageSummary),
        (status = 404, description = "No work day for this date and shift")
    ),
    security(("api_jwt" = []))
)]
pub async fn coverage(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(slot): Query<SlotQuery>,
) -> Result<Json<CoverageSummary>, AppError> {
    let summary = app_state
        .coverage_service
        .coverage(slot.date, slot.shift_type)
        .await?;

    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/api/schedule/publish",
    tag = "Schedule",
    request_body = PublishSchedulePayload,
    responses(
        (status = 200, description = "Every entry assigned", body = PublishScheduleResponse),
        (status = 404, description = "Unknown work day or nurse in an entry"),
        (status = 409, description = "An entry conflicts; earlier entries stay applied")
    ),
    security(("api_jwt" = []))
)]
pub async fn publish(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<PublishSchedulePayload>,
) -> Result<Json<PublishScheduleResponse>, AppError> {
    let assignments = app_state.ledger.publish(&payload.entries).await?;

    Ok(Json(PublishScheduleResponse { assignments }))
}
