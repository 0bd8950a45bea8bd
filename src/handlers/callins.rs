// src/handlers/callins.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::{
        assignment::{
            AvailableNurse, CallInAction, CallInStatusPayload, LedgerUpdate, UnschedulePayload,
        },
        work_day::SlotQuery,
    },
};

#[utoipa::path(
    get,
    path = "/callins/available",
    tag = "Call-ins",
    params(SlotQuery),
    responses(
        (status = 200, description = "Nurses that can still be called in", body = Vec<AvailableNurse>),
        (status = 404, description = "No work day for this date and shift")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_available(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(slot): Query<SlotQuery>,
) -> Result<Json<Vec<AvailableNurse>>, AppError> {
    let nurses = app_state
        .coverage_service
        .list_available(slot.date, slot.shift_type)
        .await?;

    Ok(Json(nurses))
}

// `called` calls the nurse in; `available` fully unschedules a called-out
// nurse.
#[utoipa::path(
    put,
    path = "/callins/status",
    tag = "Call-ins",
    request_body = CallInStatusPayload,
    responses(
        (status = 200, description = "New assignment and the nurse's weekly hours", body = LedgerUpdate),
        (status = 404, description = "Unknown work day or nurse"),
        (status = 409, description = "Conflicting assignment, time off or weekly cap")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CallInStatusPayload>,
) -> Result<Json<LedgerUpdate>, AppError> {
    tracing::debug!(
        admin_id = %admin.id,
        nurse_id = %payload.emp_id,
        action = ?payload.status,
        "Call-in status change requested"
    );

    let update = match payload.status {
        CallInAction::Called => {
            app_state
                .ledger
                .call_in(payload.date, payload.shift_type, payload.emp_id)
                .await?
        }
        CallInAction::Available => {
            app_state
                .ledger
                .release(payload.date, payload.shift_type, payload.emp_id)
                .await?
        }
    };

    Ok(Json(update))
}

#[utoipa::path(
    post,
    path = "/callout/unschedule",
    tag = "Call-ins",
    request_body = UnschedulePayload,
    responses(
        (status = 200, description = "Nurse called out and shift hours returned", body = LedgerUpdate),
        (status = 404, description = "Unknown work day or nurse"),
        (status = 409, description = "Nurse is not scheduled for this shift")
    ),
    security(("api_jwt" = []))
)]
pub async fn call_out(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<UnschedulePayload>,
) -> Result<Json<LedgerUpdate>, AppError> {
    let update = app_state
        .ledger
        .call_out(payload.date, payload.shift_type, payload.emp_id)
        .await?;

    Ok(Json(update))
}
