// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::create_admin,

        // --- Nurses ---
        handlers::nurses::create_nurse,
        handlers::nurses::list_nurses,
        handlers::nurses::get_nurse,
        handlers::nurses::update_nurse,

        // --- Work days ---
        handlers::work_days::create_work_day,
        handlers::work_days::list_work_days,
        handlers::work_days::get_work_day,
        handlers::work_days::update_required,

        // --- Call-ins ---
        handlers::callins::list_available,
        handlers::callins::update_status,
        handlers::callins::call_out,

        // --- Schedule ---
        handlers::schedule::list_assigned,
        handlers::schedule::nurse_week,
        handlers::schedule::coverage,
        handlers::schedule::publish,

        // --- Time off ---
        handlers::time_off::submit,
        handlers::time_off::list,
        handlers::time_off::get_request,
        handlers::time_off::decide,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Admin,
            models::auth::Role,
            models::auth::Principal,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::CreateAdminPayload,

            // --- Nurses ---
            models::nurse::Nurse,
            models::nurse::CreateNursePayload,
            models::nurse::UpdateNursePayload,

            // --- Work days ---
            models::work_day::ShiftType,
            models::work_day::WorkDay,
            models::work_day::CreateWorkDayPayload,
            models::work_day::UpdateRequiredPayload,

            // --- Assignments ---
            models::assignment::AssignmentStatus,
            models::assignment::Assignment,
            models::assignment::LedgerUpdate,
            models::assignment::CallInAction,
            models::assignment::CallInStatusPayload,
            models::assignment::UnschedulePayload,
            models::assignment::PublishEntry,
            models::assignment::PublishSchedulePayload,
            models::assignment::PublishScheduleResponse,
            models::assignment::AvailableNurse,
            models::assignment::AssignedNurses,
            models::assignment::CoverageSummary,
            models::assignment::ScheduledShift,
            models::assignment::NurseWeekResponse,

            // --- Time off ---
            models::time_off::TimeOffStatus,
            models::time_off::TimeOffRequest,
            models::time_off::SubmitTimeOffPayload,
            models::time_off::DecideTimeOffPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Login and admin accounts"),
        (name = "Nurses", description = "Nurse registry and weekly hours"),
        (name = "Work Days", description = "Staffing requirements per date and shift"),
        (name = "Call-ins", description = "Calling nurses in and out of a shift"),
        (name = "Schedule", description = "Assigned nurses, coverage and published schedules"),
        (name = "Time Off", description = "Time-off requests and decisions")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
