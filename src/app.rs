// src/app.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Everything below requires a bearer token
    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::get_me))
        .route("/api/admins", post(handlers::auth::create_admin))
        // Registries
        .route(
            "/api/nurses",
            post(handlers::nurses::create_nurse).get(handlers::nurses::list_nurses),
        )
        .route(
            "/api/nurses/{id}",
            get(handlers::nurses::get_nurse).put(handlers::nurses::update_nurse),
        )
        .route(
            "/api/workdays",
            post(handlers::work_days::create_work_day).get(handlers::work_days::list_work_days),
        )
        .route("/api/workdays/{id}", get(handlers::work_days::get_work_day))
        .route(
            "/api/workdays/{id}/required",
            put(handlers::work_days::update_required),
        )
        // Call-ins and the ledger
        .route("/callins/available", get(handlers::callins::list_available))
        .route("/callins/status", put(handlers::callins::update_status))
        .route("/callout/unschedule", post(handlers::callins::call_out))
        .route("/api/schedule", get(handlers::schedule::list_assigned))
        .route(
            "/api/schedule/{nurseId}/{startDate}",
            get(handlers::schedule::nurse_week),
        )
        .route("/api/schedule/publish", post(handlers::schedule::publish))
        .route("/api/coverage", get(handlers::schedule::coverage))
        // Time off
        .route(
            "/api/time-off",
            post(handlers::time_off::submit).get(handlers::time_off::list),
        )
        .route("/api/time-off/{id}", get(handlers::time_off::get_request))
        .route("/api/time-off/{id}/decision", put(handlers::time_off::decide))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/login", post(handlers::auth::login))
        .merge(protected_routes)
        .with_state(app_state)
}
