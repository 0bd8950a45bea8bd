// tests/api.rs
#![allow(non_snake_case)]

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use nicu_scheduler::{build_router, db::MemoryStore, AppState, Config};

struct TestApp {
    router: Router,
    admin_token: String,
}

impl TestApp {
    async fn new() -> Self {
        let vars: HashMap<&str, &str> = [
            ("JWT_SECRET", "integration-secret"),
            ("BCRYPT_COST", "4"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("config");
        let state = AppState::with_store(Arc::new(MemoryStore::new()), &config);
        state
            .auth_service
            .ensure_admin("rivera", "s3cret!")
            .await
            .expect("bootstrap admin");

        let router = build_router(state);
        let (status, body) = send(
            &router,
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "rivera", "password": "s3cret!" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");

        Self {
            router,
            admin_token: body["token"].as_str().expect("token").to_string(),
        }
    }

    async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send(&self.router, method, uri, Some(&self.admin_token), body).await
    }

    async fn create_nurse(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/nurses",
                Some(json!({ "name": name, "email": email, "password": "password1" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().expect("nurse id").to_string()
    }

    async fn create_work_day(&self, date: &str, shift: &str, required: i32) {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/workdays",
                Some(json!({ "date": date, "shiftType": shift, "requiredEmployees": required })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = send(
            &self.router,
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().expect("token").to_string()
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = router.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health__should_be_public() {
    let app = TestApp::new().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes__should_require_a_token() {
    // Given
    let app = TestApp::new().await;

    // When
    let (status, body) = send(
        &app.router,
        Method::GET,
        "/callins/available?date=2024-07-01&shiftType=day",
        None,
        None,
    )
    .await;

    // Then
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "UNAUTHORIZED");
}

#[tokio::test]
async fn login__should_reject_wrong_password() {
    let app = TestApp::new().await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": "rivera", "password": "nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "UNAUTHORIZED");
}

#[tokio::test]
async fn available__should_return_404_without_work_day() {
    let app = TestApp::new().await;

    let (status, body) = app
        .admin(Method::GET, "/callins/available?date=2024-07-01&shiftType=day", None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn call_in_flow__should_update_views_and_hours() {
    // Given
    let app = TestApp::new().await;
    app.create_work_day("2024-07-01", "day", 2).await;
    let alice = app.create_nurse("Alice", "alice@nicu.org").await;
    app.create_nurse("Bea", "bea@nicu.org").await;

    // When
    let (status, update) = app
        .admin(
            Method::PUT,
            "/callins/status",
            Some(json!({
                "date": "2024-07-01",
                "shiftType": "day",
                "empID": alice,
                "status": "called"
            })),
        )
        .await;

    // Then
    assert_eq!(status, StatusCode::OK, "{update}");
    assert_eq!(update["assignment"]["status"], "called-in");
    assert_eq!(update["nurse"]["currentWeeklyHours"], 12.0);
    assert!(update["nurse"].get("passwordHash").is_none());

    let (_, available) = app
        .admin(Method::GET, "/callins/available?date=2024-07-01&shiftType=day", None)
        .await;
    let names: Vec<&str> = available
        .as_array()
        .expect("array")
        .iter()
        .map(|n| n["nurse"]["name"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["Bea"]);

    let (_, schedule) = app
        .admin(Method::GET, "/api/schedule?date=2024-07-01&shiftType=day", None)
        .await;
    assert_eq!(schedule["assignedNurses"][0]["name"], "Alice");

    let (_, coverage) = app
        .admin(Method::GET, "/api/coverage?date=2024-07-01&shiftType=day", None)
        .await;
    assert_eq!(coverage["activeCount"], 1);
    assert_eq!(coverage["shortfall"], 1);

    let (_, week) = app
        .admin(Method::GET, &format!("/api/schedule/{alice}/2024-07-01"), None)
        .await;
    assert_eq!(week["success"], true);
    assert_eq!(week["data"][0]["status"], "called-in");
}

#[tokio::test]
async fn call_out_then_release__should_return_nurse_to_available() {
    // Given
    let app = TestApp::new().await;
    app.create_work_day("2024-07-01", "day", 2).await;
    let alice = app.create_nurse("Alice", "alice@nicu.org").await;
    let call_in = json!({
        "date": "2024-07-01", "shiftType": "day", "empID": alice, "status": "called"
    });
    app.admin(Method::PUT, "/callins/status", Some(call_in)).await;

    // When
    let (out_status, out) = app
        .admin(
            Method::POST,
            "/callout/unschedule",
            Some(json!({ "empID": alice, "date": "2024-07-01", "shiftType": "day" })),
        )
        .await;
    let (release_status, released) = app
        .admin(
            Method::PUT,
            "/callins/status",
            Some(json!({
                "date": "2024-07-01", "shiftType": "day", "empID": alice, "status": "available"
            })),
        )
        .await;

    // Then
    assert_eq!(out_status, StatusCode::OK, "{out}");
    assert_eq!(out["assignment"]["status"], "called-out");
    assert_eq!(out["nurse"]["currentWeeklyHours"], 0.0);
    assert_eq!(release_status, StatusCode::OK, "{released}");
    assert_eq!(released["assignment"]["status"], "available");
}

#[tokio::test]
async fn call_in__should_report_capacity_exceeded() {
    // Given a nurse capped below one shift
    let app = TestApp::new().await;
    app.create_work_day("2024-07-01", "day", 2).await;
    let (_, nurse) = app
        .admin(
            Method::POST,
            "/api/nurses",
            Some(json!({
                "name": "Cara",
                "email": "cara@nicu.org",
                "password": "password1",
                "maxWeeklyHours": 8
            })),
        )
        .await;

    // When
    let (status, body) = app
        .admin(
            Method::PUT,
            "/callins/status",
            Some(json!({
                "date": "2024-07-01", "shiftType": "day", "empID": nurse["id"], "status": "called"
            })),
        )
        .await;

    // Then
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "CAPACITY_EXCEEDED");
}

#[tokio::test]
async fn nurse__should_be_forbidden_from_admin_routes() {
    // Given
    let app = TestApp::new().await;
    app.create_work_day("2024-07-01", "day", 2).await;
    let alice = app.create_nurse("Alice", "alice@nicu.org").await;
    let token = app.login("alice@nicu.org", "password1").await;

    // When
    let (status, body) = send(
        &app.router,
        Method::PUT,
        "/callins/status",
        Some(&token),
        Some(json!({
            "date": "2024-07-01", "shiftType": "day", "empID": alice, "status": "called"
        })),
    )
    .await;
    let (read_status, _) = send(
        &app.router,
        Method::GET,
        "/callins/available?date=2024-07-01&shiftType=day",
        Some(&token),
        None,
    )
    .await;

    // Then
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "FORBIDDEN");
    assert_eq!(read_status, StatusCode::OK);
}

#[tokio::test]
async fn time_off_flow__should_hide_approved_nurse_and_refuse_second_decision() {
    // Given
    let app = TestApp::new().await;
    app.create_work_day("2024-07-01", "day", 2).await;
    app.create_nurse("Alice", "alice@nicu.org").await;
    app.create_nurse("Bea", "bea@nicu.org").await;
    let bea_token = app.login("bea@nicu.org", "password1").await;

    // When Bea files and the admin approves
    let (status, request) = send(
        &app.router,
        Method::POST,
        "/api/time-off",
        Some(&bea_token),
        Some(json!({ "date": "2024-07-01", "reason": "Family event" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{request}");
    assert_eq!(request["status"], "Pending");
    let id = request["id"].as_str().expect("request id").to_string();

    let (approve_status, approved) = app
        .admin(
            Method::PUT,
            &format!("/api/time-off/{id}/decision"),
            Some(json!({ "decision": "Approved" })),
        )
        .await;
    let (again_status, again) = app
        .admin(
            Method::PUT,
            &format!("/api/time-off/{id}/decision"),
            Some(json!({ "decision": "Denied" })),
        )
        .await;

    // Then
    assert_eq!(approve_status, StatusCode::OK, "{approved}");
    assert_eq!(approved["status"], "Approved");
    assert_eq!(again_status, StatusCode::CONFLICT);
    assert_eq!(again["kind"], "INVALID_STATE");

    let (_, available) = app
        .admin(Method::GET, "/callins/available?date=2024-07-01&shiftType=day", None)
        .await;
    let names: Vec<&str> = available
        .as_array()
        .expect("array")
        .iter()
        .map(|n| n["nurse"]["name"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["Alice"]);
}

#[tokio::test]
async fn create_nurse__should_report_validation_details() {
    let app = TestApp::new().await;

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/nurses",
            Some(json!({ "name": "", "email": "not-an-email", "password": "password1" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION");
    assert!(body["details"].get("email").is_some());
    assert!(body["details"].get("name").is_some());
}

#[tokio::test]
async fn publish__should_assign_entries_and_count_towards_coverage() {
    // Given
    let app = TestApp::new().await;
    app.create_work_day("2024-07-01", "night", 1).await;
    let alice = app.create_nurse("Alice", "alice@nicu.org").await;

    // When
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/schedule/publish",
            Some(json!({ "entries": [
                { "date": "2024-07-01", "shiftType": "night", "empID": alice }
            ]})),
        )
        .await;

    // Then
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["assignments"][0]["status"], "assigned");
    let (_, coverage) = app
        .admin(Method::GET, "/api/coverage?date=2024-07-01&shiftType=night", None)
        .await;
    assert_eq!(coverage["shortfall"], 0);
}

#[tokio::test]
async fn openapi__should_be_served_without_a_token() {
    let app = TestApp::new().await;

    let (status, body) = send(&app.router, Method::GET, "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/callins/status").is_some());
}
