// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vanlang_budget::config::Config;
use vanlang_budget::db::FirestoreDb;
use vanlang_budget::models::Role;
use vanlang_budget::routes::create_router;
use vanlang_budget::services::Mailer;
use vanlang_budget::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

/// Like [`create_test_app`] with a custom configuration. Outgoing mail is
/// kept in `state.mailer`.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(
        AppState::new(config, FirestoreDb::new_in_memory()).with_mailer(Mailer::memory()),
    );
    (create_router(state.clone()), state)
}

/// Create a test app whose database is unreachable.
#[allow(dead_code)]
pub fn create_offline_app() -> Router {
    let state = Arc::new(AppState::new(Config::test_default(), test_db_offline()));
    create_router(state)
}

#[allow(dead_code)]
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Send a JSON request and return the status and parsed body (`Null` when empty).
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register a user and return `(access_token, user_id)`.
#[allow(dead_code)]
pub async fn register_user(app: &Router, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "correct-horse-9",
            "first_name": "Test",
            "last_name": "User",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["data"]["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// Register a user and give them `role`. Tokens are minted after the change.
#[allow(dead_code)]
pub async fn register_with_role(
    app: &Router,
    state: &AppState,
    email: &str,
    role: Role,
) -> (String, String) {
    let (_, user_id) = register_user(app, email).await;
    let mut user = state.db.get_user(&user_id).await.unwrap().unwrap();
    user.role = role;
    state.db.upsert_user(&user).await.unwrap();

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "correct-horse-9" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    (body["token"].as_str().unwrap().to_string(), user_id)
}
