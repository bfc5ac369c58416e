// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Income and expense category API tests.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

mod common;
use common::{create_test_app, register_user, send};

fn names(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_registration_seeds_defaults() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "cats@example.com").await;

    let (status, body) = send(&app, Method::GET, "/api/expense-categories", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], body["data"].as_array().unwrap().len());
    assert!(names(&body).contains(&"Ăn uống".to_string()));
    assert!(body["data"].as_array().unwrap().iter().all(|c| c["is_default"] == true));

    let (_, body) = send(&app, Method::GET, "/api/income-categories", Some(&token), None).await;
    assert!(names(&body).contains(&"Lương".to_string()));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/expense-categories/grouped?group=daily",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let groups = body["data"].as_object().unwrap();
    assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["daily"]);
}

#[tokio::test]
async fn test_custom_category_lifecycle() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "custom@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/expense-categories",
        Some(&token),
        Some(json!({ "name": "Coffee" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["icon"], "tag");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Names are unique per user regardless of case.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/expense-categories",
        Some(&token),
        Some(json!({ "name": "coffee" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/expenses",
        Some(&token),
        Some(json!({
            "amount": 45_000.0,
            "description": "latte",
            "category": "Coffee",
            "date": "2026-03-02",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/expense-categories/{id}"),
        Some(&token),
        Some(json!({ "name": "Cà phê", "color": "#854d0e" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Cà phê");

    let (_, body) = send(&app, Method::GET, "/api/expenses", Some(&token), None).await;
    assert_eq!(body["data"][0]["category"], "Cà phê");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/expense-categories/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Records of a deleted category land in the fallback one.
    let (_, body) = send(&app, Method::GET, "/api/expenses", Some(&token), None).await;
    assert_eq!(body["data"][0]["category"], "Khác");
}

#[tokio::test]
async fn test_defaults_are_protected_and_resettable() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "defaults@example.com").await;

    let (_, body) = send(&app, Method::GET, "/api/income-categories", Some(&token), None).await;
    let before = body["data"].as_array().unwrap().len();
    let id = body["data"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/income-categories/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/income-categories/{id}"),
        Some(&token),
        Some(json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/income-categories/reset-defaults",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], before);
}

#[tokio::test]
async fn test_other_users_category_is_forbidden() {
    let (app, _) = create_test_app();
    let (owner, _) = register_user(&app, "owner-cat@example.com").await;
    let (other, _) = register_user(&app, "other-cat@example.com").await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/expense-categories",
        Some(&owner),
        Some(json!({ "name": "Pets" })),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/expense-categories/{id}"),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
