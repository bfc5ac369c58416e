// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Budget API and budget alert tests.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

mod common;
use common::{create_test_app, register_user, send};

async fn create_budget(app: &axum::Router, token: &str, category: &str, amount: f64) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/budgets",
        Some(token),
        Some(json!({ "category": category, "amount": amount, "month": 3, "year": 2026 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create budget failed: {body}");
    body["data"].clone()
}

async fn spend(app: &axum::Router, token: &str, category: &str, amount: f64, date: &str) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/expenses",
        Some(token),
        Some(json!({
            "amount": amount,
            "description": "spend",
            "category": category,
            "date": date,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create expense failed: {body}");
}

async fn budget_alerts(app: &axum::Router, token: &str) -> Vec<Value> {
    let (_, list) = send(app, Method::GET, "/api/notifications", Some(token), None).await;
    list["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["type"] == "budget-alert")
        .cloned()
        .collect()
}

#[tokio::test]
async fn test_budget_usage_is_derived() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "budget@example.com").await;
    create_budget(&app, &token, "Food", 1_000_000.0).await;
    spend(&app, &token, "food", 250_000.0, "2026-03-04").await;
    spend(&app, &token, "Food", 100_000.0, "2026-04-04").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/budgets?month=3&year=2026",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let budget = &body["data"][0];
    assert_eq!(budget["spent"], 250_000.0);
    assert_eq!(budget["remaining"], 750_000.0);
    assert_eq!(budget["percentage"], 25);
}

#[tokio::test]
async fn test_duplicate_budget_rejected() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "dup-budget@example.com").await;
    create_budget(&app, &token, "Food", 1_000_000.0).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/budgets",
        Some(&token),
        Some(json!({ "category": " FOOD ", "amount": 5, "month": 3, "year": 2026 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Same category in another month is fine.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/budgets",
        Some(&token),
        Some(json!({ "category": "Food", "amount": 5, "month": 4, "year": 2026 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_statistics_and_category_item() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "stats-budget@example.com").await;
    create_budget(&app, &token, "Food", 1_000_000.0).await;
    create_budget(&app, &token, "Rent", 2_000_000.0).await;
    create_budget(&app, &token, "Fun", 500_000.0).await;
    spend(&app, &token, "Food", 850_000.0, "2026-03-02").await;
    spend(&app, &token, "Fun", 600_000.0, "2026-03-02").await;

    let (status, stats) = send(
        &app,
        Method::GET,
        "/api/budgets/statistics?month=3&year=2026",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &stats["data"];
    assert_eq!(data["total_budget"], 3_500_000.0);
    assert_eq!(data["total_spent"], 1_450_000.0);
    assert_eq!(data["over_budget_count"], 1);
    assert_eq!(data["near_limit_count"], 1);
    assert_eq!(data["categories"].as_array().unwrap().len(), 3);

    let (status, item) = send(
        &app,
        Method::GET,
        "/api/budgets/category-item/rent?month=3&year=2026",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["data"]["category"], "Rent");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/budgets/category-item/Travel?month=3&year=2026",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_alert_escalates_without_duplicates() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "alerts@example.com").await;
    create_budget(&app, &token, "Food", 1_000_000.0).await;

    spend(&app, &token, "Food", 500_000.0, "2026-03-01").await;
    assert!(budget_alerts(&app, &token).await.is_empty());

    spend(&app, &token, "Food", 350_000.0, "2026-03-02").await;
    let alerts = budget_alerts(&app, &token).await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["data"]["level"], "warning");

    // Still in the warning band: no second alert.
    spend(&app, &token, "Food", 50_000.0, "2026-03-03").await;
    assert_eq!(budget_alerts(&app, &token).await.len(), 1);

    spend(&app, &token, "Food", 200_000.0, "2026-03-04").await;
    let alerts = budget_alerts(&app, &token).await;
    assert_eq!(alerts.len(), 1, "escalation replaces the warning");
    assert_eq!(alerts[0]["data"]["level"], "over");
}

#[tokio::test]
async fn test_alerts_respect_settings() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "quiet@example.com").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/notifications/settings",
        Some(&token),
        Some(json!({ "budget_alerts": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    create_budget(&app, &token, "Food", 100_000.0).await;
    spend(&app, &token, "Food", 200_000.0, "2026-03-01").await;
    assert!(budget_alerts(&app, &token).await.is_empty());
}

#[tokio::test]
async fn test_update_and_delete_budget() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "edit-budget@example.com").await;
    let food = create_budget(&app, &token, "Food", 1_000_000.0).await;
    create_budget(&app, &token, "Rent", 1_000_000.0).await;
    let id = food["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/budgets/{}", id),
        Some(&token),
        Some(json!({ "category": "rent" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "rename onto an existing budget");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/budgets/{}", id),
        Some(&token),
        Some(json!({ "amount": 2_000_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["amount"], 2_000_000.0);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/budgets/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/budgets/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
