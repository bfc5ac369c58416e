// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administration and site content tests.

use axum::http::{Method, StatusCode};
use serde_json::json;
use vanlang_budget::models::Role;

mod common;
use common::{create_test_app, register_user, register_with_role, send};

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "plain@example.com").await;

    let (status, body) = send(&app, Method::GET, "/api/admin/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = send(&app, Method::GET, "/api/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dashboard_counts() {
    let (app, state) = create_test_app();
    let (admin, _) = register_with_role(&app, &state, "admin@example.com", Role::Admin).await;
    let (user, _) = register_user(&app, "counted@example.com").await;
    send(
        &app,
        Method::POST,
        "/api/incomes",
        Some(&user),
        Some(json!({ "amount": 3_000_000, "description": "pay", "category": "Salary" })),
    )
    .await;
    send(
        &app,
        Method::POST,
        "/api/expenses",
        Some(&user),
        Some(json!({ "amount": 1_000_000, "description": "rent", "category": "Rent" })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/admin/dashboard", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_users"], 2);
    assert_eq!(data["active_users"], 2);
    assert_eq!(data["admin_users"], 1);
    assert_eq!(data["incomes"]["count"], 1);
    assert_eq!(data["incomes"]["total"], 3_000_000.0);
    assert_eq!(data["expenses"]["total"], 1_000_000.0);
    assert_eq!(data["total_loans"], 0);
}

#[tokio::test]
async fn test_user_search_and_role_changes() {
    let (app, state) = create_test_app();
    let (admin, _) = register_with_role(&app, &state, "admin@example.com", Role::Admin).await;
    let (superadmin, _) = register_with_role(&app, &state, "root@example.com", Role::Superadmin).await;
    let (_, user_id) = register_user(&app, "promote-me@example.com").await;

    let (_, found) = send(&app, Method::GET, "/api/admin/users?search=PROMOTE", Some(&admin), None).await;
    assert_eq!(found["total"], 1);
    assert_eq!(found["data"][0]["id"], user_id.as_str());
    assert!(found["data"][0].get("password_hash").is_none());

    let (_, admins) = send(&app, Method::GET, "/api/admin/users?role=admin", Some(&admin), None).await;
    assert_eq!(admins["total"], 1);

    let uri = format!("/api/admin/users/{}", user_id);
    let (status, _) = send(&app, Method::PUT, &uri, Some(&admin), Some(json!({ "role": "admin" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, renamed) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({ "first_name": "Binh" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["data"]["first_name"], "Binh");

    let (status, promoted) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&superadmin),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["data"]["role"], "admin");

    let (status, _) = send(&app, Method::GET, "/api/admin/users/missing", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_toggle_status() {
    let (app, state) = create_test_app();
    let (admin, admin_id) = register_with_role(&app, &state, "admin@example.com", Role::Admin).await;
    let (_, super_id) = register_with_role(&app, &state, "root@example.com", Role::Superadmin).await;
    let (_, user_id) = register_user(&app, "toggle@example.com").await;

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/admin/users/{}/toggle-status", admin_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/admin/users/{}/toggle-status", super_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, toggled) = send(
        &app,
        Method::PATCH,
        &format!("/api/admin/users/{}/toggle-status", user_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["data"]["active"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "toggle@example.com", "password": "correct-horse-9" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_transactions_across_users() {
    let (app, state) = create_test_app();
    let (admin, _) = register_with_role(&app, &state, "admin@example.com", Role::Admin).await;
    let (alice, _) = register_user(&app, "alice-admin@example.com").await;
    let (bob, _) = register_user(&app, "bob-admin@example.com").await;

    send(
        &app,
        Method::POST,
        "/api/incomes",
        Some(&alice),
        Some(json!({ "amount": 500, "description": "a", "category": "Gift", "date": "2026-03-01" })),
    )
    .await;
    let (_, expense) = send(
        &app,
        Method::POST,
        "/api/expenses",
        Some(&bob),
        Some(json!({ "amount": 200, "description": "b", "category": "Food", "date": "2026-03-02" })),
    )
    .await;

    let (status, all) = send(&app, Method::GET, "/api/admin/transactions", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["total"], 2);
    assert_eq!(all["total_amount"], 700.0);
    assert_eq!(all["data"][0]["type"], "expense");

    let (_, incomes) = send(&app, Method::GET, "/api/admin/transactions?type=income", Some(&admin), None).await;
    assert_eq!(incomes["total"], 1);

    let id = expense["data"]["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/transactions/{}", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "type is required");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/transactions/{}?type=expense", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, remaining) = send(&app, Method::GET, "/api/expenses", Some(&bob), None).await;
    assert_eq!(remaining["total"], 0);
}

#[tokio::test]
async fn test_bulk_notifications() {
    let (app, state) = create_test_app();
    let (admin, _) = register_with_role(&app, &state, "admin@example.com", Role::Admin).await;
    let (user, user_id) = register_user(&app, "recipient@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/notifications/bulk",
        Some(&admin),
        Some(json!({ "user_ids": [], "title": "Hi", "message": "Hello", "type": "system" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sent) = send(
        &app,
        Method::POST,
        "/api/admin/notifications/bulk",
        Some(&admin),
        Some(json!({
            "user_ids": [user_id],
            "title": "Maintenance",
            "message": "Back soon",
            "type": "system",
            "link": "/status",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["data"]["count"], 1);

    let (_, inbox) = send(&app, Method::GET, "/api/notifications", Some(&user), None).await;
    assert_eq!(inbox["data"][0]["title"], "Maintenance");
    assert_eq!(inbox["data"][0]["link"], "/status");
}

#[tokio::test]
async fn test_site_content_editing() {
    let (app, state) = create_test_app();
    let (admin, admin_id) = register_with_role(&app, &state, "editor@example.com", Role::Admin).await;
    let (user, _) = register_user(&app, "reader@example.com").await;
    let body = json!({ "content": { "body": "About us" }, "status": "draft" });

    let (status, _) = send(&app, Method::PUT, "/api/site-content/about", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::PUT, "/api/site-content/about", Some(&user), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, draft) = send(&app, Method::PUT, "/api/site-content/about", Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["data"]["version"], 1);
    assert_eq!(draft["data"]["updated_by"], admin_id.as_str());

    let (status, _) = send(&app, Method::GET, "/api/site-content/about", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "drafts are not public");

    let (_, published) = send(
        &app,
        Method::PUT,
        "/api/site-content/about",
        Some(&admin),
        Some(json!({ "content": { "body": "About us v2" }, "status": "published" })),
    )
    .await;
    assert_eq!(published["data"]["version"], 2);

    let (status, public) = send(&app, Method::GET, "/api/site-content/about", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["data"]["content"]["body"], "About us v2");

    let (status, _) = send(&app, Method::GET, "/api/site-content/blog", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_footer_and_homepage() {
    let (app, state) = create_test_app();
    let (admin, _) = register_with_role(&app, &state, "web@example.com", Role::Admin).await;

    let (status, _) = send(&app, Method::GET, "/api/site-content/footer", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/site-content/footer",
        Some(&admin),
        Some(json!({ "content": { "copyright": "VanLang" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, footer) = send(&app, Method::GET, "/api/site-content/footer", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(footer["data"]["content"]["copyright"], "VanLang");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/site-content/homepage",
        Some(&admin),
        Some(json!({ "content": { "title": "no sections" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, home) = send(
        &app,
        Method::PUT,
        "/api/site-content/homepage",
        Some(&admin),
        Some(json!({ "content": { "hero": { "title": "Hi" }, "cta": {} } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(home["data"]["sections"], json!(["hero", "cta"]));
}
