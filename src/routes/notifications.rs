// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification center routes.

use super::response::{self, Page, PageParams, Single};
use crate::db::collections;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Notification, NotificationSettings};
use crate::services::notifications::{self, BalanceCheck};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/mark-all-read", patch(mark_all_read))
        .route("/api/notifications/read", delete(delete_read))
        .route(
            "/api/notifications/settings",
            get(get_settings).put(update_settings),
        )
        .route("/api/notifications/check-balance", post(check_balance))
        .route("/api/notifications/{id}/read", patch(mark_read))
        .route("/api/notifications/{id}", delete(delete_notification))
}

async fn load_own(state: &AppState, auth: &AuthUser, id: &str) -> Result<Notification> {
    let notification: Notification = state
        .db
        .get(collections::NOTIFICATIONS, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No notification found with id {}", id)))?;
    // Notifications are private even from admins.
    if notification.user_id != auth.user_id {
        return Err(AppError::NotFound(format!(
            "No notification found with id {}",
            id
        )));
    }
    Ok(notification)
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Notification>>> {
    let list = notifications::list_after_purge(&state.db, &auth.user_id, Utc::now()).await?;
    Ok(Json(response::paginate(list, params)))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: usize,
}

async fn unread_count(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Single<UnreadCount>>> {
    let count = notifications::load(&state.db, &auth.user_id)
        .await?
        .iter()
        .filter(|n| !n.read)
        .count();
    Ok(response::ok(UnreadCount { count }))
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Single<Notification>>> {
    let mut notification = load_own(&state, &auth, &id).await?;
    if !notification.read {
        notification.read = true;
        state
            .db
            .set(collections::NOTIFICATIONS, &notification.id, &notification)
            .await?;
    }
    Ok(response::ok(notification))
}

#[derive(Debug, Serialize)]
pub struct Affected {
    pub count: usize,
}

async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Single<Affected>>> {
    let count = notifications::mark_all_read(&state.db, &auth.user_id).await?;
    Ok(response::ok(Affected { count }))
}

async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let notification = load_own(&state, &auth, &id).await?;
    state
        .db
        .delete(collections::NOTIFICATIONS, &notification.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_read(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Single<Affected>>> {
    let count = notifications::delete_read(&state.db, &auth.user_id).await?;
    tracing::info!(user_id = %auth.user_id, count, "Read notifications deleted");
    Ok(response::ok(Affected { count }))
}

// ─── Settings ────────────────────────────────────────────────

async fn get_settings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Single<NotificationSettings>>> {
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;
    Ok(response::ok(user.settings))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(settings): Json<NotificationSettings>,
) -> Result<Json<Single<NotificationSettings>>> {
    let mut user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;
    user.settings = settings;
    user.updated_at = Utc::now();
    state.db.upsert_user(&user).await?;
    Ok(response::ok(user.settings))
}

async fn check_balance(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Single<BalanceCheck>>> {
    Ok(response::ok(
        notifications::check_negative_balance(&state.db, &auth.user_id).await?,
    ))
}
