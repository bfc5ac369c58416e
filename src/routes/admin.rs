// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administration routes. Every handler requires an admin.

use super::response::{self, Page, Single};
use crate::db::collections;
use crate::error::{AppError, Result};
use crate::middleware::rate_limit::limit_admin;
use crate::middleware::RequireAdmin;
use crate::models::{
    Investment, Loan, Notification, NotificationType, Role, Transaction, TransactionKind, User,
    UserProfile,
};
use crate::services::{ledger, notifications};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Admin routes, limited per admin. Mount behind `require_auth`.
pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/dashboard", get(dashboard))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}", get(get_user).put(update_user))
        .route("/api/admin/users/{id}/toggle-status", patch(toggle_status))
        .route("/api/admin/transactions", get(list_transactions))
        .route("/api/admin/transactions/{id}", delete(delete_transaction))
        .route("/api/admin/notifications/bulk", post(bulk_notify))
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_admin))
}

async fn load_user(state: &AppState, id: &str) -> Result<User> {
    state
        .db
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LedgerTotals {
    pub count: usize,
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub total_users: usize,
    pub active_users: usize,
    pub admin_users: usize,
    pub incomes: LedgerTotals,
    pub expenses: LedgerTotals,
    pub total_loans: usize,
    pub total_investments: usize,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Single<Dashboard>>> {
    let users: Vec<User> = state.db.list_all(collections::USERS).await?;
    let incomes: Vec<Transaction> = state.db.list_all(collections::INCOMES).await?;
    let expenses: Vec<Transaction> = state.db.list_all(collections::EXPENSES).await?;
    let loans: Vec<Loan> = state.db.list_all(collections::LOANS).await?;
    let investments: Vec<Investment> = state.db.list_all(collections::INVESTMENTS).await?;

    Ok(response::ok(Dashboard {
        total_users: users.len(),
        active_users: users.iter().filter(|u| u.active).count(),
        admin_users: users.iter().filter(|u| u.role.is_admin()).count(),
        incomes: LedgerTotals {
            count: incomes.len(),
            total: ledger::total_amount(&incomes),
        },
        expenses: LedgerTotals {
            count: expenses.len(),
            total: ledger::total_amount(&expenses),
        },
        total_loans: loans.len(),
        total_investments: investments.len(),
    }))
}

// ─── Users ───────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn user_matches(user: &User, query: &UserQuery) -> bool {
    if query.role.is_some_and(|role| user.role != role) {
        return false;
    }
    match query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => true,
        Some(term) => {
            let term = term.to_lowercase();
            user.email.contains(&term) || user.full_name().to_lowercase().contains(&term)
        }
    }
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<UserQuery>,
) -> Result<Json<Page<UserProfile>>> {
    let mut users: Vec<User> = state.db.list_all(collections::USERS).await?;
    users.retain(|u| user_matches(u, &query));
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let profiles: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();
    Ok(Json(response::paginate(
        profiles,
        response::PageParams {
            page: query.page,
            limit: query.limit,
        },
    )))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Single<UserProfile>>> {
    let user = load_user(&state, &id).await?;
    Ok(response::ok(UserProfile::from(&user)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    pub is_email_verified: Option<bool>,
}

/// Only a superadmin may hand out (or take away) admin rights.
fn check_role_change(actor: Role, current: Role, requested: Role) -> Result<()> {
    if requested == current {
        return Ok(());
    }
    if (requested.is_admin() || current.is_admin()) && actor != Role::Superadmin {
        return Err(AppError::Forbidden(
            "Only a superadmin can grant or revoke admin roles".to_string(),
        ));
    }
    Ok(())
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<Single<UserProfile>>> {
    req.validate()?;
    let mut user = load_user(&state, &id).await?;

    if let Some(role) = req.role {
        check_role_change(admin.role, user.role, role)?;
        if role != user.role {
            tracing::info!(
                admin_id = %admin.user_id,
                user_id = %user.id,
                from = user.role.as_str(),
                to = role.as_str(),
                "User role changed"
            );
        }
        user.role = role;
    }
    if let Some(first_name) = req.first_name {
        user.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = req.last_name {
        user.last_name = last_name.trim().to_string();
    }
    if let Some(verified) = req.is_email_verified {
        user.is_email_verified = verified;
    }
    user.updated_at = Utc::now();
    state.db.upsert_user(&user).await?;
    Ok(response::ok(UserProfile::from(&user)))
}

async fn toggle_status(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Single<UserProfile>>> {
    if id == admin.user_id {
        return Err(AppError::BadRequest(
            "You cannot deactivate your own account".to_string(),
        ));
    }
    let mut user = load_user(&state, &id).await?;
    if user.role == Role::Superadmin && admin.role != Role::Superadmin {
        return Err(AppError::Forbidden(
            "Only a superadmin can change a superadmin's status".to_string(),
        ));
    }

    user.active = !user.active;
    user.updated_at = Utc::now();
    state.db.upsert_user(&user).await?;
    tracing::info!(admin_id = %admin.user_id, user_id = %user.id, active = user.active, "User status toggled");
    Ok(response::ok(UserProfile::from(&user)))
}

// ─── Transactions ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// An entry from either ledger, tagged with its kind.
#[derive(Debug, Serialize)]
pub struct AdminTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(flatten)]
    pub entry: Transaction,
}

async fn list_transactions(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Page<AdminTransaction>>> {
    let kinds = match query.kind {
        Some(kind) => vec![kind],
        None => vec![TransactionKind::Income, TransactionKind::Expense],
    };

    let mut all = Vec::new();
    for kind in kinds {
        let entries: Vec<Transaction> = state.db.list_all(kind.collection()).await?;
        all.extend(entries.into_iter().map(|entry| AdminTransaction { kind, entry }));
    }
    all.sort_by(|a, b| b.entry.date.cmp(&a.entry.date));

    let total_amount: f64 = all.iter().map(|t| t.entry.amount).sum();
    Ok(Json(
        response::paginate(
            all,
            response::PageParams {
                page: query.page,
                limit: query.limit,
            },
        )
        .with_total_amount(total_amount),
    ))
}

#[derive(Debug, Deserialize)]
pub struct KindQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
}

async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Query(query): Query<KindQuery>,
) -> Result<StatusCode> {
    let kind = query.kind.ok_or_else(|| {
        AppError::BadRequest("Query parameter 'type' (income or expense) is required".to_string())
    })?;
    let entry: Transaction = state
        .db
        .get(kind.collection(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No {} found with id {}", kind.as_str(), id)))?;

    state.db.delete(kind.collection(), &entry.id).await?;
    state.chatbot.invalidate_user(&entry.user_id);
    tracing::info!(
        admin_id = %admin.user_id,
        kind = kind.as_str(),
        entry_id = %id,
        owner_id = %entry.user_id,
        "Entry deleted by admin"
    );
    Ok(StatusCode::NO_CONTENT)
}

// ─── Notifications ───────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct BulkNotificationRequest {
    pub user_ids: Vec<String>,
    #[validate(length(min = 1, max = 200, message = "is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "is required"))]
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub count: usize,
}

async fn bulk_notify(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    Json(req): Json<BulkNotificationRequest>,
) -> Result<(StatusCode, Json<Single<BulkResult>>)> {
    if req.user_ids.is_empty() {
        return Err(AppError::BadRequest(
            "At least one recipient is required".to_string(),
        ));
    }
    req.validate()?;

    let mut count = 0;
    for user_id in &req.user_ids {
        let mut notification =
            Notification::new(user_id, req.kind, req.title.clone(), req.message.clone());
        if let Some(link) = req.link.as_deref() {
            notification = notification.with_link(link);
        }
        notifications::create(&state.db, &notification).await?;
        count += 1;
    }

    tracing::info!(admin_id = %admin.user_id, count, "Bulk notifications sent");
    Ok(response::created(BulkResult { count }))
}
