// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Income and expense routes.
//!
//! Both kinds share these handlers; the kind is attached to each router as
//! an extension.

use super::response::{self, ensure_access, month_year, Page, PageParams, Single};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CategoryTotal, Location, Transaction, TransactionKind};
use crate::services::{ledger, notifications};
use crate::time_utils::parse_date;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(kind_routes(TransactionKind::Income))
        .merge(kind_routes(TransactionKind::Expense))
}

fn kind_routes(kind: TransactionKind) -> Router<Arc<AppState>> {
    let base = format!("/api/{}", kind.collection());
    Router::new()
        .route(&base, get(list_entries).post(create_entry))
        .route(&format!("{base}/summary/monthly"), get(monthly_summary))
        .route(&format!("{base}/summary/by-category"), get(category_summary))
        .route(&format!("{base}/categories"), get(categories))
        .route(
            &format!("{base}/{{id}}"),
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .layer(Extension(kind))
}

// ─── Queries ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category: Option<String>,
    /// Comma-separated category names
    pub categories: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn parse_bound(raw: Option<&str>, field: &str) -> Result<Option<chrono::DateTime<Utc>>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid {field}: {s}"))),
    }
}

impl ListQuery {
    fn filter(&self) -> Result<ledger::TransactionFilter> {
        let mut categories: Vec<String> = self
            .categories
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if let Some(category) = self.category.as_deref().map(str::trim) {
            if !category.is_empty() {
                categories.push(category.to_string());
            }
        }

        let start = parse_bound(self.start_date.as_deref(), "start_date")?;
        // A bare end date covers that whole day.
        let end = parse_bound(self.end_date.as_deref(), "end_date")?.map(|end| {
            if self.end_date.as_deref().is_some_and(|s| s.trim().len() == 10) {
                end + chrono::Duration::days(1) - chrono::Duration::milliseconds(1)
            } else {
                end
            }
        });

        Ok(ledger::TransactionFilter {
            start,
            end,
            categories,
        })
    }

    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Transaction>>> {
    let filter = query.filter()?;
    let entries = ledger::load(&state.db, kind, &auth.user_id).await?;
    let matching = ledger::filter_sorted(entries, &filter);
    let total_amount = ledger::total_amount(&matching);

    Ok(Json(
        response::paginate(matching, query.page_params()).with_total_amount(total_amount),
    ))
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct MonthlySummary {
    pub month: u32,
    pub year: i32,
    pub total: f64,
    pub count: usize,
}

async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Single<MonthlySummary>>> {
    let (month, year) = month_year(query.month, query.year)?;
    let entries = ledger::load(&state.db, kind, &auth.user_id).await?;
    let count = entries
        .iter()
        .filter(|t| crate::time_utils::in_month(t.date, year, month))
        .count();

    Ok(response::ok(MonthlySummary {
        month,
        year,
        total: ledger::monthly_total(&entries, year, month),
        count,
    }))
}

async fn category_summary(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Single<Vec<CategoryTotal>>>> {
    let filter = query.filter()?;
    let entries = ledger::load(&state.db, kind, &auth.user_id).await?;
    let matching = ledger::filter_sorted(entries, &filter);
    Ok(response::ok(ledger::by_category(&matching)))
}

async fn categories(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Single<Vec<String>>>> {
    let entries = ledger::load(&state.db, kind, &auth.user_id).await?;
    Ok(response::ok(ledger::distinct_categories(&entries)))
}

// ─── Single entries ──────────────────────────────────────────

async fn load_owned(
    state: &AppState,
    kind: TransactionKind,
    auth: &AuthUser,
    id: &str,
) -> Result<Transaction> {
    let entry: Transaction = state
        .db
        .get(kind.collection(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No {} found with id {}", kind.as_str(), id)))?;
    ensure_access(auth, &entry.user_id)?;
    Ok(entry)
}

async fn get_entry(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Single<Transaction>>> {
    Ok(response::ok(load_owned(&state, kind, &auth, &id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    #[validate(range(exclusive_min = 0.0, message = "must be positive"))]
    pub amount: f64,
    #[validate(length(min = 1, max = 500, message = "is required"))]
    pub description: String,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub category: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

async fn create_entry(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<Single<Transaction>>)> {
    req.validate()?;
    let now = Utc::now();
    let date = parse_bound(req.date.as_deref(), "date")?.unwrap_or(now);

    let entry = Transaction {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: auth.user_id.clone(),
        amount: req.amount,
        description: req.description.trim().to_string(),
        category: req.category.trim().to_string(),
        date,
        attachments: req.attachments,
        location: match kind {
            TransactionKind::Expense => req.location,
            TransactionKind::Income => None,
        },
        created_at: now,
        updated_at: now,
    };
    state.db.set(kind.collection(), &entry.id, &entry).await?;
    tracing::info!(
        user_id = %auth.user_id,
        kind = kind.as_str(),
        entry_id = %entry.id,
        "Entry created"
    );

    state.chatbot.invalidate_user(&auth.user_id);
    raise_alerts(&state, kind, &entry, true).await;

    Ok(response::created(entry))
}

/// Notifications for a changed entry. Failures are logged, never surfaced.
async fn raise_alerts(state: &AppState, kind: TransactionKind, entry: &Transaction, created: bool) {
    if created {
        if let Err(e) = notifications::notify_transaction(&state.db, kind, entry).await {
            tracing::warn!(error = %e, entry_id = %entry.id, "Failed to create entry notification");
        }
    }
    if kind != TransactionKind::Expense {
        return;
    }
    if let Err(e) =
        notifications::check_budget_alerts(&state.db, &entry.user_id, &entry.category, entry.date)
            .await
    {
        tracing::warn!(error = %e, user_id = %entry.user_id, "Budget alert check failed");
    }
    if let Err(e) = notifications::check_negative_balance(&state.db, &entry.user_id).await {
        tracing::warn!(error = %e, user_id = %entry.user_id, "Balance check failed");
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEntryRequest {
    #[validate(range(exclusive_min = 0.0, message = "must be positive"))]
    pub amount: Option<f64>,
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub date: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub location: Option<Location>,
}

async fn update_entry(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<Json<Single<Transaction>>> {
    req.validate()?;
    let mut entry = load_owned(&state, kind, &auth, &id).await?;

    if let Some(amount) = req.amount {
        entry.amount = amount;
    }
    if let Some(description) = req.description {
        entry.description = description.trim().to_string();
    }
    if let Some(category) = req.category {
        entry.category = category.trim().to_string();
    }
    if let Some(date) = parse_bound(req.date.as_deref(), "date")? {
        entry.date = date;
    }
    if let Some(attachments) = req.attachments {
        entry.attachments = attachments;
    }
    if kind == TransactionKind::Expense && req.location.is_some() {
        entry.location = req.location;
    }
    entry.updated_at = Utc::now();
    state.db.set(kind.collection(), &entry.id, &entry).await?;

    state.chatbot.invalidate_user(&entry.user_id);
    raise_alerts(&state, kind, &entry, false).await;

    Ok(response::ok(entry))
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let entry = load_owned(&state, kind, &auth, &id).await?;
    state.db.delete(kind.collection(), &entry.id).await?;
    state.chatbot.invalidate_user(&entry.user_id);
    tracing::info!(user_id = %auth.user_id, kind = kind.as_str(), entry_id = %id, "Entry deleted");
    Ok(StatusCode::NO_CONTENT)
}
