// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monthly budget routes.

use super::response::{self, ensure_access, month_year, Single};
use crate::db::collections;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Budget, BudgetView, TransactionKind};
use crate::services::budgets::{self, BudgetStatistics};
use crate::services::{ledger, notifications};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/budgets", get(list_budgets).post(create_budget))
        .route("/api/budgets/monthly", get(monthly))
        .route("/api/budgets/statistics", get(statistics))
        .route("/api/budgets/category-item/{category}", get(by_category))
        .route(
            "/api/budgets/{id}",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl MonthQuery {
    /// The requested month, or the current one when neither part is given.
    fn or_current(&self) -> Result<(u32, i32)> {
        match (self.month, self.year) {
            (None, None) => {
                let now = Utc::now();
                Ok((now.month(), now.year()))
            }
            (month, year) => month_year(month, year),
        }
    }
}

async fn view_of(state: &AppState, budget: Budget) -> Result<BudgetView> {
    let expenses = ledger::load(&state.db, TransactionKind::Expense, &budget.user_id).await?;
    let spent = budgets::spent_in(&expenses, &budget.category, budget.year, budget.month);
    Ok(BudgetView::new(budget, spent))
}

async fn load_owned(state: &AppState, auth: &AuthUser, id: &str) -> Result<Budget> {
    let budget: Budget = state
        .db
        .get(collections::BUDGETS, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No budget found with id {}", id)))?;
    ensure_access(auth, &budget.user_id)?;
    Ok(budget)
}

/// Alert check after a budget changed. Failures are only logged.
async fn check_alerts(state: &AppState, budget: &Budget) {
    let Some(first_of_month) = chrono::NaiveDate::from_ymd_opt(budget.year, budget.month, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .map(|naive| naive.and_utc())
    else {
        return;
    };
    if let Err(e) = notifications::check_budget_alerts(
        &state.db,
        &budget.user_id,
        &budget.category,
        first_of_month,
    )
    .await
    {
        tracing::warn!(error = %e, budget_id = %budget.id, "Budget alert check failed");
    }
}

// ─── Listing ─────────────────────────────────────────────────

async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Single<Vec<BudgetView>>>> {
    let views = match (query.month, query.year) {
        (None, None) => {
            let mut all = budgets::load(&state.db, &auth.user_id).await?;
            all.sort_by(|a, b| {
                (b.year, b.month)
                    .cmp(&(a.year, a.month))
                    .then_with(|| a.category.to_lowercase().cmp(&b.category.to_lowercase()))
            });
            let expenses = ledger::load(&state.db, TransactionKind::Expense, &auth.user_id).await?;
            budgets::views(all, &expenses)
        }
        (month, year) => {
            let (month, year) = month_year(month, year)?;
            budgets::month_views(&state.db, &auth.user_id, year, month).await?
        }
    };
    Ok(response::ok(views))
}

async fn monthly(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Single<Vec<BudgetView>>>> {
    let (month, year) = query.or_current()?;
    Ok(response::ok(
        budgets::month_views(&state.db, &auth.user_id, year, month).await?,
    ))
}

async fn statistics(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Single<BudgetStatistics>>> {
    let (month, year) = query.or_current()?;
    let views = budgets::month_views(&state.db, &auth.user_id, year, month).await?;
    Ok(response::ok(budgets::statistics(month, year, views)))
}

async fn by_category(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(category): Path<String>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Single<BudgetView>>> {
    let (month, year) = query.or_current()?;
    let view = budgets::month_views(&state.db, &auth.user_id, year, month)
        .await?
        .into_iter()
        .find(|v| ledger::same_category(&v.budget.category, &category))
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No budget for '{}' in {:02}/{}",
                category, month, year
            ))
        })?;
    Ok(response::ok(view))
}

// ─── Single budgets ──────────────────────────────────────────

async fn get_budget(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Single<BudgetView>>> {
    let budget = load_owned(&state, &auth, &id).await?;
    Ok(response::ok(view_of(&state, budget).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBudgetRequest {
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub category: String,
    #[validate(range(exclusive_min = 0.0, message = "must be positive"))]
    pub amount: f64,
    pub month: u32,
    pub year: i32,
}

async fn create_budget(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<Single<BudgetView>>)> {
    req.validate()?;
    let (month, year) = month_year(Some(req.month), Some(req.year))?;
    let category = req.category.trim().to_string();
    budgets::ensure_unique(&state.db, &auth.user_id, &category, year, month, None).await?;

    let now = Utc::now();
    let budget = Budget {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: auth.user_id.clone(),
        category,
        amount: req.amount,
        month,
        year,
        created_at: now,
        updated_at: now,
    };
    state.db.set(collections::BUDGETS, &budget.id, &budget).await?;
    tracing::info!(user_id = %auth.user_id, budget_id = %budget.id, "Budget created");

    state.chatbot.invalidate_user(&auth.user_id);
    check_alerts(&state, &budget).await;
    Ok(response::created(view_of(&state, budget).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBudgetRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "must be positive"))]
    pub amount: Option<f64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

async fn update_budget(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBudgetRequest>,
) -> Result<Json<Single<BudgetView>>> {
    req.validate()?;
    let mut budget = load_owned(&state, &auth, &id).await?;

    if let Some(category) = req.category {
        budget.category = category.trim().to_string();
    }
    if let Some(amount) = req.amount {
        budget.amount = amount;
    }
    let (month, year) = month_year(
        Some(req.month.unwrap_or(budget.month)),
        Some(req.year.unwrap_or(budget.year)),
    )?;
    budget.month = month;
    budget.year = year;
    budgets::ensure_unique(
        &state.db,
        &budget.user_id,
        &budget.category,
        year,
        month,
        Some(&budget.id),
    )
    .await?;

    budget.updated_at = Utc::now();
    state.db.set(collections::BUDGETS, &budget.id, &budget).await?;
    state.chatbot.invalidate_user(&budget.user_id);
    check_alerts(&state, &budget).await;
    Ok(response::ok(view_of(&state, budget).await?))
}

async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let budget = load_owned(&state, &auth, &id).await?;
    state.db.delete(collections::BUDGETS, &budget.id).await?;
    state.chatbot.invalidate_user(&budget.user_id);
    tracing::info!(user_id = %auth.user_id, budget_id = %id, "Budget deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_query_defaults_to_current() {
        let (month, year) = MonthQuery::default().or_current().unwrap();
        let now = Utc::now();
        assert_eq!((month, year), (now.month(), now.year()));
    }

    #[test]
    fn test_month_query_requires_both_parts() {
        let partial = MonthQuery {
            month: Some(3),
            year: None,
        };
        assert!(partial.or_current().is_err());

        let bad = MonthQuery {
            month: Some(0),
            year: Some(2026),
        };
        assert!(bad.or_current().is_err());
    }
}
