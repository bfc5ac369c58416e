// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Investment routes.

use super::response::{self, ensure_access, Single};
use crate::db::collections;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Investment, InvestmentTransactionType, InvestmentType};
use crate::services::investments::{self, InvestmentSummary, NewTransaction};
use crate::time_utils::parse_date;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/investments",
            get(list_investments).post(create_investment),
        )
        .route("/api/investments/summary", get(summary))
        .route("/api/investments/by-type/{type}", get(by_type))
        .route("/api/investments/batch-update-price", post(batch_update_price))
        .route(
            "/api/investments/{id}",
            get(get_investment)
                .put(update_investment)
                .delete(delete_investment),
        )
        .route("/api/investments/{id}/transactions", post(add_transaction))
        .route(
            "/api/investments/{id}/transactions/{transaction_id}",
            delete(delete_transaction),
        )
}

fn optional_date(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {s}"))),
    }
}

fn normalize_symbol(symbol: Option<String>) -> Option<String> {
    symbol
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
}

async fn load_owned(state: &AppState, auth: &AuthUser, id: &str) -> Result<Investment> {
    let investment: Investment = state
        .db
        .get(collections::INVESTMENTS, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No investment found with id {}", id)))?;
    ensure_access(auth, &investment.user_id)?;
    Ok(investment)
}

/// Recompute metrics, stamp and persist.
async fn save(state: &AppState, investment: &mut Investment) -> Result<()> {
    investment.calculate_metrics();
    investment.last_updated = Utc::now();
    state
        .db
        .set(collections::INVESTMENTS, &investment.id, &*investment)
        .await?;
    state.chatbot.invalidate_user(&investment.user_id);
    Ok(())
}

// ─── Portfolio ───────────────────────────────────────────────

async fn list_investments(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Single<Vec<Investment>>>> {
    Ok(response::ok(
        investments::load(&state.db, &auth.user_id).await?,
    ))
}

async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Single<InvestmentSummary>>> {
    let all = investments::load(&state.db, &auth.user_id).await?;
    Ok(response::ok(investments::summarize(&all)))
}

async fn by_type(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(raw_type): Path<String>,
) -> Result<Json<Single<Vec<Investment>>>> {
    let investment_type = InvestmentType::parse(&raw_type)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown investment type: {raw_type}")))?;
    let matching: Vec<Investment> = investments::load(&state.db, &auth.user_id)
        .await?
        .into_iter()
        .filter(|i| i.investment_type == investment_type)
        .collect();
    Ok(response::ok(matching))
}

#[derive(Debug, Deserialize)]
pub struct PriceUpdate {
    pub id: String,
    pub current_price: f64,
}

#[derive(Debug, Serialize)]
pub struct BatchUpdateResult {
    pub updated: usize,
}

async fn batch_update_price(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(updates): Json<Vec<PriceUpdate>>,
) -> Result<Json<Single<BatchUpdateResult>>> {
    if updates.is_empty() {
        return Err(AppError::BadRequest("No price updates given".to_string()));
    }
    if let Some(bad) = updates.iter().find(|u| u.current_price < 0.0) {
        return Err(AppError::BadRequest(format!(
            "Price for {} cannot be negative",
            bad.id
        )));
    }

    let mut updated = 0;
    for update in updates {
        let Some(mut investment): Option<Investment> =
            state.db.get(collections::INVESTMENTS, &update.id).await?
        else {
            continue;
        };
        // Only the caller's own positions are touched, even for admins.
        if investment.user_id != auth.user_id {
            continue;
        }
        investment.current_price = update.current_price;
        save(&state, &mut investment).await?;
        updated += 1;
    }

    tracing::info!(user_id = %auth.user_id, updated, "Investment prices updated");
    Ok(response::ok(BatchUpdateResult { updated }))
}

// ─── Single investment ───────────────────────────────────────

async fn get_investment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Single<Investment>>> {
    Ok(response::ok(load_owned(&state, &auth, &id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvestmentRequest {
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    #[validate(length(min = 1, max = 200, message = "is required"))]
    pub name: String,
    #[validate(length(max = 20))]
    pub symbol: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "cannot be negative"))]
    pub current_price: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "cannot be negative"))]
    pub initial_investment: f64,
    pub quantity: Option<f64>,
    pub purchase_price: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "cannot be negative"))]
    pub fee: f64,
    pub start_date: Option<String>,
    pub details: Option<serde_json::Value>,
    pub notes: Option<String>,
}

async fn create_investment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateInvestmentRequest>,
) -> Result<(StatusCode, Json<Single<Investment>>)> {
    req.validate()?;
    let now = Utc::now();
    let start = optional_date(req.start_date.as_deref())?.unwrap_or(now);

    let opening = investments::initial_transaction(
        req.investment_type,
        req.initial_investment,
        req.quantity,
        req.purchase_price,
        req.current_price,
        req.fee,
        start,
    );
    let mut investment = Investment {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: auth.user_id.clone(),
        investment_type: req.investment_type,
        name: req.name.trim().to_string(),
        symbol: normalize_symbol(req.symbol),
        category: req.category,
        current_price: req.current_price,
        transactions: opening.into_iter().collect(),
        details: req.details,
        notes: req.notes,
        total_quantity: 0.0,
        total_invested: 0.0,
        interest_earned: 0.0,
        current_value: 0.0,
        profit_loss: 0.0,
        roi: 0.0,
        last_interest_accrual: None,
        last_updated: now,
        created_at: now,
    };
    save(&state, &mut investment).await?;
    tracing::info!(
        user_id = %auth.user_id,
        investment_id = %investment.id,
        kind = investment.investment_type.as_str(),
        "Investment created"
    );

    Ok(response::created(investment))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInvestmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 20))]
    pub symbol: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0.0, message = "cannot be negative"))]
    pub current_price: Option<f64>,
    pub details: Option<serde_json::Value>,
    pub notes: Option<String>,
}

async fn update_investment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateInvestmentRequest>,
) -> Result<Json<Single<Investment>>> {
    req.validate()?;
    let mut investment = load_owned(&state, &auth, &id).await?;

    if let Some(name) = req.name {
        investment.name = name.trim().to_string();
    }
    if req.symbol.is_some() {
        investment.symbol = normalize_symbol(req.symbol);
    }
    if let Some(category) = req.category {
        investment.category = Some(category);
    }
    if let Some(price) = req.current_price {
        investment.current_price = price;
    }
    if let Some(details) = req.details {
        investment.details = Some(details);
    }
    if let Some(notes) = req.notes {
        investment.notes = Some(notes);
    }
    save(&state, &mut investment).await?;
    Ok(response::ok(investment))
}

async fn delete_investment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let investment = load_owned(&state, &auth, &id).await?;
    state
        .db
        .delete(collections::INVESTMENTS, &investment.id)
        .await?;
    state.chatbot.invalidate_user(&investment.user_id);
    tracing::info!(user_id = %auth.user_id, investment_id = %id, "Investment deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Ledger ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub kind: InvestmentTransactionType,
    pub amount: Option<f64>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    #[serde(default)]
    pub fee: f64,
    pub date: Option<String>,
    pub notes: Option<String>,
}

async fn add_transaction(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<Single<Investment>>)> {
    let mut investment = load_owned(&state, &auth, &id).await?;
    let date = optional_date(req.date.as_deref())?;
    let transaction = investments::build_transaction(
        &investment,
        NewTransaction {
            kind: req.kind,
            amount: req.amount,
            price: req.price,
            quantity: req.quantity,
            fee: req.fee,
            date,
            notes: req.notes,
        },
        Utc::now(),
    )?;

    investment.transactions.push(transaction);
    save(&state, &mut investment).await?;
    Ok(response::created(investment))
}

async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((id, transaction_id)): Path<(String, String)>,
) -> Result<Json<Single<Investment>>> {
    let mut investment = load_owned(&state, &auth, &id).await?;
    let before = investment.transactions.len();
    investment.transactions.retain(|t| t.id != transaction_id);
    if investment.transactions.len() == before {
        return Err(AppError::NotFound(format!(
            "No transaction found with id {}",
            transaction_id
        )));
    }
    save(&state, &mut investment).await?;
    Ok(response::ok(investment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_is_uppercased() {
        assert_eq!(normalize_symbol(Some(" vnm ".into())), Some("VNM".into()));
        assert_eq!(normalize_symbol(Some("  ".into())), None);
        assert_eq!(normalize_symbol(None), None);
    }
}
