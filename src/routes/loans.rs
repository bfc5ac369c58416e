// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loan and loan payment routes.

use super::response::{self, ensure_access, Single};
use crate::db::collections;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{InterestRateType, Loan, LoanPayment, LoanStatus, LoanView};
use crate::services::{loans, notifications};
use crate::time_utils::parse_date;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/loans", get(list_loans).post(create_loan))
        .route("/api/loans/lenders", get(lenders))
        .route(
            "/api/loans/{id}",
            get(get_loan).put(update_loan).delete(delete_loan),
        )
        .route(
            "/api/loans/{id}/payments",
            get(list_payments).post(create_payment),
        )
        .route(
            "/api/loans/{id}/payments/{payment_id}",
            delete(delete_payment),
        )
}

fn required_date(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    parse_date(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid {field}: {raw}")))
}

async fn load_owned(state: &AppState, auth: &AuthUser, id: &str) -> Result<Loan> {
    let loan: Loan = state
        .db
        .get(collections::LOANS, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No loan found with id {}", id)))?;
    ensure_access(auth, &loan.user_id)?;
    Ok(loan)
}

/// Reminder check after a loan changed. Failures are only logged.
async fn check_due(state: &AppState, loan: &Loan) {
    if let Err(e) = notifications::check_loan_due(&state.db, loan, Utc::now()).await {
        tracing::warn!(error = %e, loan_id = %loan.id, "Loan due check failed");
    }
}

// ─── Loans ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
}

async fn list_loans(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<LoanQuery>,
) -> Result<Json<Single<Vec<LoanView>>>> {
    let views = loans::list_views(&state.db, &auth.user_id, query.status, Utc::now()).await?;
    Ok(response::ok(views))
}

async fn lenders(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Single<Vec<String>>>> {
    let all = loans::load(&state.db, &auth.user_id).await?;
    Ok(response::ok(loans::distinct_lenders(&all)))
}

async fn get_loan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Single<LoanView>>> {
    let loan = load_owned(&state, &auth, &id).await?;
    Ok(response::ok(loans::view_of(&state.db, loan, Utc::now()).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanRequest {
    #[validate(range(exclusive_min = 0.0, message = "must be positive"))]
    pub amount: f64,
    #[validate(length(min = 1, max = 500, message = "is required"))]
    pub description: String,
    #[validate(length(min = 1, max = 200, message = "is required"))]
    pub lender: String,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "cannot be negative"))]
    pub interest_rate: f64,
    #[serde(default)]
    pub interest_rate_type: InterestRateType,
    pub start_date: String,
    pub due_date: String,
}

async fn create_loan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<Single<LoanView>>)> {
    req.validate()?;
    let start_date = required_date(&req.start_date, "start_date")?;
    let due_date = required_date(&req.due_date, "due_date")?;
    if due_date < start_date {
        return Err(AppError::BadRequest(
            "Due date must not be before the start date".to_string(),
        ));
    }

    let now = Utc::now();
    let mut loan = Loan {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: auth.user_id.clone(),
        amount: req.amount,
        description: req.description.trim().to_string(),
        lender: req.lender.trim().to_string(),
        interest_rate: req.interest_rate,
        interest_rate_type: req.interest_rate_type,
        start_date,
        due_date,
        status: LoanStatus::Active,
        is_paid: false,
        created_at: now,
        updated_at: now,
    };
    loan.refresh_status(0.0, now);
    state.db.set(collections::LOANS, &loan.id, &loan).await?;
    tracing::info!(user_id = %auth.user_id, loan_id = %loan.id, "Loan created");

    state.chatbot.invalidate_user(&auth.user_id);
    if let Err(e) = notifications::notify_loan_created(&state.db, &loan).await {
        tracing::warn!(error = %e, loan_id = %loan.id, "Failed to create loan notification");
    }
    check_due(&state, &loan).await;

    Ok(response::created(LoanView::new(loan, 0.0, now)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLoanRequest {
    #[validate(range(exclusive_min = 0.0, message = "must be positive"))]
    pub amount: Option<f64>,
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub lender: Option<String>,
    #[validate(range(min = 0.0, message = "cannot be negative"))]
    pub interest_rate: Option<f64>,
    pub interest_rate_type: Option<InterestRateType>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
}

async fn update_loan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLoanRequest>,
) -> Result<Json<Single<LoanView>>> {
    req.validate()?;
    let mut loan = load_owned(&state, &auth, &id).await?;

    if let Some(amount) = req.amount {
        loan.amount = amount;
    }
    if let Some(description) = req.description {
        loan.description = description.trim().to_string();
    }
    if let Some(lender) = req.lender {
        loan.lender = lender.trim().to_string();
    }
    if let Some(rate) = req.interest_rate {
        loan.interest_rate = rate;
    }
    if let Some(rate_type) = req.interest_rate_type {
        loan.interest_rate_type = rate_type;
    }
    if let Some(raw) = req.start_date.as_deref() {
        loan.start_date = required_date(raw, "start_date")?;
    }
    if let Some(raw) = req.due_date.as_deref() {
        loan.due_date = required_date(raw, "due_date")?;
    }
    if loan.due_date < loan.start_date {
        return Err(AppError::BadRequest(
            "Due date must not be before the start date".to_string(),
        ));
    }

    let now = Utc::now();
    loan.updated_at = now;
    state.db.set(collections::LOANS, &loan.id, &loan).await?;
    let view = loans::view_of(&state.db, loan, now).await?;

    state.chatbot.invalidate_user(&view.loan.user_id);
    check_due(&state, &view.loan).await;
    Ok(response::ok(view))
}

async fn delete_loan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let loan = load_owned(&state, &auth, &id).await?;
    let payments = loans::delete_with_payments(&state.db, &loan.id).await?;
    state.chatbot.invalidate_user(&loan.user_id);
    tracing::info!(user_id = %auth.user_id, loan_id = %id, payments, "Loan deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Payments ────────────────────────────────────────────────

async fn list_payments(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Single<Vec<LoanPayment>>>> {
    let loan = load_owned(&state, &auth, &id).await?;
    Ok(response::ok(loans::payments_for(&state.db, &loan.id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub amount: f64,
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

async fn create_payment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Single<LoanPayment>>)> {
    req.validate()?;
    let loan = load_owned(&state, &auth, &id).await?;
    let existing = loans::payments_for(&state.db, &loan.id).await?;
    let already_paid = loans::total_paid(&existing);
    loans::validate_payment(&loan, already_paid, req.amount)?;

    let now = Utc::now();
    let payment_date = match req.payment_date.as_deref() {
        Some(raw) => required_date(raw, "payment_date")?,
        None => now,
    };
    let payment = LoanPayment {
        id: uuid::Uuid::new_v4().to_string(),
        loan_id: loan.id.clone(),
        user_id: loan.user_id.clone(),
        amount: req.amount,
        payment_date,
        description: req.description.filter(|d| !d.trim().is_empty()),
        created_at: now,
    };
    state
        .db
        .set(collections::LOAN_PAYMENTS, &payment.id, &payment)
        .await?;

    let view = loans::refreshed_view(&state.db, loan, already_paid + payment.amount, now).await?;
    tracing::info!(
        loan_id = %view.loan.id,
        amount = payment.amount,
        status = view.loan.status.as_str(),
        "Loan payment recorded"
    );

    state.chatbot.invalidate_user(&view.loan.user_id);
    if let Err(e) = notifications::notify_loan_payment(&state.db, &payment, &view.loan).await {
        tracing::warn!(error = %e, loan_id = %view.loan.id, "Failed to create payment notification");
    }

    Ok(response::created(payment))
}

async fn delete_payment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((id, payment_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let loan = load_owned(&state, &auth, &id).await?;
    let payment: LoanPayment = state
        .db
        .get(collections::LOAN_PAYMENTS, &payment_id)
        .await?
        .filter(|p: &LoanPayment| p.loan_id == loan.id)
        .ok_or_else(|| AppError::NotFound(format!("No payment found with id {}", payment_id)))?;

    state
        .db
        .delete(collections::LOAN_PAYMENTS, &payment.id)
        .await?;
    let view = loans::view_of(&state.db, loan, Utc::now()).await?;
    state.chatbot.invalidate_user(&view.loan.user_id);
    tracing::info!(
        loan_id = %view.loan.id,
        payment_id = %payment.id,
        status = view.loan.status.as_str(),
        "Loan payment deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
