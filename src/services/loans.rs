// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loan repayment tracking.
//!
//! A loan's status is never trusted from storage. It is recomputed from its
//! payments whenever the loan is read, and written back when it drifted.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::{Loan, LoanPayment, LoanStatus, LoanView};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

pub async fn load(db: &FirestoreDb, user_id: &str) -> Result<Vec<Loan>, AppError> {
    db.list_by_field(collections::LOANS, "user_id", user_id).await
}

/// Payments for one loan, newest first.
pub async fn payments_for(db: &FirestoreDb, loan_id: &str) -> Result<Vec<LoanPayment>, AppError> {
    let mut payments: Vec<LoanPayment> = db
        .list_by_field(collections::LOAN_PAYMENTS, "loan_id", loan_id)
        .await?;
    payments.sort_by(|a, b| {
        b.payment_date
            .cmp(&a.payment_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    Ok(payments)
}

/// All of a user's payments grouped by loan id.
pub async fn payments_by_loan(
    db: &FirestoreDb,
    user_id: &str,
) -> Result<HashMap<String, Vec<LoanPayment>>, AppError> {
    let payments: Vec<LoanPayment> = db
        .list_by_field(collections::LOAN_PAYMENTS, "user_id", user_id)
        .await?;
    let mut grouped: HashMap<String, Vec<LoanPayment>> = HashMap::new();
    for p in payments {
        grouped.entry(p.loan_id.clone()).or_default().push(p);
    }
    Ok(grouped)
}

pub fn total_paid(payments: &[LoanPayment]) -> f64 {
    payments.iter().map(|p| p.amount).sum()
}

/// Reject a payment that would push the total paid past the loan amount.
pub fn validate_payment(loan: &Loan, already_paid: f64, amount: f64) -> Result<(), AppError> {
    if amount <= 0.0 {
        return Err(AppError::BadRequest(
            "Payment amount must be greater than 0".to_string(),
        ));
    }
    if already_paid + amount > loan.amount {
        return Err(AppError::BadRequest(format!(
            "Payment exceeds loan amount (remaining {})",
            (loan.amount - already_paid).max(0.0)
        )));
    }
    Ok(())
}

/// Refresh the loan's status, persisting it if it changed, and build its view.
pub async fn refreshed_view(
    db: &FirestoreDb,
    mut loan: Loan,
    paid: f64,
    now: DateTime<Utc>,
) -> Result<LoanView, AppError> {
    if loan.refresh_status(paid, now) {
        loan.updated_at = now;
        db.set(collections::LOANS, &loan.id, &loan).await?;
        tracing::debug!(loan_id = %loan.id, status = loan.status.as_str(), "Loan status updated");
    }
    Ok(LoanView::new(loan, paid, now))
}

/// Every loan of a user as a view, newest first, optionally filtered by status.
pub async fn list_views(
    db: &FirestoreDb,
    user_id: &str,
    status: Option<LoanStatus>,
    now: DateTime<Utc>,
) -> Result<Vec<LoanView>, AppError> {
    let loans = load(db, user_id).await?;
    let payments = payments_by_loan(db, user_id).await?;

    let mut result = Vec::with_capacity(loans.len());
    for loan in loans {
        let paid = payments.get(&loan.id).map_or(0.0, |p| total_paid(p));
        let view = refreshed_view(db, loan, paid, now).await?;
        if status.is_none_or(|s| view.loan.status == s) {
            result.push(view);
        }
    }
    result.sort_by(|a, b| b.loan.created_at.cmp(&a.loan.created_at));
    Ok(result)
}

/// A single loan's view, after refreshing its status.
pub async fn view_of(db: &FirestoreDb, loan: Loan, now: DateTime<Utc>) -> Result<LoanView, AppError> {
    let paid = total_paid(&payments_for(db, &loan.id).await?);
    refreshed_view(db, loan, paid, now).await
}

/// Delete a loan together with its payments.
pub async fn delete_with_payments(db: &FirestoreDb, loan_id: &str) -> Result<usize, AppError> {
    let ids: Vec<String> = payments_for(db, loan_id)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    let removed = db.delete_many(collections::LOAN_PAYMENTS, &ids).await?;
    db.delete(collections::LOANS, loan_id).await?;
    Ok(removed)
}

/// Distinct lender names, sorted.
pub fn distinct_lenders(loans: &[Loan]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut result: Vec<String> = loans
        .iter()
        .map(|l| l.lender.trim())
        .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect();
    result.sort_by_key(|l| l.to_lowercase());
    result
}
