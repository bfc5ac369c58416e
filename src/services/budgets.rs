// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Budget usage and statistics.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::budget::usage_percent;
use crate::models::{Budget, BudgetView, Transaction, TransactionKind};
use crate::services::ledger;
use crate::time_utils::in_month;
use serde::Serialize;

/// Usage above this percentage counts as "near the limit".
pub const NEAR_LIMIT_PERCENT: i64 = 80;

/// Aggregate usage across a month's budgets.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatistics {
    pub month: u32,
    pub year: i32,
    pub total_budget: f64,
    pub total_spent: f64,
    pub total_remaining: f64,
    pub percentage: i64,
    pub over_budget_count: usize,
    pub near_limit_count: usize,
    pub categories: Vec<BudgetView>,
}

/// Spending recorded against `category` in the given month.
pub fn spent_in(expenses: &[Transaction], category: &str, year: i32, month: u32) -> f64 {
    expenses
        .iter()
        .filter(|e| in_month(e.date, year, month) && ledger::same_category(&e.category, category))
        .map(|e| e.amount)
        .sum()
}

/// Attach derived usage to each budget.
pub fn views(budgets: Vec<Budget>, expenses: &[Transaction]) -> Vec<BudgetView> {
    budgets
        .into_iter()
        .map(|b| {
            let spent = spent_in(expenses, &b.category, b.year, b.month);
            BudgetView::new(b, spent)
        })
        .collect()
}

pub fn statistics(month: u32, year: i32, views: Vec<BudgetView>) -> BudgetStatistics {
    let total_budget: f64 = views.iter().map(|v| v.budget.amount).sum();
    let total_spent: f64 = views.iter().map(|v| v.spent).sum();
    let over_budget_count = views.iter().filter(|v| v.percentage >= 100).count();
    let near_limit_count = views
        .iter()
        .filter(|v| (NEAR_LIMIT_PERCENT..100).contains(&v.percentage))
        .count();

    BudgetStatistics {
        month,
        year,
        total_budget,
        total_spent,
        total_remaining: total_budget - total_spent,
        percentage: usage_percent(total_spent, total_budget),
        over_budget_count,
        near_limit_count,
        categories: views,
    }
}

pub async fn load(db: &FirestoreDb, user_id: &str) -> Result<Vec<Budget>, AppError> {
    db.list_by_field(collections::BUDGETS, "user_id", user_id).await
}

/// The user's budgets for one month with usage, sorted by category.
pub async fn month_views(
    db: &FirestoreDb,
    user_id: &str,
    year: i32,
    month: u32,
) -> Result<Vec<BudgetView>, AppError> {
    let mut budgets: Vec<Budget> = load(db, user_id)
        .await?
        .into_iter()
        .filter(|b| b.year == year && b.month == month)
        .collect();
    budgets.sort_by_key(|b| b.category.to_lowercase());

    let expenses = ledger::load(db, TransactionKind::Expense, user_id).await?;
    Ok(views(budgets, &expenses))
}

/// Reject a second budget for the same category and month.
///
/// `exclude_id` skips the budget being updated.
pub async fn ensure_unique(
    db: &FirestoreDb,
    user_id: &str,
    category: &str,
    year: i32,
    month: u32,
    exclude_id: Option<&str>,
) -> Result<(), AppError> {
    let clash = load(db, user_id).await?.into_iter().any(|b| {
        b.year == year
            && b.month == month
            && ledger::same_category(&b.category, category)
            && Some(b.id.as_str()) != exclude_id
    });
    if clash {
        return Err(AppError::BadRequest(format!(
            "A budget for '{}' already exists for {:02}/{}",
            category.trim(),
            month,
            year
        )));
    }
    Ok(())
}
