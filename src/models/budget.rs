// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monthly per-category budgets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Spending limit for one category in one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub amount: f64,
    /// 1-12
    pub month: u32,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Budget with usage derived from the month's expenses.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetView {
    #[serde(flatten)]
    pub budget: Budget,
    pub spent: f64,
    pub remaining: f64,
    /// Rounded percentage of the limit used
    pub percentage: i64,
}

impl BudgetView {
    pub fn new(budget: Budget, spent: f64) -> Self {
        let percentage = usage_percent(spent, budget.amount);
        Self {
            remaining: budget.amount - spent,
            spent,
            percentage,
            budget,
        }
    }
}

/// `round(spent / limit * 100)`, 0 for a non-positive limit.
pub fn usage_percent(spent: f64, limit: f64) -> i64 {
    if limit <= 0.0 {
        return 0;
    }
    (spent / limit * 100.0).round() as i64
}
