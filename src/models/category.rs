// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-defined income and expense categories.

use crate::db::collections;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TransactionKind;

/// A named category a user files incomes or expenses under.
///
/// Records refer to categories by name, so renaming or deleting one
/// rewrites the matching records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    /// Seeded at registration; cannot be renamed or deleted
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub group: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn category_collection(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Income => collections::INCOME_CATEGORIES,
        TransactionKind::Expense => collections::EXPENSE_CATEGORIES,
    }
}
