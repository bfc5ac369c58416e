// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Income/expense queries and aggregates.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{CategoryTotal, Transaction, TransactionKind};
use crate::time_utils::in_month;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

/// Filter applied to a user's entries before listing or aggregating.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Empty means all categories
    pub categories: Vec<String>,
}

impl TransactionFilter {
    pub fn matches(&self, t: &Transaction) -> bool {
        if self.start.is_some_and(|start| t.date < start) {
            return false;
        }
        if self.end.is_some_and(|end| t.date > end) {
            return false;
        }
        self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|c| same_category(c, &t.category))
    }
}

/// Category names compare case-insensitively, ignoring surrounding space.
pub fn same_category(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// All entries of one kind owned by a user.
pub async fn load(
    db: &FirestoreDb,
    kind: TransactionKind,
    user_id: &str,
) -> Result<Vec<Transaction>, AppError> {
    db.list_by_field(kind.collection(), "user_id", user_id).await
}

/// Matching entries, newest first.
pub fn filter_sorted(entries: Vec<Transaction>, filter: &TransactionFilter) -> Vec<Transaction> {
    let mut matching: Vec<Transaction> = entries.into_iter().filter(|t| filter.matches(t)).collect();
    sort_newest_first(&mut matching);
    matching
}

pub fn sort_newest_first(entries: &mut [Transaction]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
}

pub fn total_amount(entries: &[Transaction]) -> f64 {
    entries.iter().map(|t| t.amount).sum()
}

/// Sum of entries dated within the given month.
pub fn monthly_total(entries: &[Transaction], year: i32, month: u32) -> f64 {
    entries
        .iter()
        .filter(|t| in_month(t.date, year, month))
        .map(|t| t.amount)
        .sum()
}

/// Totals per category, largest first.
pub fn by_category(entries: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<String, CategoryTotal> = HashMap::new();
    for t in entries {
        let key = t.category.trim().to_lowercase();
        let slot = totals.entry(key).or_insert_with(|| CategoryTotal {
            category: t.category.trim().to_string(),
            total: 0.0,
            count: 0,
        });
        slot.total += t.amount;
        slot.count += 1;
    }

    let mut result: Vec<CategoryTotal> = totals.into_values().collect();
    result.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    result
}

/// Distinct category names, sorted.
pub fn distinct_categories(entries: &[Transaction]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut result = Vec::new();
    for t in entries {
        let name = t.category.trim();
        if !name.is_empty() && seen.insert(name.to_lowercase()) {
            result.push(name.to_string());
        }
    }
    result.sort_by_key(|c| c.to_lowercase());
    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn entry(id: &str, amount: f64, category: &str, y: i32, m: u32, d: u32) -> Transaction {
        let date = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
        Transaction {
            id: id.to_string(),
            user_id: "u1".to_string(),
            amount,
            description: format!("entry {id}"),
            category: category.to_string(),
            date,
            attachments: vec![],
            location: None,
            created_at: date,
            updated_at: date,
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            entry("a", 100_000.0, "Food", 2026, 3, 1),
            entry("b", 250_000.0, "Rent", 2026, 3, 5),
            entry("c", 50_000.0, "food ", 2026, 3, 20),
            entry("d", 70_000.0, "Transport", 2026, 2, 27),
        ]
    }

    #[test]
    fn test_filter_by_range_and_category() {
        let filter = TransactionFilter {
            start: Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()),
            end: None,
            categories: vec!["FOOD".to_string()],
        };
        let result = filter_sorted(sample(), &filter);
        let ids: Vec<&str> = result.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_monthly_total() {
        assert_eq!(monthly_total(&sample(), 2026, 3), 400_000.0);
        assert_eq!(monthly_total(&sample(), 2026, 2), 70_000.0);
        assert_eq!(monthly_total(&sample(), 2025, 3), 0.0);
    }

    #[test]
    fn test_by_category_merges_case_and_sorts() {
        let totals = by_category(&sample());
        assert_eq!(totals[0].category, "Rent");
        assert_eq!(totals[1].category, "Food");
        assert_eq!(totals[1].total, 150_000.0);
        assert_eq!(totals[1].count, 2);
        assert_eq!(totals.len(), 3);
    }

    #[test]
    fn test_distinct_categories() {
        assert_eq!(
            distinct_categories(&sample()),
            vec!["Food", "Rent", "Transport"]
        );
    }
}
