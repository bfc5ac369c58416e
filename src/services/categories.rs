// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Income and expense categories.
//!
//! Every user starts with a default set per kind. Records store the
//! category by name, so deleting or renaming a category moves the
//! affected records along with it.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::{category_collection, Budget, Category, TransactionKind};
use crate::services::{budgets, ledger};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Default category that absorbs records of a deleted one.
pub const FALLBACK_CATEGORY: &str = "Khác";

/// Group used for categories without one.
const UNGROUPED: &str = "other";

struct DefaultCategory {
    name: &'static str,
    icon: &'static str,
    color: &'static str,
    group: &'static str,
}

const fn default_category(
    name: &'static str,
    icon: &'static str,
    color: &'static str,
    group: &'static str,
) -> DefaultCategory {
    DefaultCategory {
        name,
        icon,
        color,
        group,
    }
}

const EXPENSE_DEFAULTS: &[DefaultCategory] = &[
    default_category("Ăn uống", "utensils", "#F59E0B", "daily"),
    default_category("Di chuyển", "car", "#10B981", "daily"),
    default_category("Mua sắm", "shopping-bag", "#EC4899", "shopping"),
    default_category("Hóa đơn", "file-invoice", "#6366F1", "bills"),
    default_category("Giải trí", "film", "#8B5CF6", "entertainment"),
    default_category("Sức khỏe", "heartbeat", "#EF4444", "health"),
    default_category("Giáo dục", "book", "#0891B2", "education"),
    default_category(FALLBACK_CATEGORY, "ellipsis-h", "#6B7280", UNGROUPED),
];

const INCOME_DEFAULTS: &[DefaultCategory] = &[
    default_category("Lương", "money-check-alt", "#10B981", "income"),
    default_category("Thưởng", "gift", "#6366F1", "income"),
    default_category("Đầu tư", "chart-line", "#F59E0B", "investment"),
    default_category("Kinh doanh", "store", "#E74C3C", "business"),
    default_category(FALLBACK_CATEGORY, "ellipsis-h", "#6B7280", UNGROUPED),
];

fn defaults(kind: TransactionKind) -> &'static [DefaultCategory] {
    match kind {
        TransactionKind::Income => INCOME_DEFAULTS,
        TransactionKind::Expense => EXPENSE_DEFAULTS,
    }
}

/// The user's categories: defaults first, then by name.
pub async fn load(
    db: &FirestoreDb,
    kind: TransactionKind,
    user_id: &str,
) -> Result<Vec<Category>, AppError> {
    let mut categories: Vec<Category> = db
        .list_by_field(category_collection(kind), "user_id", user_id)
        .await?;
    sort(&mut categories);
    Ok(categories)
}

fn sort(categories: &mut [Category]) {
    categories.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

/// Categories keyed by group, each group sorted by name.
pub fn grouped(categories: Vec<Category>) -> BTreeMap<String, Vec<Category>> {
    let mut groups: BTreeMap<String, Vec<Category>> = BTreeMap::new();
    for category in categories {
        let key = category
            .group
            .clone()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| UNGROUPED.to_string());
        groups.entry(key).or_default().push(category);
    }
    for members in groups.values_mut() {
        members.sort_by_key(|c| c.name.to_lowercase());
    }
    groups
}

/// Create the default set for a user.
pub async fn seed_defaults(
    db: &FirestoreDb,
    kind: TransactionKind,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Category>, AppError> {
    let mut created = Vec::with_capacity(defaults(kind).len());
    for d in defaults(kind) {
        let category = Category {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: d.name.to_string(),
            icon: d.icon.to_string(),
            color: d.color.to_string(),
            is_default: true,
            group: Some(d.group.to_string()),
            created_at: now,
            updated_at: now,
        };
        db.set(category_collection(kind), &category.id, &category)
            .await?;
        created.push(category);
    }
    tracing::debug!(user_id, kind = kind.as_str(), count = created.len(), "Default categories created");
    Ok(created)
}

/// Replace the user's default categories with a fresh set.
///
/// Custom categories are kept. A custom category that shares a name with
/// a default is dropped in favour of the default.
pub async fn reset_defaults(
    db: &FirestoreDb,
    kind: TransactionKind,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Category>, AppError> {
    let existing = load(db, kind, user_id).await?;
    let stale: Vec<String> = existing
        .into_iter()
        .filter(|c| {
            c.is_default
                || defaults(kind)
                    .iter()
                    .any(|d| ledger::same_category(d.name, &c.name))
        })
        .map(|c| c.id)
        .collect();
    db.delete_many(category_collection(kind), &stale).await?;
    seed_defaults(db, kind, user_id, now).await?;
    load(db, kind, user_id).await
}

/// Reject a name already used by another of the user's categories.
pub fn ensure_unique_name(
    categories: &[Category],
    name: &str,
    except_id: Option<&str>,
) -> Result<(), AppError> {
    let clash = categories
        .iter()
        .any(|c| Some(c.id.as_str()) != except_id && ledger::same_category(&c.name, name));
    if clash {
        return Err(AppError::BadRequest(
            "A category with this name already exists".to_string(),
        ));
    }
    Ok(())
}

/// Move every record filed under `from` to `to`. Returns how many
/// records changed.
///
/// For expenses, budgets follow as well. A budget that would clash with
/// an existing budget for `to` in the same month is removed.
pub async fn reassign(
    db: &FirestoreDb,
    kind: TransactionKind,
    user_id: &str,
    from: &str,
    to: &str,
) -> Result<usize, AppError> {
    let now = Utc::now();
    let mut changed = 0;
    for mut entry in ledger::load(db, kind, user_id).await? {
        if ledger::same_category(&entry.category, from) {
            entry.category = to.to_string();
            entry.updated_at = now;
            db.set(kind.collection(), &entry.id, &entry).await?;
            changed += 1;
        }
    }

    if kind == TransactionKind::Expense {
        let all = budgets::load(db, user_id).await?;
        let (moving, staying): (Vec<Budget>, Vec<Budget>) = all
            .into_iter()
            .partition(|b| ledger::same_category(&b.category, from));
        for mut budget in moving {
            let clash = staying.iter().any(|b| {
                b.year == budget.year
                    && b.month == budget.month
                    && ledger::same_category(&b.category, to)
            });
            if clash {
                db.delete(collections::BUDGETS, &budget.id).await?;
                tracing::info!(user_id, budget_id = %budget.id, "Budget merged into existing one");
            } else {
                budget.category = to.to_string();
                budget.updated_at = now;
                db.set(collections::BUDGETS, &budget.id, &budget).await?;
            }
            changed += 1;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ledger::tests::entry;

    fn budget(id: &str, category: &str, month: u32) -> Budget {
        let now = Utc::now();
        Budget {
            id: id.to_string(),
            user_id: "u1".to_string(),
            category: category.to_string(),
            amount: 1_000_000.0,
            month,
            year: 2026,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_seed_and_load_puts_defaults_first() {
        let db = FirestoreDb::new_in_memory();
        seed_defaults(&db, TransactionKind::Expense, "u1", Utc::now()).await.unwrap();
        let now = Utc::now();
        let custom = Category {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            name: "Aquarium".to_string(),
            icon: "tag".to_string(),
            color: "#6c757d".to_string(),
            is_default: false,
            group: None,
            created_at: now,
            updated_at: now,
        };
        db.set(collections::EXPENSE_CATEGORIES, "c1", &custom).await.unwrap();

        let all = load(&db, TransactionKind::Expense, "u1").await.unwrap();
        assert_eq!(all.len(), EXPENSE_DEFAULTS.len() + 1);
        assert_eq!(all.last().unwrap().name, "Aquarium");
        assert!(all.iter().any(|c| c.name == FALLBACK_CATEGORY));

        assert!(load(&db, TransactionKind::Income, "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_restores_deleted_default() {
        let db = FirestoreDb::new_in_memory();
        let seeded = seed_defaults(&db, TransactionKind::Income, "u1", Utc::now()).await.unwrap();
        db.delete(collections::INCOME_CATEGORIES, &seeded[0].id).await.unwrap();

        let after = reset_defaults(&db, TransactionKind::Income, "u1", Utc::now()).await.unwrap();
        assert_eq!(after.len(), INCOME_DEFAULTS.len());
        assert!(after.iter().any(|c| c.name == "Lương"));
    }

    #[test]
    fn test_unique_name_ignores_case_and_self() {
        let now = Utc::now();
        let cats = vec![Category {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            name: "Coffee".to_string(),
            icon: "tag".to_string(),
            color: "#000".to_string(),
            is_default: false,
            group: Some("daily".to_string()),
            created_at: now,
            updated_at: now,
        }];
        assert!(ensure_unique_name(&cats, " coffee", None).is_err());
        assert!(ensure_unique_name(&cats, "coffee", Some("c1")).is_ok());
        assert!(ensure_unique_name(&cats, "Tea", None).is_ok());

        let groups = grouped(cats);
        assert_eq!(groups["daily"].len(), 1);
    }

    #[tokio::test]
    async fn test_reassign_moves_expenses_and_budgets() {
        let db = FirestoreDb::new_in_memory();
        db.set(collections::EXPENSES, "e1", &entry("e1", 10.0, "Coffee", 2026, 3, 1)).await.unwrap();
        db.set(collections::EXPENSES, "e2", &entry("e2", 20.0, "Rent", 2026, 3, 1)).await.unwrap();
        db.set(collections::BUDGETS, "b1", &budget("b1", "coffee", 3)).await.unwrap();
        db.set(collections::BUDGETS, "b2", &budget("b2", "Coffee", 4)).await.unwrap();
        db.set(collections::BUDGETS, "b3", &budget("b3", FALLBACK_CATEGORY, 4)).await.unwrap();

        let changed = reassign(&db, TransactionKind::Expense, "u1", "Coffee", FALLBACK_CATEGORY)
            .await
            .unwrap();
        assert_eq!(changed, 3);

        let expenses = ledger::load(&db, TransactionKind::Expense, "u1").await.unwrap();
        assert_eq!(
            expenses.iter().filter(|e| e.category == FALLBACK_CATEGORY).count(),
            1
        );
        let left = budgets::load(&db, "u1").await.unwrap();
        assert_eq!(left.len(), 2);
        assert!(left.iter().all(|b| b.category == FALLBACK_CATEGORY));
    }
}
