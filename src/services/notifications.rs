// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-app notifications and the automatic alerts raised by record changes.
//!
//! Alerts are written in the owner's language. Budget and loan alerts are
//! deduplicated: a budget or loan never carries more than one unread alert
//! of a given kind.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::{
    BudgetView, Language, Loan, LoanPayment, LoanStatus, Notification, NotificationType,
    Transaction, TransactionKind, User,
};
use crate::services::chatbot::calculator::format_vnd;
use crate::services::{budgets, ledger};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde_json::json;

/// Read notifications older than this are purged when the list is fetched.
pub const READ_RETENTION_DAYS: i64 = 30;

/// A loan due within this many days raises a reminder.
pub const LOAN_DUE_WINDOW_DAYS: i64 = 3;

pub const BUDGET_WARNING_PERCENT: i64 = 80;

/// Persist a notification.
pub async fn create(db: &FirestoreDb, notification: &Notification) -> Result<(), AppError> {
    db.set(collections::NOTIFICATIONS, &notification.id, notification)
        .await?;
    tracing::debug!(
        user_id = %notification.user_id,
        kind = ?notification.kind,
        "Notification created"
    );
    Ok(())
}

/// All notifications of a user, newest first.
pub async fn load(db: &FirestoreDb, user_id: &str) -> Result<Vec<Notification>, AppError> {
    let mut list: Vec<Notification> = db
        .list_by_field(collections::NOTIFICATIONS, "user_id", user_id)
        .await?;
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(list)
}

/// Delete read notifications older than the retention window, then list.
pub async fn list_after_purge(
    db: &FirestoreDb,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Notification>, AppError> {
    let cutoff = now - Duration::days(READ_RETENTION_DAYS);
    let (stale, kept): (Vec<Notification>, Vec<Notification>) = load(db, user_id)
        .await?
        .into_iter()
        .partition(|n| n.read && n.created_at < cutoff);

    if !stale.is_empty() {
        let ids: Vec<String> = stale.into_iter().map(|n| n.id).collect();
        let removed = db.delete_many(collections::NOTIFICATIONS, &ids).await?;
        tracing::info!(user_id = %user_id, removed, "Purged old read notifications");
    }
    Ok(kept)
}

/// Delete every read notification. Returns how many were removed.
pub async fn delete_read(db: &FirestoreDb, user_id: &str) -> Result<usize, AppError> {
    let ids: Vec<String> = load(db, user_id)
        .await?
        .into_iter()
        .filter(|n| n.read)
        .map(|n| n.id)
        .collect();
    db.delete_many(collections::NOTIFICATIONS, &ids).await
}

/// Mark every unread notification as read. Returns how many changed.
pub async fn mark_all_read(db: &FirestoreDb, user_id: &str) -> Result<usize, AppError> {
    let mut count = 0;
    for mut n in load(db, user_id).await?.into_iter().filter(|n| !n.read) {
        n.read = true;
        db.set(collections::NOTIFICATIONS, &n.id, &n).await?;
        count += 1;
    }
    Ok(count)
}

/// The user's preferred language, falling back to Vietnamese.
pub async fn user_language(db: &FirestoreDb, user_id: &str) -> Result<Language, AppError> {
    Ok(db
        .get_user(user_id)
        .await?
        .map(|u| u.language)
        .unwrap_or_default())
}

async fn owner(db: &FirestoreDb, user_id: &str) -> Result<Option<User>, AppError> {
    db.get_user(user_id).await
}

/// Unread notifications of `kind` that reference `(key, id)` in their data.
async fn unread_for(
    db: &FirestoreDb,
    user_id: &str,
    kind: NotificationType,
    key: &str,
    id: &str,
) -> Result<Vec<Notification>, AppError> {
    Ok(load(db, user_id)
        .await?
        .into_iter()
        .filter(|n| !n.read && n.kind == kind && n.data_str(key) == Some(id))
        .collect())
}

// ─── Record notifications ────────────────────────────────────

/// Confirmation for a newly added income or expense.
pub async fn notify_transaction(
    db: &FirestoreDb,
    kind: TransactionKind,
    entry: &Transaction,
) -> Result<Notification, AppError> {
    let lang = user_language(db, &entry.user_id).await?;
    let amount = format_vnd(entry.amount);
    let (title, message) = match (kind, lang) {
        (TransactionKind::Income, Language::Vi) => (
            "Thu nhập mới".to_string(),
            format!("Bạn đã thêm khoản thu nhập \"{}\" với số tiền {}", entry.description, amount),
        ),
        (TransactionKind::Income, Language::En) => (
            "New income".to_string(),
            format!("You added the income \"{}\" of {}", entry.description, amount),
        ),
        (TransactionKind::Expense, Language::Vi) => (
            "Chi tiêu mới".to_string(),
            format!("Bạn đã thêm khoản chi tiêu \"{}\" với số tiền {}", entry.description, amount),
        ),
        (TransactionKind::Expense, Language::En) => (
            "New expense".to_string(),
            format!("You added the expense \"{}\" of {}", entry.description, amount),
        ),
    };
    let notification_type = match kind {
        TransactionKind::Income => NotificationType::Income,
        TransactionKind::Expense => NotificationType::Expense,
    };
    let notification = Notification::new(&entry.user_id, notification_type, title, message)
        .with_link(format!("/{}s?highlight={}", kind.as_str(), entry.id))
        .with_data(json!({ "model": kind.as_str(), "id": entry.id }));
    create(db, &notification).await?;
    Ok(notification)
}

pub async fn notify_loan_created(db: &FirestoreDb, loan: &Loan) -> Result<Notification, AppError> {
    let lang = user_language(db, &loan.user_id).await?;
    let amount = format_vnd(loan.amount);
    let (title, message) = match lang {
        Language::Vi => (
            "Khoản vay mới".to_string(),
            format!(
                "Bạn đã thêm khoản vay \"{}\" với số tiền {} từ {}",
                loan.description, amount, loan.lender
            ),
        ),
        Language::En => (
            "New loan".to_string(),
            format!(
                "You added the loan \"{}\" of {} from {}",
                loan.description, amount, loan.lender
            ),
        ),
    };
    let notification = Notification::new(&loan.user_id, NotificationType::Loan, title, message)
        .with_link(format!("/loans?highlight={}", loan.id))
        .with_data(json!({ "model": "loan", "loan_id": loan.id }));
    create(db, &notification).await?;
    Ok(notification)
}

pub async fn notify_loan_payment(
    db: &FirestoreDb,
    payment: &LoanPayment,
    loan: &Loan,
) -> Result<Notification, AppError> {
    let lang = user_language(db, &loan.user_id).await?;
    let amount = format_vnd(payment.amount);
    let (title, message) = match lang {
        Language::Vi => (
            "Thanh toán khoản vay".to_string(),
            format!("Bạn đã thanh toán {} cho khoản vay \"{}\"", amount, loan.description),
        ),
        Language::En => (
            "Loan payment".to_string(),
            format!("You paid {} toward the loan \"{}\"", amount, loan.description),
        ),
    };
    let notification =
        Notification::new(&loan.user_id, NotificationType::LoanPayment, title, message)
            .with_link(format!("/loans/{}", loan.id))
            .with_data(json!({
                "model": "loan_payment",
                "id": payment.id,
                "loan_id": loan.id,
            }));
    create(db, &notification).await?;
    Ok(notification)
}

// ─── Automatic alerts ────────────────────────────────────────

/// Raise warning or over-budget alerts for the month of `date`.
///
/// Only budgets matching `category` are checked. Returns the alerts created.
pub async fn check_budget_alerts(
    db: &FirestoreDb,
    user_id: &str,
    category: &str,
    date: DateTime<Utc>,
) -> Result<Vec<Notification>, AppError> {
    let Some(user) = owner(db, user_id).await? else {
        return Ok(Vec::new());
    };
    if !user.settings.budget_alerts {
        return Ok(Vec::new());
    }

    let views = budgets::month_views(db, user_id, date.year(), date.month()).await?;
    let mut created = Vec::new();
    for view in views
        .into_iter()
        .filter(|v| ledger::same_category(&v.budget.category, category))
    {
        if let Some(n) = budget_alert(db, &user, &view).await? {
            created.push(n);
        }
    }
    Ok(created)
}

async fn budget_alert(
    db: &FirestoreDb,
    user: &User,
    view: &BudgetView,
) -> Result<Option<Notification>, AppError> {
    let level = if view.percentage >= 100 {
        "over"
    } else if view.percentage >= BUDGET_WARNING_PERCENT {
        "warning"
    } else {
        return Ok(None);
    };

    let budget = &view.budget;
    let existing = unread_for(db, &user.id, NotificationType::BudgetAlert, "budget_id", &budget.id).await?;
    if existing.iter().any(|n| n.data_str("level") == Some(level)) {
        return Ok(None);
    }
    // An escalation replaces the earlier unread alert.
    let stale: Vec<String> = existing.into_iter().map(|n| n.id).collect();
    db.delete_many(collections::NOTIFICATIONS, &stale).await?;

    let (title, message) = match (user.language, level) {
        (Language::Vi, "over") => (
            "Vượt ngân sách".to_string(),
            format!(
                "Bạn đã sử dụng {}% ngân sách \"{}\" trong tháng {}/{}.",
                view.percentage, budget.category, budget.month, budget.year
            ),
        ),
        (Language::Vi, _) => (
            "Cảnh báo ngân sách".to_string(),
            format!(
                "Bạn đã sử dụng {}% ngân sách \"{}\" trong tháng {}/{}.",
                view.percentage, budget.category, budget.month, budget.year
            ),
        ),
        (Language::En, "over") => (
            "Budget exceeded".to_string(),
            format!(
                "You have used {}% of the \"{}\" budget for {}/{}.",
                view.percentage, budget.category, budget.month, budget.year
            ),
        ),
        (Language::En, _) => (
            "Budget warning".to_string(),
            format!(
                "You have used {}% of the \"{}\" budget for {}/{}.",
                view.percentage, budget.category, budget.month, budget.year
            ),
        ),
    };

    let notification = Notification::new(&user.id, NotificationType::BudgetAlert, title, message)
        .with_link(format!("/budgets/{}", budget.id))
        .with_data(json!({
            "budget_id": budget.id,
            "level": level,
            "percentage": view.percentage,
        }));
    create(db, &notification).await?;
    tracing::info!(user_id = %user.id, budget_id = %budget.id, level, "Budget alert raised");
    Ok(Some(notification))
}

/// Raise a due-soon or overdue reminder for one loan.
pub async fn check_loan_due(
    db: &FirestoreDb,
    loan: &Loan,
    now: DateTime<Utc>,
) -> Result<Option<Notification>, AppError> {
    let secs = (loan.due_date - now).num_seconds();
    let days = (secs as f64 / 86_400.0).ceil() as i64;

    let kind = match loan.status {
        LoanStatus::Active if days > 0 && days <= LOAN_DUE_WINDOW_DAYS => NotificationType::LoanDue,
        LoanStatus::Overdue => NotificationType::LoanOverdue,
        _ => return Ok(None),
    };

    let Some(user) = owner(db, &loan.user_id).await? else {
        return Ok(None);
    };
    if !user.settings.loan_reminders {
        return Ok(None);
    }
    if !unread_for(db, &user.id, kind, "loan_id", &loan.id).await?.is_empty() {
        return Ok(None);
    }

    let overdue_days = (-days).max(0);
    let (title, message) = match (user.language, kind) {
        (Language::Vi, NotificationType::LoanDue) => (
            "Khoản vay sắp đến hạn".to_string(),
            format!("Khoản vay \"{}\" sẽ đến hạn trong {} ngày.", loan.description, days),
        ),
        (Language::Vi, _) => (
            "Khoản vay quá hạn".to_string(),
            format!("Khoản vay \"{}\" đã quá hạn {} ngày.", loan.description, overdue_days),
        ),
        (Language::En, NotificationType::LoanDue) => (
            "Loan due soon".to_string(),
            format!("The loan \"{}\" is due in {} day(s).", loan.description, days),
        ),
        (Language::En, _) => (
            "Loan overdue".to_string(),
            format!("The loan \"{}\" is {} day(s) overdue.", loan.description, overdue_days),
        ),
    };

    let notification = Notification::new(&user.id, kind, title, message)
        .with_link(format!("/loans/{}", loan.id))
        .with_data(json!({ "model": "loan", "loan_id": loan.id }));
    create(db, &notification).await?;
    Ok(Some(notification))
}

/// Result of a balance check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BalanceCheck {
    pub balance: f64,
    pub is_negative: bool,
    pub notification: Option<Notification>,
}

/// All-time income minus expenses, alerting once while it stays negative.
pub async fn check_negative_balance(
    db: &FirestoreDb,
    user_id: &str,
) -> Result<BalanceCheck, AppError> {
    let incomes = ledger::load(db, TransactionKind::Income, user_id).await?;
    let expenses = ledger::load(db, TransactionKind::Expense, user_id).await?;
    let balance = ledger::total_amount(&incomes) - ledger::total_amount(&expenses);

    if balance >= 0.0 {
        return Ok(BalanceCheck {
            balance,
            is_negative: false,
            notification: None,
        });
    }

    let existing: Vec<Notification> = load(db, user_id)
        .await?
        .into_iter()
        .filter(|n| n.kind == NotificationType::AccountBalance)
        .collect();
    let read_ids: Vec<String> = existing.iter().filter(|n| n.read).map(|n| n.id.clone()).collect();
    db.delete_many(collections::NOTIFICATIONS, &read_ids).await?;

    let notification = if existing.iter().any(|n| !n.read) {
        None
    } else {
        let lang = user_language(db, user_id).await?;
        let amount = format_vnd(balance);
        let (title, message) = match lang {
            Language::Vi => (
                "Cảnh báo số dư âm".to_string(),
                format!(
                    "Số dư tài khoản của bạn hiện đang âm: {}. Vui lòng cân đối thu chi.",
                    amount
                ),
            ),
            Language::En => (
                "Negative balance".to_string(),
                format!(
                    "Your account balance is negative: {}. Please rebalance your income and spending.",
                    amount
                ),
            ),
        };
        let n = Notification::new(user_id, NotificationType::AccountBalance, title, message)
            .with_link("/dashboard")
            .with_data(json!({ "type": "negative-balance", "balance": balance }));
        create(db, &n).await?;
        Some(n)
    };

    Ok(BalanceCheck {
        balance,
        is_negative: true,
        notification,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Budget;
    use crate::services::ledger::tests::entry;
    use crate::services::loans::tests::loan;

    fn user(id: &str, language: Language) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            password_hash: String::new(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone_number: None,
            role: Default::default(),
            is_email_verified: false,
            active: true,
            language,
            settings: Default::default(),
            password_changed_at: None,
            password_reset_digest: None,
            password_reset_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seed_budget(db: &FirestoreDb, amount: f64, now: DateTime<Utc>) {
        let b = Budget {
            id: "b1".to_string(),
            user_id: "u1".to_string(),
            category: "Food".to_string(),
            amount,
            month: now.month(),
            year: now.year(),
            created_at: now,
            updated_at: now,
        };
        db.set(collections::BUDGETS, &b.id, &b).await.unwrap();
    }

    async fn seed_expense(db: &FirestoreDb, id: &str, amount: f64, now: DateTime<Utc>) {
        let mut e = entry(id, amount, "Food", now.year(), now.month(), 1);
        e.date = now;
        db.set(collections::EXPENSES, &e.id, &e).await.unwrap();
    }

    #[tokio::test]
    async fn test_budget_alert_dedup_and_escalation() {
        let db = FirestoreDb::new_in_memory();
        db.upsert_user(&user("u1", Language::Vi)).await.unwrap();
        let now = Utc::now();
        seed_budget(&db, 1_000_000.0, now).await;

        seed_expense(&db, "e1", 850_000.0, now).await;
        let first = check_budget_alerts(&db, "u1", "food", now).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "Cảnh báo ngân sách");

        // Same level again: nothing new
        assert!(check_budget_alerts(&db, "u1", "Food", now).await.unwrap().is_empty());

        seed_expense(&db, "e2", 200_000.0, now).await;
        let over = check_budget_alerts(&db, "u1", "Food", now).await.unwrap();
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].data_str("level"), Some("over"));

        let all = load(&db, "u1").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_budget_alerts_respect_settings() {
        let db = FirestoreDb::new_in_memory();
        let mut u = user("u1", Language::En);
        u.settings.budget_alerts = false;
        db.upsert_user(&u).await.unwrap();
        let now = Utc::now();
        seed_budget(&db, 100.0, now).await;
        seed_expense(&db, "e1", 500.0, now).await;

        assert!(check_budget_alerts(&db, "u1", "Food", now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_loan_due_once() {
        let db = FirestoreDb::new_in_memory();
        db.upsert_user(&user("u1", Language::En)).await.unwrap();
        let l = loan("l1", 1_000.0, 2);

        let n = check_loan_due(&db, &l, Utc::now()).await.unwrap().unwrap();
        assert_eq!(n.kind, NotificationType::LoanDue);
        assert!(check_loan_due(&db, &l, Utc::now()).await.unwrap().is_none());

        let far = loan("l2", 1_000.0, 20);
        assert!(check_loan_due(&db, &far, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_negative_balance_alerts_once() {
        let db = FirestoreDb::new_in_memory();
        db.upsert_user(&user("u1", Language::Vi)).await.unwrap();
        let now = Utc::now();
        seed_expense(&db, "e1", 50_000.0, now).await;

        let first = check_negative_balance(&db, "u1").await.unwrap();
        assert!(first.is_negative);
        assert_eq!(first.balance, -50_000.0);
        assert!(first.notification.is_some());

        let second = check_negative_balance(&db, "u1").await.unwrap();
        assert!(second.notification.is_none());
    }

    #[tokio::test]
    async fn test_purge_only_old_read() {
        let db = FirestoreDb::new_in_memory();
        let now = Utc::now();
        let mut old_read = Notification::new("u1", NotificationType::Info, "a".into(), "a".into());
        old_read.read = true;
        old_read.created_at = now - Duration::days(40);
        let mut old_unread = Notification::new("u1", NotificationType::Info, "b".into(), "b".into());
        old_unread.created_at = now - Duration::days(40);
        let fresh_read = {
            let mut n = Notification::new("u1", NotificationType::Info, "c".into(), "c".into());
            n.read = true;
            n
        };
        for n in [&old_read, &old_unread, &fresh_read] {
            create(&db, n).await.unwrap();
        }

        let kept = list_after_purge(&db, "u1", now).await.unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|n| n.id != old_read.id));
    }
}
