// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
    BudgetAlert,
    Transaction,
    Income,
    Expense,
    Loan,
    LoanPayment,
    LoanDue,
    LoanOverdue,
    AccountBalance,
    System,
}

/// A message shown in the user's notification center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub link: Option<String>,
    /// Structured payload (e.g. `budget_id`, `loan_id`)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: &str, kind: NotificationType, title: String, message: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title,
            message,
            kind,
            read: false,
            link: None,
            data: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// String field of the data payload, if present.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.as_ref()?.get(key)?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_is_kebab_case() {
        assert_eq!(
            serde_json::to_string(&NotificationType::BudgetAlert).unwrap(),
            "\"budget-alert\""
        );
        assert_eq!(
            serde_json::to_string(&NotificationType::AccountBalance).unwrap(),
            "\"account-balance\""
        );
    }

    #[test]
    fn test_data_str() {
        let n = Notification::new("u1", NotificationType::Loan, "t".into(), "m".into())
            .with_data(serde_json::json!({ "loan_id": "l1" }));
        assert_eq!(n.data_str("loan_id"), Some("l1"));
        assert_eq!(n.data_str("budget_id"), None);
    }
}
