// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loans and loan payments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterestRateType {
    Day,
    Week,
    Month,
    Quarter,
    #[default]
    Year,
}

impl InterestRateType {
    /// Length of one rate period in days.
    pub fn period_days(self) -> f64 {
        match self {
            InterestRateType::Day => 1.0,
            InterestRateType::Week => 7.0,
            InterestRateType::Month => 30.0,
            InterestRateType::Quarter => 90.0,
            InterestRateType::Year => 365.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    #[default]
    Active,
    Paid,
    Overdue,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Paid => "PAID",
            LoanStatus::Overdue => "OVERDUE",
        }
    }
}

/// A loan taken by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub description: String,
    pub lender: String,
    /// Percent per `interest_rate_type` period
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default)]
    pub interest_rate_type: InterestRateType,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub status: LoanStatus,
    #[serde(default)]
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Status implied by the payments made so far.
    pub fn derive_status(&self, total_paid: f64, now: DateTime<Utc>) -> LoanStatus {
        if total_paid >= self.amount {
            LoanStatus::Paid
        } else if now > self.due_date {
            LoanStatus::Overdue
        } else {
            LoanStatus::Active
        }
    }

    /// Recompute `status` and `is_paid`. Returns true if anything changed.
    pub fn refresh_status(&mut self, total_paid: f64, now: DateTime<Utc>) -> bool {
        let status = self.derive_status(total_paid, now);
        let changed = status != self.status || self.is_paid != (status == LoanStatus::Paid);
        self.status = status;
        self.is_paid = status == LoanStatus::Paid;
        changed
    }

    /// Whole days between start and due date, rounded up.
    pub fn term_days(&self) -> i64 {
        let secs = (self.due_date - self.start_date).num_seconds().abs();
        (secs + 86_399) / 86_400
    }

    /// Interest owed on `remaining` over the full term.
    pub fn interest_on(&self, remaining: f64) -> f64 {
        let multiplier = self.term_days() as f64 / self.interest_rate_type.period_days();
        (remaining * (self.interest_rate / 100.0) * multiplier).round()
    }
}

/// A repayment against a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPayment {
    pub id: String,
    pub loan_id: String,
    pub user_id: String,
    pub amount: f64,
    pub payment_date: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Loan with derived repayment figures, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct LoanView {
    #[serde(flatten)]
    pub loan: Loan,
    pub total_paid: f64,
    pub remaining_amount: f64,
    /// Days until due date (negative when overdue)
    pub days_remaining: i64,
    pub interest: f64,
    pub total_with_interest: f64,
}

impl LoanView {
    pub fn new(loan: Loan, total_paid: f64, now: DateTime<Utc>) -> Self {
        let remaining_amount = (loan.amount - total_paid).max(0.0);
        let secs = (loan.due_date - now).num_seconds();
        let days_remaining = (secs as f64 / 86_400.0).ceil() as i64;
        let interest = loan.interest_on(remaining_amount);
        Self {
            loan,
            total_paid,
            remaining_amount,
            days_remaining,
            interest,
            total_with_interest: remaining_amount + interest,
        }
    }
}
