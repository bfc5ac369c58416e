// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Financial snapshot and the planning calculations built on it.
//!
//! The snapshot is the per-user aggregate the chatbot answers from. The
//! calculation helpers are pure so they can be tested without storage.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{
    Budget, CategoryTotal, InterestRateType, Investment, InvestmentType, Language, Loan,
    LoanPayment, LoanStatus, Transaction, TransactionKind,
};
use crate::services::{budgets, investments, ledger, loans};
use crate::time_utils::{in_month, previous_month};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Changes smaller than this percentage count as stable.
pub const STABLE_TREND_PERCENT: f64 = 5.0;

pub const EMERGENCY_FUND_MONTHS: u32 = 6;

pub const DEFAULT_GOAL_MONTHS: u32 = 12;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// A loan that still has money owing, with its interest.
#[derive(Debug, Clone, Serialize)]
pub struct LoanSnapshot {
    pub id: String,
    pub description: String,
    pub lender: String,
    pub amount: f64,
    pub remaining: f64,
    pub interest_rate: f64,
    pub interest_rate_type: InterestRateType,
    pub interest: f64,
    pub total_with_interest: f64,
    pub monthly_payment: f64,
    pub status: LoanStatus,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvestmentSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    pub invested: f64,
    pub value: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetSnapshot {
    pub category: String,
    pub limit: f64,
    pub spent: f64,
    /// Never negative
    pub remaining: f64,
    pub percentage: i64,
}

/// Per-user financial aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialSnapshot {
    pub month: u32,
    pub year: i32,

    pub income_this_month: f64,
    pub expenses_this_month: f64,
    pub expenses_by_category: Vec<CategoryTotal>,

    pub total_income_all_time: f64,
    pub total_expense_all_time: f64,
    /// All-time income minus all-time expenses
    pub balance: f64,

    pub income_last_month: f64,
    pub expenses_last_month: f64,

    pub loans: Vec<LoanSnapshot>,
    pub total_loan_amount: f64,

    pub investments: Vec<InvestmentSnapshot>,
    pub total_investment_value: f64,
    pub total_invested: f64,

    pub budgets: Vec<BudgetSnapshot>,

    pub generated_at: DateTime<Utc>,
}

impl FinancialSnapshot {
    pub fn savings_this_month(&self) -> f64 {
        self.income_this_month - self.expenses_this_month
    }

    /// Share of this month's income spent, in percent.
    pub fn spending_rate(&self) -> f64 {
        if self.income_this_month > 0.0 {
            round2(self.expenses_this_month / self.income_this_month * 100.0)
        } else {
            0.0
        }
    }

    pub fn total_investment_profit(&self) -> f64 {
        self.total_investment_value - self.total_invested
    }

    /// Overall investment return in percent.
    pub fn investment_return(&self) -> f64 {
        if self.total_invested > 0.0 {
            round2(self.total_investment_profit() / self.total_invested * 100.0)
        } else {
            0.0
        }
    }
}

/// Build the snapshot from already-loaded records.
pub fn build_snapshot_from(
    now: DateTime<Utc>,
    incomes: &[Transaction],
    expenses: &[Transaction],
    loan_list: &[Loan],
    payments: &HashMap<String, Vec<LoanPayment>>,
    investment_list: &[Investment],
    budget_list: Vec<Budget>,
) -> FinancialSnapshot {
    let (year, month) = (now.year(), now.month());
    let (last_year, last_month) = previous_month(now);

    let month_expenses: Vec<Transaction> = expenses
        .iter()
        .filter(|e| in_month(e.date, year, month))
        .cloned()
        .collect();

    let total_income_all_time = ledger::total_amount(incomes);
    let total_expense_all_time = ledger::total_amount(expenses);

    let loan_snapshots: Vec<LoanSnapshot> = loan_list
        .iter()
        .filter_map(|loan| {
            let paid = payments.get(&loan.id).map_or(0.0, |p| loans::total_paid(p));
            let status = loan.derive_status(paid, now);
            if status == LoanStatus::Paid {
                return None;
            }
            let remaining = (loan.amount - paid).max(0.0);
            let interest = loan.interest_on(remaining);
            let total = remaining + interest;
            let months = (loan.term_days() as f64 / 30.0).max(1.0);
            Some(LoanSnapshot {
                id: loan.id.clone(),
                description: loan.description.clone(),
                lender: loan.lender.clone(),
                amount: loan.amount,
                remaining,
                interest_rate: loan.interest_rate,
                interest_rate_type: loan.interest_rate_type,
                interest,
                total_with_interest: total,
                monthly_payment: (total / months).round(),
                status,
                due_date: loan.due_date,
            })
        })
        .collect();

    let investment_snapshots: Vec<InvestmentSnapshot> = investment_list
        .iter()
        .map(|inv| InvestmentSnapshot {
            name: inv.symbol.clone().unwrap_or_else(|| inv.name.clone()),
            investment_type: inv.investment_type,
            invested: inv.total_invested,
            value: inv.current_value,
            profit: inv.current_value - inv.total_invested,
        })
        .collect();

    let month_budgets: Vec<Budget> = budget_list
        .into_iter()
        .filter(|b| b.year == year && b.month == month)
        .collect();
    let budget_snapshots = budgets::views(month_budgets, expenses)
        .into_iter()
        .map(|v| BudgetSnapshot {
            category: v.budget.category,
            limit: v.budget.amount,
            spent: v.spent,
            remaining: v.remaining.max(0.0),
            percentage: v.percentage,
        })
        .collect();

    FinancialSnapshot {
        month,
        year,
        income_this_month: ledger::monthly_total(incomes, year, month),
        expenses_this_month: ledger::total_amount(&month_expenses),
        expenses_by_category: ledger::by_category(&month_expenses),
        total_income_all_time,
        total_expense_all_time,
        balance: total_income_all_time - total_expense_all_time,
        income_last_month: ledger::monthly_total(incomes, last_year, last_month),
        expenses_last_month: ledger::monthly_total(expenses, last_year, last_month),
        total_loan_amount: loan_snapshots.iter().map(|l| l.total_with_interest).sum(),
        loans: loan_snapshots,
        total_investment_value: investment_snapshots.iter().map(|i| i.value).sum(),
        total_invested: investment_snapshots.iter().map(|i| i.invested).sum(),
        investments: investment_snapshots,
        budgets: budget_snapshots,
        generated_at: now,
    }
}

/// Load a user's records and build their snapshot.
pub async fn build_snapshot(
    db: &FirestoreDb,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<FinancialSnapshot, AppError> {
    let (incomes, expenses, loan_list, payments, investment_list, budget_list) = tokio::try_join!(
        ledger::load(db, TransactionKind::Income, user_id),
        ledger::load(db, TransactionKind::Expense, user_id),
        loans::load(db, user_id),
        loans::payments_by_loan(db, user_id),
        investments::load(db, user_id),
        budgets::load(db, user_id),
    )?;

    Ok(build_snapshot_from(
        now,
        &incomes,
        &expenses,
        &loan_list,
        &payments,
        &investment_list,
        budget_list,
    ))
}

// ─── Trend ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Stable,
    /// Expenses going up
    Increasing,
    /// Expenses going down
    Decreasing,
    /// Income going up
    Growing,
    /// Income going down
    Declining,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendAnalysis {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
    pub trend: Trend,
    pub analysis: String,
}

/// Compare this period against the previous one.
pub fn analyze_trend(current: f64, previous: f64, is_expense: bool, lang: Language) -> TrendAnalysis {
    let change = current - previous;
    let change_percent = if previous != 0.0 {
        change / previous * 100.0
    } else {
        0.0
    };

    let trend = if change_percent.abs() < STABLE_TREND_PERCENT {
        Trend::Stable
    } else if change_percent > 0.0 {
        if is_expense {
            Trend::Increasing
        } else {
            Trend::Growing
        }
    } else if is_expense {
        Trend::Decreasing
    } else {
        Trend::Declining
    };

    TrendAnalysis {
        current,
        previous,
        change: change.round(),
        change_percent: round2(change_percent),
        trend,
        analysis: trend_text(change_percent, is_expense, lang).to_string(),
    }
}

fn trend_text(change_percent: f64, is_expense: bool, lang: Language) -> &'static str {
    let magnitude = change_percent.abs();
    let up = change_percent > 0.0;
    match lang {
        Language::Vi => {
            if magnitude < STABLE_TREND_PERCENT {
                "Xu hướng ổn định, không có thay đổi đáng kể."
            } else if magnitude < 15.0 {
                match (up, is_expense) {
                    (true, true) => "Chi tiêu tăng nhẹ, cần theo dõi.",
                    (true, false) => "Thu nhập tăng tốt.",
                    (false, true) => "Chi tiêu giảm tích cực.",
                    (false, false) => "Thu nhập giảm, cần chú ý.",
                }
            } else {
                match (up, is_expense) {
                    (true, true) => "Chi tiêu tăng mạnh, cần kiểm soát ngay.",
                    (true, false) => "Thu nhập tăng đáng kể.",
                    (false, true) => "Chi tiêu giảm đáng kể.",
                    (false, false) => "Thu nhập giảm mạnh, cần hành động.",
                }
            }
        }
        Language::En => {
            if magnitude < STABLE_TREND_PERCENT {
                "Stable, no significant change."
            } else if magnitude < 15.0 {
                match (up, is_expense) {
                    (true, true) => "Spending is rising slightly; keep an eye on it.",
                    (true, false) => "Income is growing well.",
                    (false, true) => "Spending is coming down nicely.",
                    (false, false) => "Income is slipping; worth watching.",
                }
            } else {
                match (up, is_expense) {
                    (true, true) => "Spending is rising sharply; rein it in now.",
                    (true, false) => "Income grew significantly.",
                    (false, true) => "Spending dropped significantly.",
                    (false, false) => "Income fell sharply; action needed.",
                }
            }
        }
    }
}

// ─── Budget recommendation ───────────────────────────────────

/// 50/30/20 split of monthly income plus a per-category guide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedBudget {
    pub total_income: f64,
    pub necessities: f64,
    pub wants: f64,
    pub savings: f64,
    pub food: f64,
    pub housing: f64,
    pub transportation: f64,
    pub entertainment: f64,
    pub healthcare: f64,
    pub other: f64,
}

pub fn recommended_budget(monthly_income: f64) -> RecommendedBudget {
    let share = |pct: f64| (monthly_income * pct).round();
    RecommendedBudget {
        total_income: monthly_income,
        necessities: share(0.50),
        wants: share(0.30),
        savings: share(0.20),
        food: share(0.15),
        housing: share(0.25),
        transportation: share(0.10),
        entertainment: share(0.10),
        healthcare: share(0.05),
        other: share(0.15),
    }
}

// ─── Ratings ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceRating {
    Excellent,
    Good,
    Average,
    Poor,
}

impl PerformanceRating {
    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (PerformanceRating::Excellent, Language::Vi) => "xuất sắc",
            (PerformanceRating::Good, Language::Vi) => "tốt",
            (PerformanceRating::Average, Language::Vi) => "trung bình",
            (PerformanceRating::Poor, Language::Vi) => "kém",
            (PerformanceRating::Excellent, Language::En) => "excellent",
            (PerformanceRating::Good, Language::En) => "good",
            (PerformanceRating::Average, Language::En) => "average",
            (PerformanceRating::Poor, Language::En) => "poor",
        }
    }
}

pub fn performance_rating(return_percent: f64) -> PerformanceRating {
    if return_percent > 15.0 {
        PerformanceRating::Excellent
    } else if return_percent > 8.0 {
        PerformanceRating::Good
    } else if return_percent > 0.0 {
        PerformanceRating::Average
    } else {
        PerformanceRating::Poor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetHealth {
    Healthy,
    Near,
    Over,
}

pub fn budget_health(percentage: i64) -> BudgetHealth {
    if percentage > 100 {
        BudgetHealth::Over
    } else if percentage > 80 {
        BudgetHealth::Near
    } else {
        BudgetHealth::Healthy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestClass {
    High,
    Medium,
    Low,
}

impl InterestClass {
    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (InterestClass::High, Language::Vi) => "cao",
            (InterestClass::Medium, Language::Vi) => "trung bình",
            (InterestClass::Low, Language::Vi) => "thấp",
            (InterestClass::High, Language::En) => "high",
            (InterestClass::Medium, Language::En) => "medium",
            (InterestClass::Low, Language::En) => "low",
        }
    }
}

pub fn interest_class(rate: f64) -> InterestClass {
    if rate > 15.0 {
        InterestClass::High
    } else if rate > 8.0 {
        InterestClass::Medium
    } else {
        InterestClass::Low
    }
}

// ─── Planning ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SavingsGoal {
    pub target_amount: f64,
    pub can_reach: bool,
    /// `None` when nothing is saved each month
    pub months_needed: Option<i64>,
    pub monthly_savings_required: f64,
    pub current_monthly_savings: f64,
    pub savings_rate: f64,
    pub remaining_amount: f64,
    pub recommendation: String,
}

pub fn savings_goal(
    target_amount: f64,
    current_savings: f64,
    monthly_income: f64,
    monthly_expense: f64,
    timeframe_months: u32,
    lang: Language,
) -> SavingsGoal {
    let monthly_savings = monthly_income - monthly_expense;
    let remaining = (target_amount - current_savings).max(0.0);
    let timeframe = timeframe_months.max(1);
    let required = (remaining / f64::from(timeframe)).ceil();

    if monthly_savings <= 0.0 {
        let recommendation = match lang {
            Language::Vi => "Không thể đạt mục tiêu với chi tiêu hiện tại. Cần giảm chi tiêu hoặc tăng thu nhập.",
            Language::En => "The goal is out of reach at current spending. Cut expenses or raise income.",
        };
        return SavingsGoal {
            target_amount,
            can_reach: false,
            months_needed: None,
            monthly_savings_required: required,
            current_monthly_savings: monthly_savings,
            savings_rate: 0.0,
            remaining_amount: remaining,
            recommendation: recommendation.to_string(),
        };
    }

    let months_needed = (remaining / monthly_savings).ceil() as i64;
    let savings_rate = if monthly_income > 0.0 {
        monthly_savings / monthly_income * 100.0
    } else {
        0.0
    };
    let recommendation = match lang {
        Language::Vi => {
            if savings_rate < 10.0 {
                "Tỷ lệ tiết kiệm thấp. Cân nhắc giảm chi tiêu không cần thiết."
            } else if savings_rate > 30.0 {
                "Tỷ lệ tiết kiệm tốt! Có thể đầu tư để tăng lợi nhuận."
            } else if months_needed > i64::from(timeframe) {
                "Cần tăng mức tiết kiệm hàng tháng để đạt mục tiêu đúng hạn."
            } else {
                "Kế hoạch tiết kiệm phù hợp với mục tiêu."
            }
        }
        Language::En => {
            if savings_rate < 10.0 {
                "Your savings rate is low. Consider trimming non-essential spending."
            } else if savings_rate > 30.0 {
                "Great savings rate! Consider investing the surplus."
            } else if months_needed > i64::from(timeframe) {
                "Increase your monthly savings to reach the goal on time."
            } else {
                "Your savings plan fits the goal."
            }
        }
    };

    SavingsGoal {
        target_amount,
        can_reach: months_needed <= i64::from(timeframe),
        months_needed: Some(months_needed),
        monthly_savings_required: required,
        current_monthly_savings: monthly_savings,
        savings_rate: round2(savings_rate),
        remaining_amount: remaining,
        recommendation: recommendation.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmergencyFund {
    pub monthly_expenses: f64,
    pub target_months: u32,
    pub required_amount: f64,
}

pub fn emergency_fund(monthly_expenses: f64, target_months: u32) -> EmergencyFund {
    EmergencyFund {
        monthly_expenses,
        target_months,
        required_amount: monthly_expenses * f64::from(target_months),
    }
}
