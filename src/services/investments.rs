// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Investment ledgers and portfolio summaries.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::{Investment, InvestmentTransaction, InvestmentTransactionType, InvestmentType};
use crate::time_utils::parse_date;
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

/// Portfolio totals for one investment type.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TypeSummary {
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    pub count: usize,
    pub invested: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub roi: f64,
}

/// Portfolio totals across all of a user's investments.
#[derive(Debug, Clone, Serialize)]
pub struct InvestmentSummary {
    pub total_invested: f64,
    pub total_current_value: f64,
    pub total_profit_loss: f64,
    pub roi: f64,
    pub count: usize,
    pub by_type: Vec<TypeSummary>,
}

/// Fields of a new ledger entry, before validation.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: InvestmentTransactionType,
    pub amount: Option<f64>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub fee: f64,
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn roi(profit: f64, invested: f64) -> f64 {
    if invested == 0.0 {
        0.0
    } else {
        profit / invested * 100.0
    }
}

pub async fn load(db: &FirestoreDb, user_id: &str) -> Result<Vec<Investment>, AppError> {
    let mut investments: Vec<Investment> = db
        .list_by_field(collections::INVESTMENTS, "user_id", user_id)
        .await?;
    investments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(investments)
}

pub fn summarize(investments: &[Investment]) -> InvestmentSummary {
    let mut by_type: Vec<TypeSummary> = Vec::new();
    for inv in investments {
        let slot = match by_type
            .iter_mut()
            .position(|t| t.investment_type == inv.investment_type)
        {
            Some(i) => &mut by_type[i],
            None => {
                by_type.push(TypeSummary {
                    investment_type: inv.investment_type,
                    count: 0,
                    invested: 0.0,
                    current_value: 0.0,
                    profit_loss: 0.0,
                    roi: 0.0,
                });
                let last = by_type.len() - 1;
                &mut by_type[last]
            }
        };
        slot.count += 1;
        slot.invested += inv.total_invested;
        slot.current_value += inv.current_value;
        slot.profit_loss += inv.profit_loss;
    }

    for t in &mut by_type {
        t.roi = round2(roi(t.profit_loss, t.invested));
        t.invested = round2(t.invested);
        t.current_value = round2(t.current_value);
        t.profit_loss = round2(t.profit_loss);
    }
    by_type.sort_by(|a, b| b.invested.total_cmp(&a.invested));

    let total_invested: f64 = investments.iter().map(|i| i.total_invested).sum();
    let total_current_value: f64 = investments.iter().map(|i| i.current_value).sum();
    let total_profit_loss: f64 = investments.iter().map(|i| i.profit_loss).sum();

    InvestmentSummary {
        total_invested: round2(total_invested),
        total_current_value: round2(total_current_value),
        total_profit_loss: round2(total_profit_loss),
        roi: round2(roi(total_profit_loss, total_invested)),
        count: investments.len(),
        by_type,
    }
}

/// Opening ledger entry for a newly created investment.
///
/// Market assets open with a buy at the purchase price (falling back to the
/// current price, then 1). Everything else opens with a deposit.
pub fn initial_transaction(
    investment_type: InvestmentType,
    initial_investment: f64,
    quantity: Option<f64>,
    purchase_price: Option<f64>,
    current_price: f64,
    fee: f64,
    date: DateTime<Utc>,
) -> Option<InvestmentTransaction> {
    if initial_investment <= 0.0 {
        return None;
    }

    let id = uuid::Uuid::new_v4().to_string();
    let market = matches!(
        investment_type,
        InvestmentType::Stock | InvestmentType::Crypto | InvestmentType::Gold | InvestmentType::Fund
    );
    if market {
        let price = purchase_price
            .filter(|p| *p > 0.0)
            .or(Some(current_price).filter(|p| *p > 0.0))
            .unwrap_or(1.0);
        let quantity = quantity
            .filter(|q| *q > 0.0)
            .unwrap_or(initial_investment / price);
        Some(InvestmentTransaction {
            id,
            kind: InvestmentTransactionType::Buy,
            amount: 0.0,
            price,
            quantity,
            fee,
            date,
            notes: Some("Initial purchase".to_string()),
        })
    } else {
        Some(InvestmentTransaction {
            id,
            kind: InvestmentTransactionType::Deposit,
            amount: initial_investment,
            price: 0.0,
            quantity: 0.0,
            fee,
            date,
            notes: Some("Initial deposit".to_string()),
        })
    }
}

/// Validate a new ledger entry against the investment it is added to.
pub fn build_transaction(
    investment: &Investment,
    req: NewTransaction,
    now: DateTime<Utc>,
) -> Result<InvestmentTransaction, AppError> {
    if req.fee < 0.0 {
        return Err(AppError::BadRequest("Fee cannot be negative".to_string()));
    }

    let (amount, price, quantity) = match req.kind {
        InvestmentTransactionType::Buy | InvestmentTransactionType::Sell => {
            let (Some(price), Some(quantity)) = (req.price, req.quantity) else {
                return Err(AppError::BadRequest(
                    "Buy and sell transactions require price and quantity".to_string(),
                ));
            };
            if price < 0.0 || quantity <= 0.0 {
                return Err(AppError::BadRequest(
                    "Price must be non-negative and quantity positive".to_string(),
                ));
            }
            if req.kind == InvestmentTransactionType::Sell {
                let held = investment.held_quantity();
                if quantity > held {
                    return Err(AppError::BadRequest(format!(
                        "Sell quantity ({quantity}) exceeds held quantity ({held})"
                    )));
                }
            }
            (0.0, price, quantity)
        }
        _ => {
            let Some(amount) = req.amount else {
                return Err(AppError::BadRequest(
                    "This transaction type requires an amount".to_string(),
                ));
            };
            if amount < 0.0 {
                return Err(AppError::BadRequest(
                    "Amount cannot be negative".to_string(),
                ));
            }
            if req.kind == InvestmentTransactionType::Interest
                && investment.investment_type != InvestmentType::Savings
            {
                return Err(AppError::BadRequest(
                    "Interest transactions are only allowed for savings".to_string(),
                ));
            }
            (amount, 0.0, 0.0)
        }
    };

    Ok(InvestmentTransaction {
        id: uuid::Uuid::new_v4().to_string(),
        kind: req.kind,
        amount,
        price,
        quantity,
        fee: req.fee,
        date: req.date.unwrap_or(now),
        notes: req.notes,
    })
}

// ─── Savings interest ────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestPayment {
    #[default]
    Monthly,
    /// Paid once at maturity
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestCalculation {
    #[default]
    Simple,
    Compound,
}

/// Savings terms read from an investment's `details`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavingsTerms {
    /// Percent per year
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default)]
    pub interest_payment_type: InterestPayment,
    #[serde(default)]
    pub interest_calculation_type: InterestCalculation,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl SavingsTerms {
    pub fn of(investment: &Investment) -> Option<Self> {
        let details = investment.details.clone()?;
        serde_json::from_value(details).ok()
    }

    fn maturity(&self) -> Option<DateTime<Utc>> {
        self.end_date.as_deref().and_then(parse_date)
    }
}

fn interest_entry(amount: f64, date: DateTime<Utc>, note: &str) -> InvestmentTransaction {
    InvestmentTransaction {
        id: uuid::Uuid::new_v4().to_string(),
        kind: InvestmentTransactionType::Interest,
        amount,
        price: 0.0,
        quantity: 0.0,
        fee: 0.0,
        date,
        notes: Some(note.to_string()),
    }
}

/// Post the interest a savings account has earned up to `now`.
/// Returns the amount added.
///
/// Monthly accounts earn one twelfth of the yearly rate for every whole
/// month since the last posting, until maturity. End-of-term accounts are
/// paid once when they mature.
pub fn accrue_savings_interest(investment: &mut Investment, now: DateTime<Utc>) -> f64 {
    if investment.investment_type != InvestmentType::Savings {
        return 0.0;
    }
    let Some(terms) = SavingsTerms::of(investment).filter(|t| t.interest_rate > 0.0) else {
        return 0.0;
    };
    let rate = terms.interest_rate / 100.0;
    let compound = terms.interest_calculation_type == InterestCalculation::Compound;
    let start = investment
        .transactions
        .iter()
        .map(|t| t.date)
        .min()
        .unwrap_or(investment.created_at);
    let mut last = investment.last_interest_accrual.unwrap_or(start);
    let mut added = 0.0;

    investment.calculate_metrics();
    match terms.interest_payment_type {
        InterestPayment::Monthly => {
            let until = terms.maturity().map_or(now, |end| end.min(now));
            while let Some(next) = last.checked_add_months(Months::new(1)) {
                if next > until {
                    break;
                }
                let principal = if compound {
                    investment.current_value
                } else {
                    investment.total_invested
                };
                let interest = round2(principal * rate / 12.0);
                if interest > 0.0 {
                    investment
                        .transactions
                        .push(interest_entry(interest, next, "Automatic interest (monthly)"));
                    investment.calculate_metrics();
                    added += interest;
                }
                last = next;
            }
        }
        InterestPayment::End => {
            if let Some(end) = terms.maturity().filter(|end| *end <= now && last < *end) {
                let years = (end - start).num_days() as f64 / 365.25;
                let principal = investment.total_invested;
                let interest = if compound {
                    principal * ((1.0 + rate).powf(years) - 1.0)
                } else {
                    principal * rate * years
                };
                let interest = round2(interest);
                if interest > 0.0 {
                    investment
                        .transactions
                        .push(interest_entry(interest, end, "Automatic interest (end of term)"));
                    investment.calculate_metrics();
                    added += interest;
                }
                last = end;
            }
        }
    }

    if added > 0.0 {
        investment.last_interest_accrual = Some(last);
        investment.last_updated = now;
    }
    added
}

/// Accrue interest on every savings account. Returns the owners of the
/// accounts that changed.
pub async fn accrue_all(db: &FirestoreDb, now: DateTime<Utc>) -> Result<Vec<String>, AppError> {
    let all: Vec<Investment> = db.list_all(collections::INVESTMENTS).await?;
    let mut owners = Vec::new();
    for mut investment in all
        .into_iter()
        .filter(|i| i.investment_type == InvestmentType::Savings)
    {
        let added = accrue_savings_interest(&mut investment, now);
        if added > 0.0 {
            db.set(collections::INVESTMENTS, &investment.id, &investment)
                .await?;
            tracing::info!(
                user_id = %investment.user_id,
                investment_id = %investment.id,
                interest = added,
                "Savings interest posted"
            );
            if !owners.contains(&investment.user_id) {
                owners.push(investment.user_id);
            }
        }
    }
    Ok(owners)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn investment(id: &str, kind: InvestmentType) -> Investment {
        Investment {
            id: id.to_string(),
            user_id: "u1".to_string(),
            investment_type: kind,
            name: id.to_string(),
            symbol: None,
            category: None,
            current_price: 0.0,
            transactions: vec![],
            details: None,
            notes: None,
            total_quantity: 0.0,
            total_invested: 0.0,
            interest_earned: 0.0,
            current_value: 0.0,
            profit_loss: 0.0,
            roi: 0.0,
            last_interest_accrual: None,
            last_updated: Utc::now(),
            created_at: Utc::now(),
        }
    }

    fn request(kind: InvestmentTransactionType) -> NewTransaction {
        NewTransaction {
            kind,
            amount: None,
            price: None,
            quantity: None,
            fee: 0.0,
            date: None,
            notes: None,
        }
    }

    #[test]
    fn test_summary_groups_by_type() {
        let mut a = investment("a", InvestmentType::Stock);
        a.total_invested = 1_000.0;
        a.current_value = 1_500.0;
        a.profit_loss = 500.0;
        let mut b = investment("b", InvestmentType::Stock);
        b.total_invested = 1_000.0;
        b.current_value = 500.0;
        b.profit_loss = -500.0;
        let mut c = investment("c", InvestmentType::Gold);
        c.total_invested = 500.0;
        c.current_value = 600.0;
        c.profit_loss = 100.0;

        let s = summarize(&[a, b, c]);
        assert_eq!(s.count, 3);
        assert_eq!(s.total_invested, 2_500.0);
        assert_eq!(s.total_profit_loss, 100.0);
        assert_eq!(s.roi, 4.0);
        assert_eq!(s.by_type[0].investment_type, InvestmentType::Stock);
        assert_eq!(s.by_type[0].count, 2);
        assert_eq!(s.by_type[0].roi, 0.0);
        assert_eq!(s.by_type[1].roi, 20.0);
    }

    #[test]
    fn test_initial_transaction_kinds() {
        let now = Utc::now();
        let buy = initial_transaction(InvestmentType::Stock, 1_000_000.0, None, Some(25_000.0), 0.0, 0.0, now).unwrap();
        assert_eq!(buy.kind, InvestmentTransactionType::Buy);
        assert_eq!(buy.quantity, 40.0);

        let deposit = initial_transaction(InvestmentType::Savings, 5_000_000.0, None, None, 0.0, 0.0, now).unwrap();
        assert_eq!(deposit.kind, InvestmentTransactionType::Deposit);
        assert_eq!(deposit.amount, 5_000_000.0);

        assert!(initial_transaction(InvestmentType::Gold, 0.0, None, None, 0.0, 0.0, now).is_none());
    }

    #[test]
    fn test_sell_cannot_exceed_holding() {
        let mut inv = investment("a", InvestmentType::Crypto);
        let mut buy = request(InvestmentTransactionType::Buy);
        buy.price = Some(10.0);
        buy.quantity = Some(5.0);
        inv.transactions.push(build_transaction(&inv, buy, Utc::now()).unwrap());

        let mut sell = request(InvestmentTransactionType::Sell);
        sell.price = Some(12.0);
        sell.quantity = Some(6.0);
        assert!(build_transaction(&inv, sell.clone(), Utc::now()).is_err());

        sell.quantity = Some(5.0);
        assert!(build_transaction(&inv, sell, Utc::now()).is_ok());
    }

    #[test]
    fn test_interest_only_for_savings() {
        let mut req = request(InvestmentTransactionType::Interest);
        req.amount = Some(100.0);
        assert!(build_transaction(&investment("a", InvestmentType::Stock), req.clone(), Utc::now()).is_err());
        assert!(build_transaction(&investment("b", InvestmentType::Savings), req, Utc::now()).is_ok());
    }

    #[test]
    fn test_amount_required_for_deposit() {
        let req = request(InvestmentTransactionType::Deposit);
        assert!(build_transaction(&investment("a", InvestmentType::Savings), req, Utc::now()).is_err());
    }

    fn savings(details: serde_json::Value, opened: DateTime<Utc>) -> Investment {
        let mut inv = investment("s", InvestmentType::Savings);
        inv.details = Some(details);
        inv.created_at = opened;
        inv.transactions
            .push(initial_transaction(InvestmentType::Savings, 12_000_000.0, None, None, 0.0, 0.0, opened).unwrap());
        inv.calculate_metrics();
        inv
    }

    #[test]
    fn test_monthly_interest_catches_up_once() {
        use chrono::TimeZone;
        let opened = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 4, 15, 0, 0, 0).unwrap();
        let mut inv = savings(serde_json::json!({ "interest_rate": 6.0 }), opened);

        // 12m at 6% a year is 60k a month; Feb, Mar and Apr have passed.
        assert_eq!(accrue_savings_interest(&mut inv, now), 180_000.0);
        assert_eq!(inv.interest_earned, 180_000.0);
        assert_eq!(inv.current_value, 12_180_000.0);
        assert_eq!(
            inv.last_interest_accrual,
            Some(Utc.with_ymd_and_hms(2026, 4, 10, 0, 0, 0).unwrap())
        );

        // Running again the same day adds nothing.
        assert_eq!(accrue_savings_interest(&mut inv, now), 0.0);
    }

    #[test]
    fn test_compound_interest_grows_on_balance() {
        use chrono::TimeZone;
        let opened = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut inv = savings(
            serde_json::json!({ "interest_rate": 12.0, "interest_calculation_type": "compound" }),
            opened,
        );
        // 120k, then 1% of 12.12m.
        assert_eq!(accrue_savings_interest(&mut inv, now), 120_000.0 + 121_200.0);
    }

    #[test]
    fn test_end_of_term_paid_at_maturity() {
        use chrono::TimeZone;
        let opened = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let details = serde_json::json!({
            "interest_rate": 6.0,
            "interest_payment_type": "end",
            "end_date": "2026-07-02",
        });
        let mut inv = savings(details, opened);

        let before = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(accrue_savings_interest(&mut inv, before), 0.0);

        let after = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let paid = accrue_savings_interest(&mut inv, after);
        assert!(paid > 350_000.0 && paid < 370_000.0, "paid {paid}");
        assert_eq!(accrue_savings_interest(&mut inv, after), 0.0);
    }

    #[test]
    fn test_only_savings_with_a_rate_accrue() {
        let mut stock = investment("a", InvestmentType::Stock);
        stock.details = Some(serde_json::json!({ "interest_rate": 6.0 }));
        assert_eq!(accrue_savings_interest(&mut stock, Utc::now()), 0.0);

        let opened = Utc::now() - chrono::Duration::days(400);
        let mut no_rate = savings(serde_json::json!({ "bank": "VCB" }), opened);
        assert_eq!(accrue_savings_interest(&mut no_rate, Utc::now()), 0.0);
    }

    #[tokio::test]
    async fn test_accrue_all_saves_and_reports_owners() {
        let db = FirestoreDb::new_in_memory();
        let opened = Utc::now() - chrono::Duration::days(70);
        let inv = savings(serde_json::json!({ "interest_rate": 6.0 }), opened);
        db.set(collections::INVESTMENTS, &inv.id, &inv).await.unwrap();

        let owners = accrue_all(&db, Utc::now()).await.unwrap();
        assert_eq!(owners, vec!["u1".to_string()]);
        let stored: Investment = db.get(collections::INVESTMENTS, &inv.id).await.unwrap().unwrap();
        assert!(stored.interest_earned >= 60_000.0);
        assert!(accrue_all(&db, Utc::now()).await.unwrap().is_empty());
    }
}
