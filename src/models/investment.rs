// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Investments and their transaction ledgers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentType {
    Stock,
    Crypto,
    Gold,
    Savings,
    Fund,
    Realestate,
    Other,
}

impl InvestmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            InvestmentType::Stock => "stock",
            InvestmentType::Crypto => "crypto",
            InvestmentType::Gold => "gold",
            InvestmentType::Savings => "savings",
            InvestmentType::Fund => "fund",
            InvestmentType::Realestate => "realestate",
            InvestmentType::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(raw.to_lowercase())).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentTransactionType {
    Buy,
    Sell,
    Deposit,
    Withdraw,
    Dividend,
    Interest,
}

/// One entry in an investment's ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InvestmentTransactionType,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub fee: f64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// An investment position with derived metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    pub name: String,
    /// Ticker, uppercased
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub transactions: Vec<InvestmentTransaction>,
    /// Type-specific metadata (bank, term, property details)
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub notes: Option<String>,

    // Derived by `calculate_metrics`
    #[serde(default)]
    pub total_quantity: f64,
    #[serde(default)]
    pub total_invested: f64,
    #[serde(default)]
    pub interest_earned: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default)]
    pub profit_loss: f64,
    #[serde(default)]
    pub roi: f64,

    /// Savings only: end of the last period interest was posted for
    #[serde(default)]
    pub last_interest_accrual: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Investment {
    /// Recompute quantity, invested capital and value from the ledger.
    pub fn calculate_metrics(&mut self) {
        let mut quantity = 0.0;
        let mut invested = 0.0;
        let mut interest = 0.0;

        for t in &self.transactions {
            match t.kind {
                InvestmentTransactionType::Buy => {
                    quantity += t.quantity;
                    invested += t.price * t.quantity + t.fee;
                }
                InvestmentTransactionType::Sell => {
                    quantity -= t.quantity;
                    invested -= t.price * t.quantity - t.fee;
                }
                InvestmentTransactionType::Deposit => invested += t.amount + t.fee,
                InvestmentTransactionType::Withdraw => invested -= t.amount - t.fee,
                InvestmentTransactionType::Interest => {
                    if self.investment_type == InvestmentType::Savings {
                        interest += t.amount;
                    }
                }
                InvestmentTransactionType::Dividend => {}
            }
        }

        self.total_quantity = quantity;
        self.total_invested = invested;
        self.interest_earned = interest;
        self.current_value = if self.investment_type == InvestmentType::Savings {
            invested + interest
        } else {
            quantity * self.current_price
        };
        self.profit_loss = self.current_value - self.total_invested;
        self.roi = if self.total_invested != 0.0 {
            self.profit_loss / self.total_invested * 100.0
        } else {
            0.0
        };
    }

    /// Quantity held before applying any new transaction.
    pub fn held_quantity(&self) -> f64 {
        self.transactions.iter().fold(0.0, |q, t| match t.kind {
            InvestmentTransactionType::Buy => q + t.quantity,
            InvestmentTransactionType::Sell => q - t.quantity,
            _ => q,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(kind: InvestmentTransactionType, amount: f64, price: f64, qty: f64, fee: f64) -> InvestmentTransaction {
        InvestmentTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            amount,
            price,
            quantity: qty,
            fee,
            date: Utc::now(),
            notes: None,
        }
    }

    fn investment(kind: InvestmentType, price: f64) -> Investment {
        Investment {
            id: "i1".to_string(),
            user_id: "u1".to_string(),
            investment_type: kind,
            name: "Test".to_string(),
            symbol: None,
            category: None,
            current_price: price,
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

    #[test]
    fn test_stock_buy_sell_metrics() {
        let mut inv = investment(InvestmentType::Stock, 30_000.0);
        inv.transactions.push(tx(InvestmentTransactionType::Buy, 0.0, 20_000.0, 100.0, 10_000.0));
        inv.transactions.push(tx(InvestmentTransactionType::Sell, 0.0, 25_000.0, 40.0, 5_000.0));
        inv.calculate_metrics();

        assert_eq!(inv.total_quantity, 60.0);
        // 2_010_000 - (1_000_000 - 5_000)
        assert_eq!(inv.total_invested, 1_015_000.0);
        assert_eq!(inv.current_value, 1_800_000.0);
        assert_eq!(inv.profit_loss, 785_000.0);
        assert!((inv.roi - 77.339).abs() < 0.01);
    }

    #[test]
    fn test_savings_interest_counts_toward_value() {
        let mut inv = investment(InvestmentType::Savings, 0.0);
        inv.transactions.push(tx(InvestmentTransactionType::Deposit, 10_000_000.0, 0.0, 0.0, 0.0));
        inv.transactions.push(tx(InvestmentTransactionType::Interest, 500_000.0, 0.0, 0.0, 0.0));
        inv.transactions.push(tx(InvestmentTransactionType::Withdraw, 2_000_000.0, 0.0, 0.0, 0.0));
        inv.calculate_metrics();

        assert_eq!(inv.total_invested, 8_000_000.0);
        assert_eq!(inv.interest_earned, 500_000.0);
        assert_eq!(inv.current_value, 8_500_000.0);
        assert_eq!(inv.profit_loss, 500_000.0);
    }

    #[test]
    fn test_interest_ignored_for_non_savings() {
        let mut inv = investment(InvestmentType::Gold, 0.0);
        inv.transactions.push(tx(InvestmentTransactionType::Interest, 100.0, 0.0, 0.0, 0.0));
        inv.calculate_metrics();
        assert_eq!(inv.interest_earned, 0.0);
        assert_eq!(inv.roi, 0.0);
    }

    #[test]
    fn test_type_parse() {
        assert_eq!(InvestmentType::parse("Crypto"), Some(InvestmentType::Crypto));
        assert_eq!(InvestmentType::parse("bonds"), None);
    }
}
