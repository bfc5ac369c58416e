// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Filter questions over a user's own records.
//!
//! "chi tiêu cao nhất", "income above 5tr", "khoản vay dưới 10 triệu": a data
//! type plus a max/min operator and/or an amount threshold.

use super::calculator::{format_vnd, parse_amount, NUMBER, UNIT};
use super::nlp::TimePeriod;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Language, Transaction, TransactionKind};
use crate::services::{ledger, loans};
use crate::time_utils::{in_month, previous_month};
use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Longest list a filter reply shows.
const MAX_ITEMS: usize = 10;

static EXPENSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:chi tiêu|expenses?|spending)\b").expect("valid regex"));
static INCOME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:thu nhập|incomes?|salary)\b").expect("valid regex"));
static LOAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:khoản vay|loans?|debts?|vay|nợ)\b").expect("valid regex"));
static MAX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:cao nhất|lớn nhất|highest|maximum|max|biggest)\b").expect("valid regex")
});
static MIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:thấp nhất|nhỏ nhất|lowest|minimum|min|smallest)\b").expect("valid regex")
});
static THRESHOLD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(trên|lớn hơn|above|over|more than|greater than|dưới|nhỏ hơn|below|under|less than)\s*{NUMBER}\s*{UNIT}\b"
    ))
    .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Expense,
    Income,
    Loan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Max,
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "direction", content = "amount", rename_all = "lowercase")]
pub enum Threshold {
    Above(f64),
    Below(f64),
}

impl Threshold {
    fn accepts(self, amount: f64) -> bool {
        match self {
            Threshold::Above(limit) => amount > limit,
            Threshold::Below(limit) => amount < limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterQuery {
    pub data_type: DataType,
    pub operator: Option<Operator>,
    pub threshold: Option<Threshold>,
    pub time_period: Option<TimePeriod>,
}

/// One record as a filter reply shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterItem {
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
}

impl From<Transaction> for FilterItem {
    fn from(t: Transaction) -> Self {
        Self {
            description: t.description,
            category: t.category,
            amount: t.amount,
            date: t.date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterResult {
    pub query: FilterQuery,
    pub items: Vec<FilterItem>,
    /// Matches before truncation
    pub matched: usize,
}

/// Recognise a filter question in lowercased message text.
///
/// Needs a data type and at least one of an operator or a threshold.
pub fn parse(text: &str, time_period: Option<TimePeriod>) -> Option<FilterQuery> {
    let data_type = if EXPENSE_RE.is_match(text) {
        DataType::Expense
    } else if INCOME_RE.is_match(text) {
        DataType::Income
    } else if LOAN_RE.is_match(text) {
        DataType::Loan
    } else {
        return None;
    };

    let operator = if MAX_RE.is_match(text) {
        Some(Operator::Max)
    } else if MIN_RE.is_match(text) {
        Some(Operator::Min)
    } else {
        None
    };

    let threshold = THRESHOLD_RE.captures(text).and_then(|c| {
        let unit = c.get(3).map_or("", |m| m.as_str());
        let amount = parse_amount(&c[2], unit)?;
        Some(match &c[1] {
            "trên" | "lớn hơn" | "above" | "over" | "more than" | "greater than" => {
                Threshold::Above(amount)
            }
            _ => Threshold::Below(amount),
        })
    });

    if operator.is_none() && threshold.is_none() {
        return None;
    }
    Some(FilterQuery {
        data_type,
        operator,
        threshold,
        time_period,
    })
}

fn in_period(date: DateTime<Utc>, period: Option<TimePeriod>, now: DateTime<Utc>) -> bool {
    match period {
        None => true,
        Some(TimePeriod::Today) => date.date_naive() == now.date_naive(),
        Some(TimePeriod::CurrentMonth) => in_month(date, now.year(), now.month()),
        Some(TimePeriod::LastMonth) => {
            let (year, month) = previous_month(now);
            in_month(date, year, month)
        }
        Some(TimePeriod::CurrentYear) => date.year() == now.year(),
    }
}

/// Narrow `items` to what the query asks for.
pub fn apply(query: &FilterQuery, items: Vec<FilterItem>, now: DateTime<Utc>) -> (Vec<FilterItem>, usize) {
    let mut matched: Vec<FilterItem> = items
        .into_iter()
        .filter(|i| in_period(i.date, query.time_period, now))
        .filter(|i| query.threshold.is_none_or(|t| t.accepts(i.amount)))
        .collect();

    let ascending = matches!(
        (query.operator, query.threshold),
        (Some(Operator::Min), _) | (None, Some(Threshold::Below(_)))
    );
    matched.sort_by(|a, b| {
        let ord = a.amount.total_cmp(&b.amount);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });

    let count = matched.len();
    let keep = if query.operator.is_some() { 1 } else { MAX_ITEMS };
    matched.truncate(keep);
    (matched, count)
}

async fn load_items(
    db: &FirestoreDb,
    user_id: &str,
    data_type: DataType,
) -> Result<Vec<FilterItem>, AppError> {
    Ok(match data_type {
        DataType::Expense => ledger::load(db, TransactionKind::Expense, user_id)
            .await?
            .into_iter()
            .map(FilterItem::from)
            .collect(),
        DataType::Income => ledger::load(db, TransactionKind::Income, user_id)
            .await?
            .into_iter()
            .map(FilterItem::from)
            .collect(),
        DataType::Loan => loans::load(db, user_id)
            .await?
            .into_iter()
            .map(|l| FilterItem {
                description: l.description,
                category: l.lender,
                amount: l.amount,
                date: l.start_date,
            })
            .collect(),
    })
}

/// Run the query over the user's stored records.
pub async fn run(
    db: &FirestoreDb,
    user_id: &str,
    query: FilterQuery,
    now: DateTime<Utc>,
) -> Result<FilterResult, AppError> {
    let items = load_items(db, user_id, query.data_type).await?;
    let (items, matched) = apply(&query, items, now);
    Ok(FilterResult {
        query,
        items,
        matched,
    })
}

fn type_label(data_type: DataType, lang: Language) -> &'static str {
    match (data_type, lang) {
        (DataType::Expense, Language::Vi) => "chi tiêu",
        (DataType::Income, Language::Vi) => "thu nhập",
        (DataType::Loan, Language::Vi) => "khoản vay",
        (DataType::Expense, Language::En) => "expense",
        (DataType::Income, Language::En) => "income",
        (DataType::Loan, Language::En) => "loan",
    }
}

/// Reply text for a filter result.
pub fn render(result: &FilterResult, lang: Language) -> String {
    let label = type_label(result.query.data_type, lang);
    if result.items.is_empty() {
        return match lang {
            Language::Vi => format!("🔍 Không tìm thấy khoản {label} nào phù hợp."),
            Language::En => format!("🔍 No matching {label} records found."),
        };
    }

    let header = match (result.query.operator, lang) {
        (Some(Operator::Max), Language::Vi) => format!("🔍 Khoản {label} cao nhất:"),
        (Some(Operator::Min), Language::Vi) => format!("🔍 Khoản {label} thấp nhất:"),
        (None, Language::Vi) => format!("🔍 Tìm thấy {} khoản {label} phù hợp:", result.matched),
        (Some(Operator::Max), Language::En) => format!("🔍 Highest {label}:"),
        (Some(Operator::Min), Language::En) => format!("🔍 Lowest {label}:"),
        (None, Language::En) => format!("🔍 Found {} matching {label} records:", result.matched),
    };

    let mut out = header;
    for item in &result.items {
        out.push_str(&format!(
            "\n• {} ({}): {} - {}",
            item.description,
            item.category,
            format_vnd(item.amount),
            item.date.format("%d/%m/%Y")
        ));
    }
    if result.matched > result.items.len() && result.query.operator.is_none() {
        let more = result.matched - result.items.len();
        out.push_str(&match lang {
            Language::Vi => format!("\n… và {more} khoản khác"),
            Language::En => format!("\n… and {more} more"),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn item(description: &str, amount: f64, date: DateTime<Utc>) -> FilterItem {
        FilterItem {
            description: description.to_string(),
            category: "Food".to_string(),
            amount,
            date,
        }
    }

    #[test]
    fn test_parse_operator_and_type() {
        let q = parse("chi tiêu cao nhất của tôi", None).unwrap();
        assert_eq!(q.data_type, DataType::Expense);
        assert_eq!(q.operator, Some(Operator::Max));

        let q = parse("smallest loan", None).unwrap();
        assert_eq!(q.data_type, DataType::Loan);
        assert_eq!(q.operator, Some(Operator::Min));

        assert!(parse("tổng chi tiêu tháng này", None).is_none());
        assert!(parse("cao nhất", None).is_none());
    }

    #[test]
    fn test_parse_threshold() {
        let q = parse("thu nhập trên 5 triệu", None).unwrap();
        assert_eq!(q.data_type, DataType::Income);
        assert_eq!(q.threshold, Some(Threshold::Above(5_000_000.0)));

        let q = parse("expenses less than 200k", None).unwrap();
        assert_eq!(q.threshold, Some(Threshold::Below(200_000.0)));
    }

    #[test]
    fn test_apply_max_and_threshold() {
        let now = Utc.with_ymd_and_hms(2026, 5, 15, 12, 0, 0).unwrap();
        let items = vec![
            item("a", 100.0, now),
            item("b", 900.0, now),
            item("c", 500.0, now - Duration::days(40)),
        ];

        let max = parse("chi tiêu cao nhất", None).unwrap();
        let (found, count) = apply(&max, items.clone(), now);
        assert_eq!(count, 3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, "b");

        let this_month = parse("chi tiêu lớn nhất", Some(TimePeriod::LastMonth)).unwrap();
        let (found, _) = apply(&this_month, items.clone(), now);
        assert_eq!(found[0].description, "c");

        let below = parse("chi tiêu dưới 600", None).unwrap();
        let (found, count) = apply(&below, items, now);
        assert_eq!(count, 2);
        assert_eq!(found[0].description, "a");
        assert_eq!(found[1].description, "c");
    }

    #[test]
    fn test_render_empty_and_list() {
        let now = Utc.with_ymd_and_hms(2026, 5, 15, 12, 0, 0).unwrap();
        let query = parse("income above 1m", None).unwrap();
        let empty = FilterResult {
            query: query.clone(),
            items: vec![],
            matched: 0,
        };
        assert!(render(&empty, Language::En).contains("No matching income"));

        let result = FilterResult {
            query,
            items: vec![item("Salary", 2_000_000.0, now)],
            matched: 1,
        };
        let text = render(&result, Language::En);
        assert!(text.contains("Found 1 matching income"));
        assert!(text.contains("2.000.000 VND"));
        assert!(text.contains("15/05/2026"));
    }
}
