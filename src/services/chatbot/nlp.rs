// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Keyword-scored intent classification for chat messages.
//!
//! Messages are lowercased and stripped of Vietnamese diacritics, then
//! matched against weighted keyword categories. The category mix decides
//! the intent; the summed score decides the confidence.

use crate::models::Language;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Greeting,
    IncomeQuery,
    ExpenseQuery,
    SavingsInvestment,
    BudgetQuery,
    CalculationQuery,
    TimePeriod,
    GoalPlanning,
    QuestionWords,
    TrendComparison,
    FinancialCalculation,
    FinancialPrimary,
    FinancialContextual,
    AboutBot,
    BlockedTopics,
    LoanQuery,
}

/// `(category, weight, keywords)`. Keywords are normalized when the table
/// is first used, so diacritic and plain spellings collapse into one entry.
const KEYWORD_TABLE: &[(Category, f64, &[&str])] = &[
    (
        Category::Greeting,
        1.0,
        &["chào", "xin chào", "chào bạn", "hello", "hi", "hey", "greetings", "good morning", "good evening"],
    ),
    (
        Category::IncomeQuery,
        1.2,
        &[
            "thu nhập", "lương", "tiền lương", "kiếm được", "tiền kiếm", "được bao nhiêu",
            "income", "salary", "wage", "earning", "earn", "make money",
        ],
    ),
    (
        Category::ExpenseQuery,
        1.2,
        &[
            "chi tiêu", "tiêu tiền", "chi phí", "tiêu bao nhiêu", "đã chi",
            "expense", "spending", "spend", "cost", "expenditure",
        ],
    ),
    (
        Category::SavingsInvestment,
        1.1,
        &[
            "tiết kiệm", "đầu tư", "cổ phiếu", "vàng", "bitcoin", "crypto", "gửi tiết kiệm",
            "saving", "savings", "investment", "invest", "stock", "gold",
        ],
    ),
    (
        Category::BudgetQuery,
        1.1,
        &["ngân sách", "giới hạn", "hạn mức", "budget", "budgeting", "limit", "allowance"],
    ),
    (
        Category::CalculationQuery,
        1.3,
        &[
            "tính", "tính toán", "phân tích", "so sánh", "dự đoán", "ước tính",
            "calculate", "calculation", "analyze", "analysis", "compare", "predict", "estimate",
        ],
    ),
    (
        Category::TimePeriod,
        0.8,
        &[
            "tháng này", "tháng trước", "năm nay", "tuần này", "hôm nay", "hiện tại",
            "this month", "last month", "this year", "current", "today", "this week",
        ],
    ),
    (
        Category::GoalPlanning,
        1.0,
        &[
            "mục tiêu", "kế hoạch", "dự định", "muốn", "cần", "sẽ",
            "goal", "target", "plan", "planning", "want", "need", "will",
        ],
    ),
    (
        Category::QuestionWords,
        0.6,
        &[
            "bao nhiêu", "thế nào", "khi nào", "tại sao", "làm sao", "có thể",
            "how much", "how many", "how", "when", "why", "what", "can",
        ],
    ),
    (
        Category::TrendComparison,
        0.9,
        &[
            "xu hướng", "tăng", "giảm", "thay đổi", "khác biệt", "hơn", "kém",
            "trend", "increase", "decrease", "change", "difference", "more", "less", "better", "worse",
        ],
    ),
    (
        Category::FinancialCalculation,
        1.1,
        &[
            "lãi suất", "lợi nhuận", "tỷ lệ", "phần trăm", "%", "tỷ", "triệu",
            "interest", "profit", "percentage", "rate", "ratio", "million", "billion",
        ],
    ),
    (
        Category::FinancialPrimary,
        1.0,
        &["tài chính", "ngân sách", "finance", "financial", "budget", "budgeting"],
    ),
    (
        Category::FinancialContextual,
        0.5,
        &["tiền", "money", "đồng", "vnd", "vndong", "cash", "dollar", "currency"],
    ),
    (
        Category::AboutBot,
        1.0,
        &[
            "bạn là ai", "giúp gì", "bot", "vanlangbot", "chức năng",
            "who are you", "what can you do", "help", "assistant", "function",
        ],
    ),
    (
        Category::BlockedTopics,
        -1.0,
        &[
            "thời tiết", "tin tức", "chính trị", "bóng đá", "game",
            "weather", "news", "politics", "religion", "sports", "games", "entertainment",
        ],
    ),
    (
        Category::LoanQuery,
        1.2,
        &["khoản vay", "vay", "khoản nợ", "loan", "debt", "lender"],
    ),
];

struct KeywordCategory {
    category: Category,
    weight: f64,
    keywords: Vec<String>,
}

static CATEGORIES: LazyLock<Vec<KeywordCategory>> = LazyLock::new(|| {
    KEYWORD_TABLE
        .iter()
        .map(|(category, weight, words)| {
            let mut keywords: Vec<String> = Vec::with_capacity(words.len());
            for w in *words {
                let n = normalize(w);
                if !keywords.contains(&n) {
                    keywords.push(n);
                }
            }
            KeywordCategory {
                category: *category,
                weight: *weight,
                keywords,
            }
        })
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    AboutBot,
    BlockedTopic,
    CalculateIncome,
    CalculateExpense,
    CalculateInvestment,
    CalculateBudget,
    GeneralCalculation,
    LoanQuery,
    IncomeQuery,
    ExpenseQuery,
    InvestmentQuery,
    BudgetQuery,
    TrendAnalysis,
    FinancialPlanning,
    FinancialHighConfidence,
    FinancialMediumConfidence,
    FinancialLowConfidence,
    Unknown,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::AboutBot => "about_bot",
            Intent::BlockedTopic => "blocked_topic",
            Intent::CalculateIncome => "calculate_income",
            Intent::CalculateExpense => "calculate_expense",
            Intent::CalculateInvestment => "calculate_investment",
            Intent::CalculateBudget => "calculate_budget",
            Intent::GeneralCalculation => "general_calculation",
            Intent::LoanQuery => "loan_query",
            Intent::IncomeQuery => "income_query",
            Intent::ExpenseQuery => "expense_query",
            Intent::InvestmentQuery => "investment_query",
            Intent::BudgetQuery => "budget_query",
            Intent::TrendAnalysis => "trend_analysis",
            Intent::FinancialPlanning => "financial_planning",
            Intent::FinancialHighConfidence => "financial_high_confidence",
            Intent::FinancialMediumConfidence => "financial_medium_confidence",
            Intent::FinancialLowConfidence => "financial_low_confidence",
            Intent::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    CurrentMonth,
    LastMonth,
    CurrentYear,
    Today,
}

/// Classification of one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub intent: Intent,
    /// 0.0 to 0.95, two decimals
    pub confidence: f64,
    pub language: Language,
    pub score: f64,
    pub categories: Vec<Category>,
    pub time_period: Option<TimePeriod>,
    pub needs_calculation: bool,
    pub is_question: bool,
}

impl IntentAnalysis {
    pub fn has(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }
}

fn strip_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'ạ' | 'ả' | 'ã' | 'â' | 'ầ' | 'ấ' | 'ậ' | 'ẩ' | 'ẫ' | 'ă' | 'ằ' | 'ắ' | 'ặ'
        | 'ẳ' | 'ẵ' => 'a',
        'è' | 'é' | 'ẹ' | 'ẻ' | 'ẽ' | 'ê' | 'ề' | 'ế' | 'ệ' | 'ể' | 'ễ' => 'e',
        'ì' | 'í' | 'ị' | 'ỉ' | 'ĩ' => 'i',
        'ò' | 'ó' | 'ọ' | 'ỏ' | 'õ' | 'ô' | 'ồ' | 'ố' | 'ộ' | 'ổ' | 'ỗ' | 'ơ' | 'ờ' | 'ớ' | 'ợ'
        | 'ở' | 'ỡ' => 'o',
        'ù' | 'ú' | 'ụ' | 'ủ' | 'ũ' | 'ư' | 'ừ' | 'ứ' | 'ự' | 'ử' | 'ữ' => 'u',
        'ỳ' | 'ý' | 'ỵ' | 'ỷ' | 'ỹ' => 'y',
        'đ' => 'd',
        other => other,
    }
}

/// Lowercase, trim and strip Vietnamese diacritics.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase().chars().map(strip_diacritic).collect()
}

/// True when `keyword` occurs in `text` without touching other word characters.
///
/// Only keyword edges that are alphanumeric are checked, so `%` matches
/// anywhere while `hi` does not match inside `chi`.
pub fn contains_word(text: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    let first_alnum = keyword.chars().next().is_some_and(char::is_alphanumeric);
    let last_alnum = keyword.chars().next_back().is_some_and(char::is_alphanumeric);

    text.match_indices(keyword).any(|(start, m)| {
        let end = start + m.len();
        let before_ok =
            !first_alnum || !text[..start].chars().next_back().is_some_and(char::is_alphanumeric);
        let after_ok = !last_alnum || !text[end..].chars().next().is_some_and(char::is_alphanumeric);
        before_ok && after_ok
    })
}

/// `vi` when the text carries Vietnamese letters, `en` otherwise.
pub fn detect_language(text: &str) -> Language {
    let lower = text.to_lowercase();
    if lower.chars().any(|c| c != strip_diacritic(c)) {
        Language::Vi
    } else {
        Language::En
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn time_period(normalized: &str) -> Option<TimePeriod> {
    let any = |words: &[&str]| words.iter().any(|w| contains_word(normalized, w));
    if any(&["thang nay", "this month"]) {
        Some(TimePeriod::CurrentMonth)
    } else if any(&["thang truoc", "last month"]) {
        Some(TimePeriod::LastMonth)
    } else if any(&["nam nay", "this year"]) {
        Some(TimePeriod::CurrentYear)
    } else if any(&["hom nay", "today"]) {
        Some(TimePeriod::Today)
    } else {
        None
    }
}

/// Classify a message.
pub fn analyze(message: &str) -> IntentAnalysis {
    let language = detect_language(message);
    let normalized = normalize(message);

    let mut total = 0.0;
    let mut categories = Vec::new();
    for cat in CATEGORIES.iter() {
        let matches = cat
            .keywords
            .iter()
            .filter(|k| contains_word(&normalized, k))
            .count();
        if matches > 0 {
            total += matches as f64 * cat.weight;
            categories.push(cat.category);
        }
    }

    let has = |c: Category| categories.contains(&c);
    let topical = [
        (Category::IncomeQuery, Intent::CalculateIncome, Intent::IncomeQuery),
        (Category::ExpenseQuery, Intent::CalculateExpense, Intent::ExpenseQuery),
        (Category::SavingsInvestment, Intent::CalculateInvestment, Intent::InvestmentQuery),
        (Category::BudgetQuery, Intent::CalculateBudget, Intent::BudgetQuery),
    ];

    let (intent, confidence) = if has(Category::Greeting) {
        (Intent::Greeting, 0.9)
    } else if has(Category::AboutBot) {
        (Intent::AboutBot, 0.9)
    } else if has(Category::BlockedTopics) || total <= -0.5 {
        (Intent::BlockedTopic, 0.8)
    } else if has(Category::CalculationQuery) {
        let intent = topical
            .iter()
            .find(|(c, _, _)| has(*c))
            .map_or(Intent::GeneralCalculation, |(_, calc, _)| *calc);
        (intent, f64::min(total / 2.0, 0.95))
    } else if has(Category::LoanQuery) {
        (Intent::LoanQuery, f64::min(total / 1.5, 0.9))
    } else if let Some((_, _, query)) = topical.iter().find(|(c, _, _)| has(*c)) {
        (*query, f64::min(total / 1.5, 0.9))
    } else if has(Category::TrendComparison) {
        (Intent::TrendAnalysis, f64::min(total / 1.3, 0.85))
    } else if has(Category::GoalPlanning) {
        (Intent::FinancialPlanning, f64::min(total / 1.2, 0.8))
    } else if total >= 1.0 {
        (Intent::FinancialHighConfidence, f64::min(total / 2.0, 0.95))
    } else if total >= 0.5 {
        (Intent::FinancialMediumConfidence, total * 0.7)
    } else if total > 0.0 {
        (Intent::FinancialLowConfidence, total * 0.5)
    } else {
        (Intent::Unknown, 0.0)
    };

    let time_period = if has(Category::TimePeriod) {
        time_period(&normalized)
    } else {
        None
    };

    IntentAnalysis {
        intent,
        confidence: round2(confidence),
        language,
        score: round2(total),
        needs_calculation: has(Category::CalculationQuery),
        is_question: has(Category::QuestionWords),
        time_period,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Chi Tiêu THÁNG Này "), "chi tieu thang nay");
        assert_eq!(normalize("Đầu tư"), "dau tu");
    }

    #[test]
    fn test_contains_word_respects_boundaries() {
        assert!(contains_word("hi there", "hi"));
        assert!(!contains_word("chi tieu", "hi"));
        assert!(contains_word("lai suat 5%/nam", "%"));
        assert!(contains_word("tong chi tieu.", "chi tieu"));
        assert!(!contains_word("vayne", "vay"));
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("Tôi chi bao nhiêu?"), Language::Vi);
        assert_eq!(detect_language("How much did I spend?"), Language::En);
    }

    #[test]
    fn test_greeting_wins() {
        let a = analyze("Xin chào bạn");
        assert_eq!(a.intent, Intent::Greeting);
        assert_eq!(a.confidence, 0.9);
    }

    #[test]
    fn test_expense_query_not_mistaken_for_greeting() {
        let a = analyze("Chi tiêu tháng này của tôi");
        assert_eq!(a.intent, Intent::ExpenseQuery);
        assert_eq!(a.time_period, Some(TimePeriod::CurrentMonth));
        // 1.2 + 0.8 = 2.0 → capped at 0.9
        assert_eq!(a.confidence, 0.9);
    }

    #[test]
    fn test_calculation_intents() {
        assert_eq!(analyze("phân tích thu nhập").intent, Intent::CalculateIncome);
        assert_eq!(analyze("calculate my budget").intent, Intent::CalculateBudget);
        let a = analyze("tính 5 + 3");
        assert_eq!(a.intent, Intent::GeneralCalculation);
        // 1.3 / 2
        assert_eq!(a.confidence, 0.65);
    }

    #[test]
    fn test_loan_query() {
        let a = analyze("khoản vay của tôi");
        assert_eq!(a.intent, Intent::LoanQuery);
        // "khoan vay" and "vay" both match
        assert_eq!(a.score, 2.4);
        assert_eq!(a.confidence, 0.9);

        let a = analyze("show my debt");
        assert_eq!(a.confidence, 0.8);
    }

    #[test]
    fn test_blocked_topic() {
        assert_eq!(analyze("thời tiết hôm nay").intent, Intent::BlockedTopic);
        assert_eq!(analyze("latest politics").intent, Intent::BlockedTopic);
    }

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(analyze("asdf qwerty").intent, Intent::Unknown);
        assert_eq!(analyze("asdf qwerty").confidence, 0.0);

        let a = analyze("tiền");
        assert_eq!(a.intent, Intent::FinancialMediumConfidence);
        assert_eq!(a.confidence, 0.35);
    }

    #[test]
    fn test_trend_and_planning() {
        assert_eq!(analyze("xu hướng tháng trước").intent, Intent::TrendAnalysis);
        assert_eq!(analyze("mục tiêu 100 triệu").intent, Intent::FinancialPlanning);
    }
}
