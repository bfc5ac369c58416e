// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reply texts, both canned and built from a financial snapshot.

use super::calculator::{format_number, format_vnd, goal_amount};
use crate::models::Language;
use crate::services::finance::{
    self, budget_health, interest_class, performance_rating, BudgetHealth, FinancialSnapshot,
};

/// Planning target when the message names none.
pub const DEFAULT_GOAL: f64 = 50_000_000.0;

pub fn greeting(lang: Language) -> &'static str {
    match lang {
        Language::Vi => "Chào bạn! Tôi là VanLangBot, trợ lý tài chính AI của bạn. Tôi có thể giúp gì cho bạn hôm nay? 💰",
        Language::En => "Hello! I am VanLangBot, your AI financial assistant. How can I help you today? 💰",
    }
}

pub fn farewell(lang: Language) -> &'static str {
    match lang {
        Language::Vi => "Tạm biệt! Chúc bạn một ngày tốt lành. Hẹn gặp lại! 👋",
        Language::En => "Goodbye! Have a great day. See you later! 👋",
    }
}

pub fn about(lang: Language) -> &'static str {
    match lang {
        Language::Vi => "Tôi là VanLangBot, trợ lý tài chính AI được thiết kế để giúp bạn quản lý tài chính cá nhân, theo dõi thu chi, phân tích đầu tư và lập kế hoạch cho tương lai. Hãy hỏi tôi bất cứ điều gì liên quan đến tài chính của bạn!",
        Language::En => "I am VanLangBot, an AI financial assistant designed to help you manage your personal finances, track income and expenses, analyze investments, and plan for the future. Feel free to ask me anything about your finances!",
    }
}

pub fn capability(lang: Language) -> &'static str {
    match lang {
        Language::Vi => "Tôi có thể giúp bạn: theo dõi thu nhập và chi tiêu, phân tích các khoản đầu tư, xem xét các khoản vay, đặt mục tiêu tiết kiệm, và đưa ra các gợi ý tài chính thông minh. Bạn muốn tôi giúp gì cụ thể?",
        Language::En => "I can help you with: tracking income and expenses, analyzing investments, reviewing loans, setting savings goals, and providing smart financial suggestions. What can I help you with specifically?",
    }
}

pub fn blocked(lang: Language) -> &'static str {
    match lang {
        Language::Vi => "Xin lỗi, tôi chỉ được lập trình để hỗ trợ các vấn đề liên quan đến tài chính cá nhân trong ứng dụng VanLang Budget. Bạn có câu hỏi nào khác về tài chính không?",
        Language::En => "Sorry, I am only programmed to assist with personal finance matters within the VanLang Budget application. Do you have any other finance-related questions?",
    }
}

pub fn not_understood(lang: Language) -> String {
    match lang {
        Language::Vi => format!(
            "🤔 Xin lỗi, tôi chưa hiểu câu hỏi của bạn. {}",
            capability(lang)
        ),
        Language::En => format!(
            "🤔 Sorry, I didn't understand your question. {}",
            capability(lang)
        ),
    }
}

pub fn invalid_message(lang: Language) -> &'static str {
    match lang {
        Language::Vi => "Tin nhắn không hợp lệ.",
        Language::En => "Invalid message.",
    }
}

pub fn message_too_long(lang: Language) -> &'static str {
    match lang {
        Language::Vi => "Tin nhắn quá dài.",
        Language::En => "Message is too long.",
    }
}

pub fn calculation_help(lang: Language) -> &'static str {
    match lang {
        Language::Vi => "❌ Không thể thực hiện phép tính. Hãy thử:\n• \"15% của 2 triệu\"\n• \"lãi suất 6% của 100 triệu trong 6 tháng\"\n• \"500k x 3\" hoặc \"10 triệu chia 4\"",
        Language::En => "❌ I couldn't compute that. Try:\n• \"15% of 2m\"\n• \"interest 6% on 100m for 6 months\"\n• \"500k x 3\" or \"10m divided by 4\"",
    }
}

pub fn division_by_zero(lang: Language) -> &'static str {
    match lang {
        Language::Vi => "❌ Không thể chia cho 0.",
        Language::En => "❌ Cannot divide by zero.",
    }
}

fn percent(value: f64) -> String {
    format!("{}%", format_number(value))
}

/// Income this month, its trend, and a 50/30/20 split of it.
pub fn income_analysis(s: &FinancialSnapshot, lang: Language) -> String {
    let trend = finance::analyze_trend(s.income_this_month, s.income_last_month, false, lang);
    let plan = finance::recommended_budget(s.income_this_month);
    match lang {
        Language::Vi => format!(
            "💵 Thu nhập tháng {}/{}: {}\nTháng trước: {} ({})\n{}\n\n📋 Ngân sách đề xuất (50/30/20):\n• Thiết yếu: {}\n• Mong muốn: {}\n• Tiết kiệm: {}",
            s.month,
            s.year,
            format_vnd(s.income_this_month),
            format_vnd(s.income_last_month),
            percent(trend.change_percent),
            trend.analysis,
            format_vnd(plan.necessities),
            format_vnd(plan.wants),
            format_vnd(plan.savings)
        ),
        Language::En => format!(
            "💵 Income for {}/{}: {}\nLast month: {} ({})\n{}\n\n📋 Suggested budget (50/30/20):\n• Needs: {}\n• Wants: {}\n• Savings: {}",
            s.month,
            s.year,
            format_vnd(s.income_this_month),
            format_vnd(s.income_last_month),
            percent(trend.change_percent),
            trend.analysis,
            format_vnd(plan.necessities),
            format_vnd(plan.wants),
            format_vnd(plan.savings)
        ),
    }
}

/// Spending this month, its share of income, and the top three categories.
pub fn expense_analysis(s: &FinancialSnapshot, lang: Language) -> String {
    let mut out = match lang {
        Language::Vi => format!(
            "💸 Chi tiêu tháng {}/{}: {}\nTỷ lệ chi tiêu so với thu nhập: {}",
            s.month,
            s.year,
            format_vnd(s.expenses_this_month),
            percent(s.spending_rate())
        ),
        Language::En => format!(
            "💸 Spending for {}/{}: {}\nSpending rate versus income: {}",
            s.month,
            s.year,
            format_vnd(s.expenses_this_month),
            percent(s.spending_rate())
        ),
    };
    if !s.expenses_by_category.is_empty() {
        out.push_str(match lang {
            Language::Vi => "\n\nDanh mục chi nhiều nhất:",
            Language::En => "\n\nTop categories:",
        });
        for (i, c) in s.expenses_by_category.iter().take(3).enumerate() {
            out.push_str(&format!("\n{}. {}: {}", i + 1, c.category, format_vnd(c.total)));
        }
    }
    out
}

pub fn investment_analysis(s: &FinancialSnapshot, lang: Language) -> String {
    if s.investments.is_empty() {
        return match lang {
            Language::Vi => "📈 Bạn chưa có khoản đầu tư nào.".to_string(),
            Language::En => "📈 You don't have any investments yet.".to_string(),
        };
    }
    let ret = s.investment_return();
    let rating = performance_rating(ret).label(lang);
    let mut out = match lang {
        Language::Vi => format!(
            "📈 Danh mục đầu tư: {} khoản\nĐã đầu tư: {}\nGiá trị hiện tại: {}\nLãi/lỗ: {} ({})\nHiệu quả: {}",
            s.investments.len(),
            format_vnd(s.total_invested),
            format_vnd(s.total_investment_value),
            format_vnd(s.total_investment_profit()),
            percent(ret),
            rating
        ),
        Language::En => format!(
            "📈 Portfolio: {} investments\nInvested: {}\nCurrent value: {}\nProfit/loss: {} ({})\nPerformance: {}",
            s.investments.len(),
            format_vnd(s.total_invested),
            format_vnd(s.total_investment_value),
            format_vnd(s.total_investment_profit()),
            percent(ret),
            rating
        ),
    };
    for inv in &s.investments {
        out.push_str(&format!(
            "\n• {} ({}): {} → {}",
            inv.name,
            inv.investment_type.as_str(),
            format_vnd(inv.invested),
            format_vnd(inv.value)
        ));
    }
    out
}

pub fn budget_analysis(s: &FinancialSnapshot, lang: Language) -> String {
    if s.budgets.is_empty() {
        return match lang {
            Language::Vi => format!("📊 Bạn chưa đặt ngân sách cho tháng {}/{}.", s.month, s.year),
            Language::En => format!("📊 You have no budgets for {}/{}.", s.month, s.year),
        };
    }
    let mut out = match lang {
        Language::Vi => format!("📊 Ngân sách tháng {}/{}:", s.month, s.year),
        Language::En => format!("📊 Budgets for {}/{}:", s.month, s.year),
    };
    for b in &s.budgets {
        let marker = match budget_health(b.percentage) {
            BudgetHealth::Over => "🔴",
            BudgetHealth::Near => "🟡",
            BudgetHealth::Healthy => "🟢",
        };
        out.push_str(&format!(
            "\n{marker} {}: {} / {} ({}%)",
            b.category,
            format_vnd(b.spent),
            format_vnd(b.limit),
            b.percentage
        ));
    }
    let over = s
        .budgets
        .iter()
        .filter(|b| budget_health(b.percentage) == BudgetHealth::Over)
        .count();
    if over > 0 {
        out.push_str(&match lang {
            Language::Vi => format!("\n\n⚠️ {over} ngân sách đã vượt hạn mức."),
            Language::En => format!("\n\n⚠️ {over} budget(s) are over the limit."),
        });
    }
    out
}

pub fn loan_summary(s: &FinancialSnapshot, lang: Language) -> String {
    if s.loans.is_empty() {
        return match lang {
            Language::Vi => "🏦 Bạn không có khoản vay nào đang hoạt động.".to_string(),
            Language::En => "🏦 You have no outstanding loans.".to_string(),
        };
    }
    let total_interest: f64 = s.loans.iter().map(|l| l.interest).sum();
    let mut out = match lang {
        Language::Vi => format!(
            "🏦 Bạn có {} khoản vay, tổng dư nợ {} (lãi dự kiến {}):",
            s.loans.len(),
            format_vnd(s.total_loan_amount),
            format_vnd(total_interest)
        ),
        Language::En => format!(
            "🏦 You have {} loans, {} outstanding ({} expected interest):",
            s.loans.len(),
            format_vnd(s.total_loan_amount),
            format_vnd(total_interest)
        ),
    };
    for l in &s.loans {
        let class = interest_class(l.interest_rate).label(lang);
        out.push_str(&match lang {
            Language::Vi => format!(
                "\n• {} ({}): còn {}, lãi suất {}% ({}), trả hàng tháng {}, hạn {}",
                l.description,
                l.lender,
                format_vnd(l.remaining),
                format_number(l.interest_rate),
                class,
                format_vnd(l.monthly_payment),
                l.due_date.format("%d/%m/%Y")
            ),
            Language::En => format!(
                "\n• {} ({}): {} remaining, {}% rate ({}), {} monthly, due {}",
                l.description,
                l.lender,
                format_vnd(l.remaining),
                format_number(l.interest_rate),
                class,
                format_vnd(l.monthly_payment),
                l.due_date.format("%d/%m/%Y")
            ),
        });
    }
    out
}

pub fn trend_report(s: &FinancialSnapshot, lang: Language) -> String {
    let income = finance::analyze_trend(s.income_this_month, s.income_last_month, false, lang);
    let expense = finance::analyze_trend(s.expenses_this_month, s.expenses_last_month, true, lang);
    match lang {
        Language::Vi => format!(
            "📉 So sánh với tháng trước:\n• Thu nhập: {} → {} ({}). {}\n• Chi tiêu: {} → {} ({}). {}",
            format_vnd(income.previous),
            format_vnd(income.current),
            percent(income.change_percent),
            income.analysis,
            format_vnd(expense.previous),
            format_vnd(expense.current),
            percent(expense.change_percent),
            expense.analysis
        ),
        Language::En => format!(
            "📉 Compared with last month:\n• Income: {} → {} ({}). {}\n• Spending: {} → {} ({}). {}",
            format_vnd(income.previous),
            format_vnd(income.current),
            percent(income.change_percent),
            income.analysis,
            format_vnd(expense.previous),
            format_vnd(expense.current),
            percent(expense.change_percent),
            expense.analysis
        ),
    }
}

/// Savings goal and emergency fund for the amount named in `message`.
pub fn planning(s: &FinancialSnapshot, message: &str, lang: Language) -> String {
    let target = goal_amount(message).unwrap_or(DEFAULT_GOAL);
    let goal = finance::savings_goal(
        target,
        s.balance.max(0.0),
        s.income_this_month,
        s.expenses_this_month,
        finance::DEFAULT_GOAL_MONTHS,
        lang,
    );
    let fund = finance::emergency_fund(s.expenses_this_month, finance::EMERGENCY_FUND_MONTHS);

    let timeline = match (goal.months_needed, lang) {
        (Some(m), Language::Vi) => format!("Thời gian cần thiết: {m} tháng"),
        (Some(m), Language::En) => format!("Time needed: {m} months"),
        (None, Language::Vi) => "Thời gian cần thiết: chưa xác định".to_string(),
        (None, Language::En) => "Time needed: not reachable yet".to_string(),
    };
    match lang {
        Language::Vi => format!(
            "🎯 Mục tiêu tiết kiệm: {}\nCòn thiếu: {}\nTiết kiệm hiện tại mỗi tháng: {}\nCần tiết kiệm mỗi tháng (trong {} tháng): {}\n{}\n💡 {}\n\n🛟 Quỹ khẩn cấp nên có: {} ({} tháng chi tiêu)",
            format_vnd(goal.target_amount),
            format_vnd(goal.remaining_amount),
            format_vnd(goal.current_monthly_savings),
            finance::DEFAULT_GOAL_MONTHS,
            format_vnd(goal.monthly_savings_required),
            timeline,
            goal.recommendation,
            format_vnd(fund.required_amount),
            fund.target_months
        ),
        Language::En => format!(
            "🎯 Savings goal: {}\nStill needed: {}\nCurrent monthly savings: {}\nRequired per month (over {} months): {}\n{}\n💡 {}\n\n🛟 Suggested emergency fund: {} ({} months of expenses)",
            format_vnd(goal.target_amount),
            format_vnd(goal.remaining_amount),
            format_vnd(goal.current_monthly_savings),
            finance::DEFAULT_GOAL_MONTHS,
            format_vnd(goal.monthly_savings_required),
            timeline,
            goal.recommendation,
            format_vnd(fund.required_amount),
            fund.target_months
        ),
    }
}

/// General picture of the user's finances.
pub fn overview(s: &FinancialSnapshot, lang: Language) -> String {
    match lang {
        Language::Vi => format!(
            "📋 Tổng quan tài chính tháng {}/{}:\n• Thu nhập: {}\n• Chi tiêu: {}\n• Tiết kiệm: {}\n• Số dư tích lũy: {}\n• Dư nợ vay: {}\n• Giá trị đầu tư: {}",
            s.month,
            s.year,
            format_vnd(s.income_this_month),
            format_vnd(s.expenses_this_month),
            format_vnd(s.savings_this_month()),
            format_vnd(s.balance),
            format_vnd(s.total_loan_amount),
            format_vnd(s.total_investment_value)
        ),
        Language::En => format!(
            "📋 Financial overview for {}/{}:\n• Income: {}\n• Spending: {}\n• Savings: {}\n• Overall balance: {}\n• Outstanding loans: {}\n• Investment value: {}",
            s.month,
            s.year,
            format_vnd(s.income_this_month),
            format_vnd(s.expenses_this_month),
            format_vnd(s.savings_this_month()),
            format_vnd(s.balance),
            format_vnd(s.total_loan_amount),
            format_vnd(s.total_investment_value)
        ),
    }
}
