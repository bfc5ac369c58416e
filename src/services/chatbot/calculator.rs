// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Arithmetic, percentage and simple-interest questions.
//!
//! Amounts accept Vietnamese and English unit suffixes (`500k`, `2 triệu`,
//! `1.5 tỷ`). Arithmetic is evaluated by a small recursive-descent parser
//! over `+ - * / ( )`.

use crate::models::Language;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

pub(crate) const NUMBER: &str = r"(\d{1,3}(?:\.\d{3}){2,}|\d+(?:[.,]\d+)?)";
pub(crate) const UNIT: &str = r"(k|nghìn|ngàn|triệu|tr|m|tỷ|b)?";

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){NUMBER}\s*{UNIT}\b")).expect("valid regex")
});

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i){NUMBER}\s*(?:%|phần trăm|percent)\s*(?:của|of)\s*{NUMBER}\s*{UNIT}\b"
    ))
    .expect("valid regex")
});

static INTEREST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:lãi suất|lãi|interest(?: rate)?)\s*(?:of\s*)?{NUMBER}\s*%\s*(?:/\s*năm|per year|a year)?\s*(?:của|of|cho|on)?\s*{NUMBER}\s*{UNIT}\b(?:\s*(?:trong|for|in))?(?:\s*(\d+)\s*(tháng|months?|năm|years?))?"
    ))
    .expect("valid regex")
});

static OPERATOR_WORDS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\bdivided\s+by\b", " / "),
        (r"(?i)\b(?:cộng|plus)\b", " + "),
        (r"(?i)\b(?:trừ|minus)\b", " - "),
        (r"(?i)\b(?:nhân|times|multiplied\s+by)\b", " * "),
        (r"(?i)\bchia\b", " / "),
        (r"(?i)(\d)\s*[x×]\s*(\d)", "$1 * $2"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid regex"), replacement))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("invalid expression: {0}")]
    Invalid(String),
}

/// A recognised calculation and its result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Calculation {
    Percentage {
        percent: f64,
        base: f64,
        result: f64,
    },
    SimpleInterest {
        principal: f64,
        annual_rate: f64,
        months: u32,
        interest: f64,
        total: f64,
    },
    Arithmetic {
        expression: String,
        result: f64,
    },
}

fn unit_multiplier(unit: &str) -> f64 {
    match unit.to_lowercase().as_str() {
        "k" | "nghìn" | "ngàn" => 1_000.0,
        "triệu" | "tr" | "m" => 1_000_000.0,
        "tỷ" | "b" => 1_000_000_000.0,
        _ => 1.0,
    }
}

/// Parse a bare number. `1.000.000` is read as grouped thousands,
/// `1.5` and `1,5` as decimals.
pub fn parse_number(raw: &str) -> Option<f64> {
    if raw.matches('.').count() >= 2 {
        return raw.replace('.', "").parse().ok();
    }
    raw.replace(',', ".").parse().ok()
}

/// Parse a number with an optional unit suffix.
pub fn parse_amount(number: &str, unit: &str) -> Option<f64> {
    Some(parse_number(number)? * unit_multiplier(unit))
}

/// Every amount mentioned in `text`, in order.
pub fn extract_amounts(text: &str) -> Vec<f64> {
    AMOUNT_RE
        .captures_iter(text)
        .filter_map(|c| {
            let unit = c.get(2).map_or("", |m| m.as_str());
            parse_amount(&c[1], unit)
        })
        .collect()
}

/// First amount in a planning question. A number without a unit is read
/// as thousands of dong.
pub fn goal_amount(text: &str) -> Option<f64> {
    let c = AMOUNT_RE.captures(text)?;
    match c.get(2) {
        Some(unit) => parse_amount(&c[1], unit.as_str()),
        None => parse_number(&c[1]).map(|n| n * 1_000.0),
    }
}

/// `percent` percent of `base`.
pub fn percentage_of(percent: f64, base: f64) -> f64 {
    base * percent / 100.0
}

/// Simple interest over `months` at an annual percentage rate: `P·r·N/1200`.
pub fn simple_interest(principal: f64, annual_rate: f64, months: u32) -> f64 {
    principal * annual_rate * f64::from(months) / 1200.0
}

fn try_percentage(text: &str) -> Option<Calculation> {
    let c = PERCENT_RE.captures(text)?;
    let percent = parse_number(&c[1])?;
    let base = parse_amount(&c[2], c.get(3).map_or("", |m| m.as_str()))?;
    Some(Calculation::Percentage {
        percent,
        base,
        result: percentage_of(percent, base),
    })
}

fn try_interest(text: &str) -> Option<Calculation> {
    let c = INTEREST_RE.captures(text)?;
    let annual_rate = parse_number(&c[1])?;
    let principal = parse_amount(&c[2], c.get(3).map_or("", |m| m.as_str()))?;
    let count: u32 = c.get(4).and_then(|m| m.as_str().parse().ok()).unwrap_or(12);
    let in_years = c
        .get(5)
        .is_some_and(|m| matches!(m.as_str().to_lowercase().as_str(), "năm" | "year" | "years"));
    let months = if in_years { count * 12 } else { count };
    let interest = simple_interest(principal, annual_rate, months);
    Some(Calculation::SimpleInterest {
        principal,
        annual_rate,
        months,
        interest,
        total: principal + interest,
    })
}

/// Rewrite a message into a bare arithmetic expression, if it contains one.
fn extract_expression(text: &str) -> Option<String> {
    let mut expr = AMOUNT_RE
        .replace_all(text, |c: &regex::Captures| {
            let unit = c.get(2).map_or("", |m| m.as_str());
            parse_amount(&c[1], unit).map_or_else(|| c[0].to_string(), |v| format!(" {v} "))
        })
        .into_owned();
    for (re, replacement) in OPERATOR_WORDS.iter() {
        expr = re.replace_all(&expr, *replacement).into_owned();
    }

    let cleaned: String = expr
        .chars()
        .filter(|c| c.is_ascii_digit() || "+-*/().".contains(*c))
        .collect();
    let has_operator = cleaned
        .char_indices()
        .any(|(i, c)| "+*/".contains(c) || (c == '-' && i > 0));
    let numbers = cleaned.split(|c: char| !c.is_ascii_digit() && c != '.').filter(|s| !s.is_empty()).count();
    (has_operator && numbers >= 2).then_some(cleaned)
}

/// Recognise and evaluate a calculation in the message.
///
/// `None` when the message holds nothing computable.
/// Interest questions also contain a percentage, so they are tried first.
pub fn calculate(text: &str) -> Option<Result<Calculation, CalcError>> {
    if let Some(calc) = try_interest(text) {
        return Some(Ok(calc));
    }
    if let Some(calc) = try_percentage(text) {
        return Some(Ok(calc));
    }
    let expression = extract_expression(text)?;
    Some(evaluate(&expression).map(|result| Calculation::Arithmetic { expression, result }))
}

// ─── Expression evaluation ───────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    Open,
    Close,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut num = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = num
                    .parse()
                    .map_err(|_| CalcError::Invalid(format!("bad number '{num}'")))?;
                tokens.push(Token::Num(value));
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            other => return Err(CalcError::Invalid(format!("unexpected '{other}'"))),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.peek();
        self.pos += 1;
        t
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.factor()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, CalcError> {
        match self.next() {
            Some(Token::Num(v)) => Ok(v),
            Some(Token::Op('-')) => Ok(-self.factor()?),
            Some(Token::Op('+')) => self.factor(),
            Some(Token::Open) => {
                let v = self.expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(v),
                    _ => Err(CalcError::Invalid("unbalanced parentheses".to_string())),
                }
            }
            Some(t) => Err(CalcError::Invalid(format!("unexpected {t:?}"))),
            None => Err(CalcError::Invalid("unexpected end of expression".to_string())),
        }
    }
}

/// Evaluate `+ - * / ( )` over decimal numbers.
pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(CalcError::Invalid("empty expression".to_string()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(CalcError::Invalid("trailing input".to_string()));
    }
    Ok(value)
}

// ─── Formatting ──────────────────────────────────────────────

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// vi-VN number: `.` thousands separator, `,` before up to two decimals.
pub fn format_number(value: f64) -> String {
    let negative = value < 0.0;
    let scaled = (value.abs() * 100.0).round() as u128;
    let (whole, frac) = (scaled / 100, scaled % 100);
    let mut out = String::new();
    if negative && scaled != 0 {
        out.push('-');
    }
    out.push_str(&group_thousands(&whole.to_string()));
    if frac != 0 {
        let frac = format!("{frac:02}");
        out.push(',');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

/// Whole-dong amount with grouping and a `VND` suffix.
pub fn format_vnd(amount: f64) -> String {
    format!("{} VND", format_number(amount.round()))
}

impl Calculation {
    pub fn render(&self, lang: Language) -> String {
        match (self, lang) {
            (Calculation::Percentage { percent, base, result }, Language::Vi) => format!(
                "🧮 {}% của {} = {}",
                format_number(*percent),
                format_vnd(*base),
                format_vnd(*result)
            ),
            (Calculation::Percentage { percent, base, result }, Language::En) => format!(
                "🧮 {}% of {} = {}",
                format_number(*percent),
                format_vnd(*base),
                format_vnd(*result)
            ),
            (
                Calculation::SimpleInterest { principal, annual_rate, months, interest, total },
                Language::Vi,
            ) => format!(
                "🧮 Lãi đơn: vốn {}, lãi suất {}%/năm trong {} tháng.\nTiền lãi: {}\nTổng cộng: {}",
                format_vnd(*principal),
                format_number(*annual_rate),
                months,
                format_vnd(*interest),
                format_vnd(*total)
            ),
            (
                Calculation::SimpleInterest { principal, annual_rate, months, interest, total },
                Language::En,
            ) => format!(
                "🧮 Simple interest: principal {}, {}% per year over {} months.\nInterest: {}\nTotal: {}",
                format_vnd(*principal),
                format_number(*annual_rate),
                months,
                format_vnd(*interest),
                format_vnd(*total)
            ),
            (Calculation::Arithmetic { expression, result }, Language::Vi) => {
                format!("🧮 Phép tính: {} = {}", expression, format_number(*result))
            }
            (Calculation::Arithmetic { expression, result }, Language::En) => {
                format!("🧮 Calculation: {} = {}", expression, format_number(*result))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amounts() {
        assert_eq!(extract_amounts("500k"), vec![500_000.0]);
        assert_eq!(extract_amounts("2 triệu và 1.5 tỷ"), vec![2_000_000.0, 1_500_000_000.0]);
        assert_eq!(extract_amounts("10tr"), vec![10_000_000.0]);
        assert_eq!(extract_amounts("1.000.000 đồng"), vec![1_000_000.0]);
        assert_eq!(extract_amounts("15 nghìn"), vec![15_000.0]);
    }

    #[test]
    fn test_percentage() {
        let calc = calculate("15% của 2 triệu").unwrap().unwrap();
        assert_eq!(
            calc,
            Calculation::Percentage {
                percent: 15.0,
                base: 2_000_000.0,
                result: 300_000.0
            }
        );
        assert!(matches!(
            calculate("what is 20 percent of 500k"),
            Some(Ok(Calculation::Percentage { result, .. })) if result == 100_000.0
        ));
    }

    #[test]
    fn test_simple_interest() {
        let calc = calculate("lãi suất 6% của 100 triệu trong 6 tháng").unwrap().unwrap();
        match calc {
            Calculation::SimpleInterest { interest, months, total, .. } => {
                assert_eq!(months, 6);
                assert_eq!(interest, 3_000_000.0);
                assert_eq!(total, 103_000_000.0);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            calculate("interest 6% of 100m for 6 months"),
            Some(Ok(Calculation::SimpleInterest { months: 6, interest, .. })) if interest == 3_000_000.0
        ));

        // Years are converted, default term is 12 months
        assert!(matches!(
            calculate("interest 10% on 1m for 2 years"),
            Some(Ok(Calculation::SimpleInterest { months: 24, .. }))
        ));
        assert!(matches!(
            calculate("lãi 12% 10 triệu"),
            Some(Ok(Calculation::SimpleInterest { months: 12, interest, .. })) if interest == 1_200_000.0
        ));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(evaluate("2+3*4").unwrap(), 14.0);
        assert_eq!(evaluate("(2+3)*4").unwrap(), 20.0);
        assert_eq!(evaluate("-5+2").unwrap(), -3.0);
        assert_eq!(evaluate("7/0"), Err(CalcError::DivisionByZero));
        assert!(evaluate("(1+2").is_err());
        assert!(evaluate("1+").is_err());
    }

    #[test]
    fn test_word_operators() {
        assert!(matches!(
            calculate("tính 5 cộng 3 nhân 2"),
            Some(Ok(Calculation::Arithmetic { result, .. })) if result == 11.0
        ));
        assert!(matches!(
            calculate("100 divided by 4"),
            Some(Ok(Calculation::Arithmetic { result, .. })) if result == 25.0
        ));
        assert!(matches!(
            calculate("500k x 3"),
            Some(Ok(Calculation::Arithmetic { result, .. })) if result == 1_500_000.0
        ));
        assert!(matches!(calculate("10 chia 0"), Some(Err(CalcError::DivisionByZero))));
        assert!(calculate("how much did I spend").is_none());
    }

    #[test]
    fn test_goal_amount() {
        assert_eq!(goal_amount("tiết kiệm 100 triệu"), Some(100_000_000.0));
        assert_eq!(goal_amount("save 5000"), Some(5_000_000.0));
        assert_eq!(goal_amount("lập kế hoạch tiết kiệm"), None);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_vnd(1_234_567.0), "1.234.567 VND");
        assert_eq!(format_vnd(-50_000.0), "-50.000 VND");
        assert_eq!(format_vnd(0.0), "0 VND");
        assert_eq!(format_number(1234.5), "1.234,5");
        assert_eq!(format_number(999.0), "999");
    }
}
