// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! VanLangBot: a rule-based assistant that answers questions from the
//! user's own financial records.
//!
//! A message is classified by [`nlp::analyze`], then either answered
//! directly (greeting, refusal, calculation) or from a cached
//! [`FinancialSnapshot`] of the user's data.

pub mod analytics;
pub mod calculator;
pub mod filter;
pub mod nlp;
pub mod responses;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::Language;
use crate::services::cache::TtlCache;
use crate::services::finance::{self, FinancialSnapshot};
use analytics::{AnalyticsReport, ChatAnalytics};
use calculator::{CalcError, Calculation};
use chrono::{DateTime, Utc};
use nlp::{Intent, IntentAnalysis};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Replies below this confidence are treated as not understood.
pub const MIN_CONFIDENCE: f64 = 0.3;

const SNAPSHOT_TTL: Duration = Duration::from_secs(30 * 60);
const INTENT_TTL: Duration = Duration::from_secs(2 * 60 * 60);
const HISTORY_TTL: Duration = Duration::from_secs(60 * 60);
const HISTORY_LEN: usize = 5;

const FAREWELLS: &[&str] = &["tam biet", "bye", "goodbye", "see you"];

/// One question and its answer.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub message: String,
    pub response: String,
    pub intent: Intent,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMetadata {
    pub intent: Intent,
    pub confidence: f64,
    pub language: Language,
    pub calculation: Option<Calculation>,
    pub response_time_ms: u64,
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub metadata: ChatMetadata,
}

/// Text of a reply plus what went into it.
struct Answer {
    text: String,
    calculation: Option<Calculation>,
    understood: bool,
    snapshot_cached: bool,
}

impl Answer {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calculation: None,
            understood: true,
            snapshot_cached: false,
        }
    }
}

pub struct ChatbotService {
    snapshots: TtlCache<String, Arc<FinancialSnapshot>>,
    /// Keyed by `(user_id, normalized message, detected language)`.
    /// Normalizing strips the diacritics the language is detected from.
    intents: TtlCache<(String, String, Language), IntentAnalysis>,
    history: TtlCache<String, Vec<Exchange>>,
    analytics: ChatAnalytics,
}

impl Default for ChatbotService {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatbotService {
    pub fn new() -> Self {
        Self {
            snapshots: TtlCache::new(SNAPSHOT_TTL),
            intents: TtlCache::new(INTENT_TTL),
            history: TtlCache::new(HISTORY_TTL),
            analytics: ChatAnalytics::new(),
        }
    }

    /// Reject empty and overlong messages.
    pub fn validate_message(message: &str, language: Option<Language>) -> Result<&str, AppError> {
        let trimmed = message.trim();
        let lang = language.unwrap_or_else(|| nlp::detect_language(trimmed));
        if trimmed.is_empty() {
            return Err(AppError::BadRequest(responses::invalid_message(lang).to_string()));
        }
        if trimmed.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::BadRequest(responses::message_too_long(lang).to_string()));
        }
        Ok(trimmed)
    }

    fn analyze_cached(&self, user_id: &str, message: &str) -> (IntentAnalysis, bool) {
        let key = (
            user_id.to_string(),
            nlp::normalize(message),
            nlp::detect_language(message),
        );
        if let Some(analysis) = self.intents.get(&key) {
            return (analysis, true);
        }
        let analysis = nlp::analyze(message);
        self.intents.insert(key, analysis.clone());
        (analysis, false)
    }

    /// The user's snapshot, rebuilt when missing or stale.
    pub async fn snapshot(
        &self,
        db: &FirestoreDb,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(Arc<FinancialSnapshot>, bool), AppError> {
        if let Some(snapshot) = self.snapshots.get(&user_id.to_string()) {
            return Ok((snapshot, true));
        }
        let snapshot = Arc::new(finance::build_snapshot(db, user_id, now).await?);
        self.snapshots.insert(user_id.to_string(), Arc::clone(&snapshot));
        tracing::debug!(user_id = %user_id, "Financial snapshot rebuilt");
        Ok((snapshot, false))
    }

    /// Drop the cached snapshot after the user's records change.
    pub fn invalidate_user(&self, user_id: &str) {
        self.snapshots.remove(&user_id.to_string());
    }

    /// Forget everything cached for the user.
    pub fn clear_user(&self, user_id: &str) {
        self.invalidate_user(user_id);
        self.history.remove(&user_id.to_string());
        self.intents.remove_where(|(owner, _, _)| owner == user_id);
    }

    /// Drop expired snapshots, intents and histories. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        self.snapshots.purge_expired() + self.intents.purge_expired() + self.history.purge_expired()
    }

    /// Most recent exchanges, oldest first.
    pub fn history(&self, user_id: &str) -> Vec<Exchange> {
        self.history.get(&user_id.to_string()).unwrap_or_default()
    }

    pub fn analytics(&self) -> AnalyticsReport {
        self.analytics.report()
    }

    /// Answer one message.
    pub async fn respond(
        &self,
        db: &FirestoreDb,
        user_id: &str,
        message: &str,
        language: Option<Language>,
        now: DateTime<Utc>,
    ) -> Result<ChatReply, AppError> {
        let started = Instant::now();
        let message = Self::validate_message(message, language)?;
        let (analysis, intent_cached) = self.analyze_cached(user_id, message);
        let lang = language.unwrap_or(analysis.language);

        tracing::debug!(
            user_id = %user_id,
            intent = analysis.intent.as_str(),
            confidence = analysis.confidence,
            cached = intent_cached,
            "Chatbot message classified"
        );

        let answer = self.dispatch(db, user_id, message, &analysis, lang, now).await?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.analytics
            .record(analysis.intent, answer.understood, elapsed_ms);

        let exchange = Exchange {
            message: message.to_string(),
            response: answer.text.clone(),
            intent: analysis.intent,
            at: now,
        };
        self.history.update(user_id.to_string(), Vec::new(), |h| {
            h.push(exchange);
            if h.len() > HISTORY_LEN {
                let excess = h.len() - HISTORY_LEN;
                h.drain(..excess);
            }
        });

        Ok(ChatReply {
            response: answer.text,
            metadata: ChatMetadata {
                intent: analysis.intent,
                confidence: analysis.confidence,
                language: lang,
                calculation: answer.calculation,
                response_time_ms: elapsed_ms,
                cached: intent_cached || answer.snapshot_cached,
            },
        })
    }

    async fn dispatch(
        &self,
        db: &FirestoreDb,
        user_id: &str,
        message: &str,
        analysis: &IntentAnalysis,
        lang: Language,
        now: DateTime<Utc>,
    ) -> Result<Answer, AppError> {
        match analysis.intent {
            Intent::BlockedTopic => return Ok(Answer::text(responses::blocked(lang))),
            Intent::Greeting => return Ok(Answer::text(responses::greeting(lang))),
            Intent::AboutBot => return Ok(Answer::text(responses::about(lang))),
            _ => {}
        }

        let normalized = nlp::normalize(message);
        if analysis.score <= 0.0 && FAREWELLS.iter().any(|w| nlp::contains_word(&normalized, w)) {
            return Ok(Answer::text(responses::farewell(lang)));
        }

        if analysis.intent == Intent::Unknown || analysis.confidence < MIN_CONFIDENCE {
            return Ok(Answer {
                understood: false,
                ..Answer::text(responses::not_understood(lang))
            });
        }

        let lower = message.to_lowercase();
        if let Some(query) = filter::parse(&lower, analysis.time_period) {
            let result = filter::run(db, user_id, query, now).await?;
            return Ok(Answer::text(filter::render(&result, lang)));
        }

        if analysis.intent == Intent::GeneralCalculation {
            return Ok(match calculator::calculate(&lower) {
                Some(Ok(calculation)) => Answer {
                    text: calculation.render(lang),
                    calculation: Some(calculation),
                    ..Answer::text("")
                },
                Some(Err(CalcError::DivisionByZero)) => {
                    Answer::text(responses::division_by_zero(lang))
                }
                Some(Err(_)) | None => Answer::text(responses::calculation_help(lang)),
            });
        }

        let (snapshot, snapshot_cached) = self.snapshot(db, user_id, now).await?;
        let s = snapshot.as_ref();
        let text = match analysis.intent {
            Intent::CalculateIncome => responses::income_analysis(s, lang),
            Intent::CalculateExpense => responses::expense_analysis(s, lang),
            Intent::CalculateInvestment => responses::investment_analysis(s, lang),
            Intent::CalculateBudget => responses::budget_analysis(s, lang),
            Intent::LoanQuery => responses::loan_summary(s, lang),
            Intent::TrendAnalysis => responses::trend_report(s, lang),
            Intent::FinancialPlanning => responses::planning(s, message, lang),
            _ => responses::overview(s, lang),
        };
        Ok(Answer {
            snapshot_cached,
            ..Answer::text(text)
        })
    }
}
