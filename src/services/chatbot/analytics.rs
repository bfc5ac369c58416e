// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-wide chatbot counters.

use super::nlp::Intent;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct ChatAnalytics {
    total_requests: AtomicU64,
    successful_responses: AtomicU64,
    blocked_requests: AtomicU64,
    total_response_ms: AtomicU64,
    intents: DashMap<&'static str, u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyticsReport {
    pub total_requests: u64,
    pub successful_responses: u64,
    pub blocked_requests: u64,
    pub average_response_time_ms: f64,
    pub intent_distribution: BTreeMap<String, u64>,
    /// Percent of requests answered
    pub success_rate: f64,
    /// Percent of requests refused as off-topic
    pub block_rate: f64,
}

fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 10_000.0).round() / 100.0
    }
}

impl ChatAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one handled message.
    pub fn record(&self, intent: Intent, success: bool, elapsed_ms: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
        if success {
            self.successful_responses.fetch_add(1, Ordering::Relaxed);
        }
        if intent == Intent::BlockedTopic {
            self.blocked_requests.fetch_add(1, Ordering::Relaxed);
        }
        *self.intents.entry(intent.as_str()).or_insert(0) += 1;
    }

    pub fn report(&self) -> AnalyticsReport {
        let total = self.total_requests.load(Ordering::Relaxed);
        let successful = self.successful_responses.load(Ordering::Relaxed);
        let blocked = self.blocked_requests.load(Ordering::Relaxed);
        let total_ms = self.total_response_ms.load(Ordering::Relaxed);

        AnalyticsReport {
            total_requests: total,
            successful_responses: successful,
            blocked_requests: blocked,
            average_response_time_ms: if total == 0 {
                0.0
            } else {
                (total_ms as f64 / total as f64 * 100.0).round() / 100.0
            },
            intent_distribution: self
                .intents
                .iter()
                .map(|e| (e.key().to_string(), *e.value()))
                .collect(),
            success_rate: rate(successful, total),
            block_rate: rate(blocked, total),
        }
    }
}
