// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! VanLang Budget: personal finance tracking with a built-in assistant
//!
//! This crate provides the backend API for incomes, expenses, loans,
//! investments and budgets, plus VanLangBot, which answers questions about
//! a user's own records.

pub mod background;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use middleware::rate_limit::RateLimits;
use services::{ChatbotService, Mailer, TtlCache};
use std::time::Duration;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    /// `jti` of refresh tokens revoked by logout or rotation
    pub revoked_tokens: TtlCache<String, ()>,
    pub chatbot: ChatbotService,
    pub limits: RateLimits,
    pub mailer: Mailer,
}

impl AppState {
    /// State with mail only logged. See [`AppState::with_mailer`].
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let refresh_ttl = Duration::from_secs(config.refresh_token_ttl_secs.max(0) as u64);
        let limits = RateLimits::new(
            config.api_rate_limit,
            config.chatbot_rate_limit,
            config.admin_rate_limit,
        );
        Self {
            config,
            db,
            revoked_tokens: TtlCache::new(refresh_ttl),
            chatbot: ChatbotService::new(),
            limits,
            mailer: Mailer::Log,
        }
    }

    pub fn with_mailer(mut self, mailer: Mailer) -> Self {
        self.mailer = mailer;
        self
    }

    /// Drop expired entries from every cache. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        self.revoked_tokens.purge_expired() + self.chatbot.purge_expired() + self.limits.purge_expired()
    }
}
