// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod budgets;
pub mod cache;
pub mod categories;
pub mod chatbot;
pub mod credentials;
pub mod finance;
pub mod investments;
pub mod ledger;
pub mod loans;
pub mod mailer;
pub mod notifications;

pub use cache::TtlCache;
pub use chatbot::ChatbotService;
pub use mailer::Mailer;
