// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Periodic jobs started alongside the server.
//!
//! Each job holds a weak reference to the state and stops once the state
//! is dropped.

use crate::services::investments;
use crate::AppState;
use chrono::Utc;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// How often expired cache entries are swept.
pub const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// How often savings interest is checked.
pub const SAVINGS_INTEREST_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

fn ticker(every: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Drop expired entries from every in-process cache.
pub fn spawn_cache_sweeper(state: &Arc<AppState>, every: Duration) -> JoinHandle<()> {
    let state: Weak<AppState> = Arc::downgrade(state);
    tokio::spawn(async move {
        let mut interval = ticker(every);
        loop {
            interval.tick().await;
            let Some(state) = state.upgrade() else {
                break;
            };
            let removed = state.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "Expired cache entries purged");
            }
        }
    })
}

/// Post interest on savings accounts.
pub fn spawn_savings_interest(state: &Arc<AppState>, every: Duration) -> JoinHandle<()> {
    let state: Weak<AppState> = Arc::downgrade(state);
    tokio::spawn(async move {
        let mut interval = ticker(every);
        loop {
            interval.tick().await;
            let Some(state) = state.upgrade() else {
                break;
            };
            match investments::accrue_all(&state.db, Utc::now()).await {
                Ok(owners) => {
                    for user_id in &owners {
                        state.chatbot.invalidate_user(user_id);
                    }
                    tracing::info!(owners = owners.len(), "Savings interest run finished");
                }
                Err(e) => tracing::error!(error = %e, "Savings interest run failed"),
            }
        }
    })
}
