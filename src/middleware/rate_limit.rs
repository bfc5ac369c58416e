// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-window request limits.
//!
//! Anonymous `/api` traffic is counted per client address. The chatbot and
//! admin limits run behind `require_auth` and count per user.

use super::auth::AuthUser;
use crate::error::AppError;
use crate::services::TtlCache;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const API_WINDOW: Duration = Duration::from_secs(60 * 60);
pub const CHATBOT_WINDOW: Duration = Duration::from_secs(60);
pub const ADMIN_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counts requests per key and refuses them past `max` per window.
pub struct RateLimiter {
    windows: TtlCache<String, Window>,
    window: Duration,
    max: u32,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            windows: TtlCache::new(window),
            window,
            max,
        }
    }

    /// Count one request for `key`. False once the window is used up.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut allowed = true;
        self.windows.update(
            key.to_string(),
            Window {
                started: now,
                count: 0,
            },
            |w| {
                if now.duration_since(w.started) >= self.window {
                    w.started = now;
                    w.count = 0;
                }
                w.count = w.count.saturating_add(1);
                allowed = w.count <= self.max;
            },
        );
        allowed
    }

    pub fn purge_expired(&self) -> usize {
        self.windows.purge_expired()
    }

    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

/// The limiters shared by all requests.
pub struct RateLimits {
    pub api: RateLimiter,
    pub chatbot: RateLimiter,
    pub admin: RateLimiter,
}

impl RateLimits {
    pub fn new(api_max: u32, chatbot_max: u32, admin_max: u32) -> Self {
        Self {
            api: RateLimiter::new(api_max, API_WINDOW),
            chatbot: RateLimiter::new(chatbot_max, CHATBOT_WINDOW),
            admin: RateLimiter::new(admin_max, ADMIN_WINDOW),
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.api.purge_expired() + self.chatbot.purge_expired() + self.admin.purge_expired()
    }
}

/// Client address: the first `X-Forwarded-For` hop when behind a proxy,
/// else the peer address.
fn client_key(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Per-address limit on everything under `/api`.
pub async fn limit_api(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.uri().path().starts_with("/api") {
        let key = client_key(&request);
        if !state.limits.api.check(&key) {
            tracing::warn!(client = %key, "API rate limit exceeded");
            return Err(AppError::TooManyRequests(
                "Too many requests from this address, please try again in an hour".to_string(),
            ));
        }
    }
    Ok(next.run(request).await)
}

fn user_key(request: &Request) -> Result<String, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.user_id.clone())
        .ok_or(AppError::Unauthorized)
}

/// Per-user limit on chatbot routes.
pub async fn limit_chatbot(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = user_key(&request)?;
    if !state.limits.chatbot.check(&user_id) {
        tracing::warn!(user_id = %user_id, "Chatbot rate limit exceeded");
        return Err(AppError::TooManyRequests(
            "Too many chatbot messages, please wait a minute".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

/// Per-user limit on admin routes.
pub async fn limit_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = user_key(&request)?;
    if !state.limits.admin.check(&user_id) {
        tracing::warn!(user_id = %user_id, "Admin rate limit exceeded");
        return Err(AppError::TooManyRequests(
            "Too many admin requests, please try again later".to_string(),
        ));
    }
    Ok(next.run(request).await)
}
