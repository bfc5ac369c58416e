// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! VanLangBot routes.

use super::response::{self, Single};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::middleware::rate_limit::limit_chatbot;
use crate::middleware::RequireAdmin;
use crate::models::Language;
use crate::services::chatbot::analytics::AnalyticsReport;
use crate::services::chatbot::{ChatMetadata, Exchange};
use crate::AppState;
use axum::{
    extract::State,
    middleware,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/chatbot/health", get(health))
}

/// Mount behind `require_auth`; messages are limited per user.
pub fn protected_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let messages = Router::new()
        .route("/api/chatbot/enhanced", post(chat))
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_chatbot));
    Router::new()
        .merge(messages)
        .route("/api/chatbot/history", get(history))
        .route("/api/chatbot/analytics", get(analytics))
        .route("/api/chatbot/cache", delete(clear_cache))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub language: Option<Language>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub metadata: ChatMetadata,
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let reply = state
        .chatbot
        .respond(&state.db, &auth.user_id, &req.message, req.language, Utc::now())
        .await?;
    Ok(Json(ChatResponse {
        success: true,
        response: reply.response,
        metadata: reply.metadata,
    }))
}

async fn history(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<Single<Vec<Exchange>>> {
    response::ok(state.chatbot.history(&auth.user_id))
}

async fn analytics(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<Single<AnalyticsReport>> {
    response::ok(state.chatbot.analytics())
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub success: bool,
    pub message: &'static str,
}

async fn clear_cache(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<ClearedResponse> {
    state.chatbot.clear_user(&auth.user_id);
    tracing::debug!(user_id = %auth.user_id, "Chatbot cache cleared");
    Json(ClearedResponse {
        success: true,
        message: "Chatbot cache cleared",
    })
}

#[derive(Debug, Serialize)]
pub struct ChatbotHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub languages: [Language; 2],
    pub timestamp: String,
}

async fn health() -> Json<ChatbotHealth> {
    Json(ChatbotHealth {
        status: "ok",
        service: "VanLangBot",
        languages: [Language::Vi, Language::En],
        timestamp: crate::time_utils::format_utc_rfc3339(Utc::now()),
    })
}
