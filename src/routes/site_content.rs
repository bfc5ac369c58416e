// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Site content routes. Reading is public; editing needs an admin.

use super::response::{self, Single};
use crate::db::collections;
use crate::error::{AppError, Result};
use crate::middleware::{require_auth, RequireAdmin};
use crate::models::site_content::homepage_sections;
use crate::models::{ContentStatus, SiteContent, SiteContentType};
use crate::AppState;
use axum::{
    extract::{Path, State},
    middleware,
    routing::put,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// Reads are public. Writes share the path, so the auth layer is attached
/// to the `PUT` handler alone. `footer` is one of the types.
pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/site-content/{type}",
        put(update_content)
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .get(get_content),
    )
}

fn parse_type(raw: &str) -> Result<SiteContentType> {
    SiteContentType::parse(raw)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown content type: {raw}")))
}

async fn published(state: &AppState, content_type: SiteContentType) -> Result<SiteContent> {
    let not_found = || AppError::NotFound(format!("No {} content found", content_type.as_str()));
    let content: SiteContent = state
        .db
        .get(collections::SITE_CONTENT, content_type.as_str())
        .await?
        .ok_or_else(not_found)?;
    if content.status != ContentStatus::Published {
        return Err(not_found());
    }
    Ok(content)
}

async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(raw_type): Path<String>,
) -> Result<Json<Single<SiteContent>>> {
    let content_type = parse_type(&raw_type)?;
    Ok(response::ok(published(&state, content_type).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateContentRequest {
    pub content: serde_json::Value,
    #[serde(default)]
    pub status: Option<ContentStatus>,
}

/// Build the next version of a content document.
fn next_version(
    content_type: SiteContentType,
    previous: Option<SiteContent>,
    req: UpdateContentRequest,
    editor: &str,
) -> Result<SiteContent> {
    if !req.content.is_object() {
        return Err(AppError::BadRequest(
            "Content must be a JSON object".to_string(),
        ));
    }
    let sections = if content_type == SiteContentType::Homepage {
        let sections = homepage_sections(&req.content);
        if sections.is_empty() {
            return Err(AppError::BadRequest(
                "Homepage content must contain at least one section".to_string(),
            ));
        }
        sections
    } else {
        Vec::new()
    };

    let (version, status) = match previous {
        Some(prev) => (prev.version + 1, req.status.unwrap_or(prev.status)),
        None => (1, req.status.unwrap_or_default()),
    };
    Ok(SiteContent {
        content_type,
        content: req.content,
        sections,
        status,
        version,
        updated_by: Some(editor.to_string()),
        updated_at: Utc::now(),
    })
}

async fn update_content(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    Path(raw_type): Path<String>,
    Json(req): Json<UpdateContentRequest>,
) -> Result<Json<Single<SiteContent>>> {
    let content_type = parse_type(&raw_type)?;
    let previous: Option<SiteContent> = state
        .db
        .get(collections::SITE_CONTENT, content_type.as_str())
        .await?;

    let content = next_version(content_type, previous, req, &admin.user_id)?;
    state
        .db
        .set(collections::SITE_CONTENT, content_type.as_str(), &content)
        .await?;
    tracing::info!(
        admin_id = %admin.user_id,
        content_type = content_type.as_str(),
        version = content.version,
        "Site content updated"
    );
    Ok(response::ok(content))
}
