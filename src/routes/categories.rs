// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Income and expense category routes.
//!
//! Like the transaction routes, both kinds share handlers and the kind is
//! attached to each router as an extension.

use super::response::{self, ensure_access, Single};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{category_collection, Category, TransactionKind};
use crate::services::categories::{self, FALLBACK_CATEGORY};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

const DEFAULT_ICON: &str = "tag";
const DEFAULT_COLOR: &str = "#6c757d";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(kind_routes(TransactionKind::Income))
        .merge(kind_routes(TransactionKind::Expense))
}

fn kind_routes(kind: TransactionKind) -> Router<Arc<AppState>> {
    let base = format!("/api/{}-categories", kind.as_str());
    Router::new()
        .route(&base, get(list_categories).post(create_category))
        .route(&format!("{base}/grouped"), get(grouped_categories))
        .route(&format!("{base}/reset-defaults"), post(reset_defaults))
        .route(
            &format!("{base}/{{id}}"),
            get(get_category).put(update_category).delete(delete_category),
        )
        .layer(Extension(kind))
}

#[derive(Debug, Serialize)]
pub struct CategoryList {
    pub status: &'static str,
    pub results: usize,
    pub data: Vec<Category>,
}

fn list_body(data: Vec<Category>) -> Json<CategoryList> {
    Json(CategoryList {
        status: "success",
        results: data.len(),
        data,
    })
}

async fn load_owned(
    state: &AppState,
    kind: TransactionKind,
    auth: &AuthUser,
    id: &str,
) -> Result<Category> {
    let category: Category = state
        .db
        .get(category_collection(kind), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No {} category found with id {}", kind.as_str(), id)))?;
    ensure_access(auth, &category.user_id)?;
    Ok(category)
}

async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<CategoryList>> {
    Ok(list_body(
        categories::load(&state.db, kind, &auth.user_id).await?,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupedQuery {
    pub group: Option<String>,
}

async fn grouped_categories(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<GroupedQuery>,
) -> Result<Json<Single<BTreeMap<String, Vec<Category>>>>> {
    let mut all = categories::load(&state.db, kind, &auth.user_id).await?;
    if let Some(group) = query.group.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
        all.retain(|c| c.group.as_deref() == Some(group));
    }
    Ok(response::ok(categories::grouped(all)))
}

async fn get_category(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Single<Category>>> {
    Ok(response::ok(load_owned(&state, kind, &auth, &id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 50))]
    pub icon: Option<String>,
    #[validate(length(max = 20))]
    pub color: Option<String>,
    #[validate(length(max = 50))]
    pub group: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Single<Category>>)> {
    req.validate()?;
    let name = non_empty(req.name)
        .ok_or_else(|| AppError::BadRequest("name: is required".to_string()))?;
    let existing = categories::load(&state.db, kind, &auth.user_id).await?;
    categories::ensure_unique_name(&existing, &name, None)?;

    let now = Utc::now();
    let category = Category {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: auth.user_id.clone(),
        name,
        icon: non_empty(req.icon).unwrap_or_else(|| DEFAULT_ICON.to_string()),
        color: non_empty(req.color).unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        is_default: false,
        group: non_empty(req.group),
        created_at: now,
        updated_at: now,
    };
    state
        .db
        .set(category_collection(kind), &category.id, &category)
        .await?;
    tracing::info!(user_id = %auth.user_id, category_id = %category.id, kind = kind.as_str(), "Category created");
    Ok(response::created(category))
}

async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Single<Category>>> {
    req.validate()?;
    let mut category = load_owned(&state, kind, &auth, &id).await?;
    if category.is_default {
        return Err(AppError::BadRequest(
            "Default categories cannot be changed".to_string(),
        ));
    }

    if let Some(name) = non_empty(req.name) {
        if name != category.name {
            let existing = categories::load(&state.db, kind, &category.user_id).await?;
            categories::ensure_unique_name(&existing, &name, Some(&category.id))?;
            let moved =
                categories::reassign(&state.db, kind, &category.user_id, &category.name, &name)
                    .await?;
            tracing::debug!(category_id = %category.id, moved, "Records follow renamed category");
            category.name = name;
        }
    }
    if let Some(icon) = non_empty(req.icon) {
        category.icon = icon;
    }
    if let Some(color) = non_empty(req.color) {
        category.color = color;
    }
    if let Some(group) = non_empty(req.group) {
        category.group = Some(group);
    }

    category.updated_at = Utc::now();
    state
        .db
        .set(category_collection(kind), &category.id, &category)
        .await?;
    state.chatbot.invalidate_user(&category.user_id);
    Ok(response::ok(category))
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let category = load_owned(&state, kind, &auth, &id).await?;
    if category.is_default {
        return Err(AppError::BadRequest(
            "Default categories cannot be deleted".to_string(),
        ));
    }

    let moved = categories::reassign(
        &state.db,
        kind,
        &category.user_id,
        &category.name,
        FALLBACK_CATEGORY,
    )
    .await?;
    state
        .db
        .delete(category_collection(kind), &category.id)
        .await?;
    state.chatbot.invalidate_user(&category.user_id);
    tracing::info!(user_id = %auth.user_id, category_id = %id, moved, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn reset_defaults(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TransactionKind>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<CategoryList>> {
    let all = categories::reset_defaults(&state.db, kind, &auth.user_id, Utc::now()).await?;
    tracing::info!(user_id = %auth.user_id, kind = kind.as_str(), "Default categories reset");
    Ok(list_body(all))
}
