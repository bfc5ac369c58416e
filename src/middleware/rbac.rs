// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-based access control extractors.
//!
//! These read the [`AuthUser`] inserted by `require_auth`, so they only work
//! on routes behind that middleware.

use super::auth::AuthUser;
use crate::error::AppError;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;

fn auth_user(parts: &Parts) -> Result<AuthUser, AppError> {
    parts
        .extensions
        .get::<AuthUser>()
        .cloned()
        .ok_or(AppError::Unauthorized)
}

/// Requires the `admin` or `superadmin` role. Rejects with 403 otherwise.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = auth_user(parts)?;
        if !user.role.is_admin() {
            tracing::warn!(user_id = %user.user_id, "Non-admin attempted admin route");
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }
        Ok(RequireAdmin(user))
    }
}
