// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::models::Role;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "jwt";
/// Cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub role: Role,
    pub typ: TokenType,
    /// Unique token ID (used for revocation)
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    /// Owners and admins may touch a record.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.user_id == owner_id || self.role.is_admin()
    }
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match bearer_token(&request) {
        Some(t) => t.to_string(),
        None => match jar.get(ACCESS_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => return Err(AppError::Unauthorized),
        },
    };

    let claims = decode_token(&token, &state.config.jwt_signing_key)?;
    if claims.typ != TokenType::Access {
        return Err(AppError::InvalidToken);
    }

    let user = state
        .db
        .get_user(&claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.active {
        tracing::debug!(user_id = %user.id, "Rejecting token for deactivated account");
        return Err(AppError::Unauthorized);
    }

    if issued_before_password_change(&claims, user.password_changed_at) {
        return Err(AppError::InvalidToken);
    }

    let auth_user = AuthUser {
        user_id: user.id,
        role: user.role,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Token from an `Authorization: Bearer` header. An explicit header wins
/// over the `jwt` cookie.
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// A token minted before the last password change is stale.
pub(crate) fn issued_before_password_change(
    claims: &Claims,
    changed_at: Option<chrono::DateTime<chrono::Utc>>,
) -> bool {
    changed_at.is_some_and(|changed| (claims.iat as i64) < changed.timestamp())
}

/// Decode and validate a token signed with our key.
pub fn decode_token(token: &str, signing_key: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

/// Create a signed token.
pub fn create_jwt(
    user_id: &str,
    role: Role,
    typ: TokenType,
    ttl_secs: i64,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        typ,
        jti: uuid::Uuid::new_v4().to_string(),
        iat: now,
        exp: now + ttl_secs.max(0) as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"unit_test_signing_key_32_bytes!!";

    #[test]
    fn test_create_and_decode() {
        let token = create_jwt("u1", Role::Admin, TokenType::Refresh, 60, KEY).unwrap();
        let claims = decode_token(&token, KEY).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.typ, TokenType::Refresh);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = create_jwt("u1", Role::User, TokenType::Access, 60, KEY).unwrap();
        let err = decode_token(&token, b"another_key_that_is_32_bytes_ok!").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = create_jwt("u1", Role::User, TokenType::Access, 60, KEY).unwrap();
        let b = create_jwt("u1", Role::User, TokenType::Access, 60, KEY).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_password_change_invalidates_older_tokens() {
        let token = create_jwt("u1", Role::User, TokenType::Access, 60, KEY).unwrap();
        let claims = decode_token(&token, KEY).unwrap();

        let later = chrono::Utc::now() + chrono::Duration::minutes(5);
        assert!(issued_before_password_change(&claims, Some(later)));

        let earlier = chrono::Utc::now() - chrono::Duration::minutes(5);
        assert!(!issued_before_password_change(&claims, Some(earlier)));
        assert!(!issued_before_password_change(&claims, None));
    }

    #[test]
    fn test_can_access() {
        let user = AuthUser {
            user_id: "u1".into(),
            role: Role::User,
        };
        assert!(user.can_access("u1"));
        assert!(!user.can_access("u2"));

        let admin = AuthUser {
            user_id: "a1".into(),
            role: Role::Admin,
        };
        assert!(admin.can_access("u2"));
    }
}
