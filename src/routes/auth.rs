// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: registration, login, token refresh and password flows.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::config::Config;
use crate::db::collections;
use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_jwt, decode_token, issued_before_password_change, AuthUser, TokenType, ACCESS_COOKIE,
    REFRESH_COOKIE,
};
use crate::models::{Language, NotificationSettings, TransactionKind, User, UserProfile};
use crate::services::{categories, mailer};
use crate::services::credentials::{self, MIN_PASSWORD_LENGTH, RESET_TOKEN_TTL_MINUTES};
use crate::AppState;

/// Routes reachable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/refresh-token", post(refresh_token))
        .route("/api/auth/forgotpassword", post(forgot_password))
        .route("/api/auth/resetpassword/{token}", patch(reset_password))
}

/// Routes for the signed-in user (behind `require_auth`).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/verify-token", get(verify_token))
        .route("/api/auth/me", get(get_me))
        .route("/api/auth/updateme", patch(update_me))
        .route("/api/auth/updatepassword", patch(update_password))
}

// ─── Sessions ────────────────────────────────────────────────

struct TokenPair {
    access: String,
    refresh: String,
}

fn issue_tokens(config: &Config, user: &User) -> Result<TokenPair> {
    let access = create_jwt(
        &user.id,
        user.role,
        TokenType::Access,
        config.access_token_ttl_secs,
        &config.jwt_signing_key,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let refresh = create_jwt(
        &user.id,
        user.role,
        TokenType::Refresh,
        config.refresh_token_ttl_secs,
        &config.jwt_signing_key,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    Ok(TokenPair { access, refresh })
}

fn session_cookie(config: &Config, name: &'static str, value: String, ttl_secs: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl_secs))
        .build()
}

fn with_session(jar: CookieJar, config: &Config, tokens: &TokenPair) -> CookieJar {
    jar.add(session_cookie(
        config,
        ACCESS_COOKIE,
        tokens.access.clone(),
        config.access_token_ttl_secs,
    ))
    .add(session_cookie(
        config,
        REFRESH_COOKIE,
        tokens.refresh.clone(),
        config.refresh_token_ttl_secs,
    ))
}

fn without_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

#[derive(Serialize)]
pub struct UserData {
    pub user: UserProfile,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub status: &'static str,
    pub token: String,
    pub refresh_token: String,
    pub data: UserData,
}

fn session_response(
    state: &AppState,
    jar: CookieJar,
    user: &User,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let tokens = issue_tokens(&state.config, user)?;
    let jar = with_session(jar, &state.config, &tokens);
    Ok((
        jar,
        Json(SessionResponse {
            status: "success",
            token: tokens.access,
            refresh_token: tokens.refresh,
            data: UserData {
                user: UserProfile::from(user),
            },
        }),
    ))
}

/// Mark the refresh token as unusable for the rest of its lifetime.
fn revoke(state: &AppState, token: &str) {
    if let Ok(claims) = decode_token(token, &state.config.jwt_signing_key) {
        if claims.typ == TokenType::Refresh {
            state.revoked_tokens.insert(claims.jti, ());
        }
    }
}

// ─── Registration & Login ────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "is required"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
}

async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>)> {
    req.validate()?;
    let email = req.email.trim().to_lowercase();

    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest(
            "Email address is already registered".to_string(),
        ));
    }

    let now = Utc::now();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        password_hash: credentials::hash_password(&req.password)?,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        phone_number: req.phone_number,
        role: Default::default(),
        is_email_verified: false,
        active: true,
        language: Language::default(),
        settings: NotificationSettings::default(),
        password_changed_at: None,
        password_reset_digest: None,
        password_reset_expires: None,
        created_at: now,
        updated_at: now,
    };
    state.db.upsert_user(&user).await?;
    tracing::info!(user_id = %user.id, "User registered");

    for kind in [TransactionKind::Expense, TransactionKind::Income] {
        if let Err(e) = categories::seed_defaults(&state.db, kind, &user.id, now).await {
            tracing::warn!(error = %e, user_id = %user.id, kind = kind.as_str(), "Seeding default categories failed");
        }
    }

    let (jar, body) = session_response(&state, jar, &user)?;
    Ok((StatusCode::CREATED, jar, body))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let Some(user) = state.db.find_user_by_email(&req.email).await? else {
        return Err(AppError::Unauthorized);
    };
    if !credentials::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return Err(AppError::Unauthorized);
    }
    if !user.active {
        tracing::info!(user_id = %user.id, "Login attempt on deactivated account");
        return Err(AppError::Unauthorized);
    }

    tracing::info!(user_id = %user.id, "User logged in");
    session_response(&state, jar, &user)
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> (CookieJar, Json<MessageResponse>) {
    let token = body
        .and_then(|Json(b)| b.refresh_token)
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()));
    if let Some(token) = token {
        revoke(&state, &token);
    }
    (
        without_session(jar),
        Json(MessageResponse {
            status: "success",
            message: "Logged out".to_string(),
        }),
    )
}

async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let token = body
        .and_then(|Json(b)| b.refresh_token)
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AppError::Unauthorized)?;

    let claims = decode_token(&token, &state.config.jwt_signing_key)?;
    if claims.typ != TokenType::Refresh {
        return Err(AppError::InvalidToken);
    }
    if state.revoked_tokens.contains(&claims.jti) {
        tracing::warn!(user_id = %claims.sub, "Revoked refresh token presented");
        return Err(AppError::InvalidToken);
    }

    let user = state
        .db
        .get_user(&claims.sub)
        .await?
        .ok_or(AppError::InvalidToken)?;
    if !user.active || issued_before_password_change(&claims, user.password_changed_at) {
        return Err(AppError::InvalidToken);
    }

    state.revoked_tokens.insert(claims.jti, ());
    session_response(&state, jar, &user)
}

// ─── Current User ────────────────────────────────────────────

async fn load_user(state: &AppState, user_id: &str) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: UserProfile,
}

async fn verify_token(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<VerifyResponse>> {
    let user = load_user(&state, &auth.user_id).await?;
    Ok(Json(VerifyResponse {
        valid: true,
        user: UserProfile::from(&user),
    }))
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<super::response::Single<UserData>>> {
    let user = load_user(&state, &auth.user_id).await?;
    Ok(super::response::ok(UserData {
        user: UserProfile::from(&user),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    pub language: Option<Language>,
    pub settings: Option<NotificationSettings>,
    /// Present only to reject it
    #[serde(default)]
    pub password: Option<serde_json::Value>,
    #[serde(default)]
    pub new_password: Option<serde_json::Value>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpdateMeRequest>,
) -> Result<Json<super::response::Single<UserData>>> {
    if req.password.is_some() || req.new_password.is_some() {
        return Err(AppError::BadRequest(
            "This route is not for password updates. Please use /updatepassword".to_string(),
        ));
    }
    req.validate()?;

    let mut user = load_user(&state, &auth.user_id).await?;
    if let Some(first_name) = req.first_name {
        user.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = req.last_name {
        user.last_name = last_name.trim().to_string();
    }
    if let Some(phone_number) = req.phone_number {
        user.phone_number = Some(phone_number).filter(|p| !p.trim().is_empty());
    }
    if let Some(language) = req.language {
        user.language = language;
    }
    if let Some(settings) = req.settings {
        user.settings = settings;
    }
    user.updated_at = Utc::now();
    state.db.upsert_user(&user).await?;

    Ok(super::response::ok(UserData {
        user: UserProfile::from(&user),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub new_password: String,
}

/// Store a new password and invalidate sessions issued before now.
fn set_password(user: &mut User, password: &str) -> Result<()> {
    credentials::validate_password_strength(password)?;
    let now = Utc::now();
    user.password_hash = credentials::hash_password(password)?;
    // One second back so tokens minted right after this still validate.
    user.password_changed_at = Some(now - Duration::seconds(1));
    user.password_reset_digest = None;
    user.password_reset_expires = None;
    user.updated_at = now;
    Ok(())
}

async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    jar: CookieJar,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()?;
    let mut user = load_user(&state, &auth.user_id).await?;
    if !credentials::verify_password(&req.current_password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    set_password(&mut user, &req.new_password)?;
    state.db.upsert_user(&user).await?;
    tracing::info!(user_id = %user.id, "Password changed");

    session_response(&state, jar, &user)
}

// ─── Password Reset ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    if let Some(mut user) = state.db.find_user_by_email(&req.email).await? {
        let token = credentials::generate_reset_token();
        user.password_reset_digest = Some(credentials::reset_token_digest(
            &token,
            &state.config.jwt_signing_key,
        )?);
        user.password_reset_expires = Some(Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES));
        state.db.upsert_user(&user).await?;

        let message = mailer::password_reset_email(
            &user.email,
            &user.first_name,
            &state.config.frontend_url,
            &token,
            RESET_TOKEN_TTL_MINUTES,
            user.language,
        );
        if let Err(e) = state.mailer.send(message).await {
            // Nobody received this token.
            user.password_reset_digest = None;
            user.password_reset_expires = None;
            state.db.upsert_user(&user).await?;
            return Err(e.into());
        }
        tracing::info!(user_id = %user.id, "Password reset email sent");
    }

    Ok(Json(MessageResponse {
        status: "success",
        message: "If that email is registered, a reset link has been sent".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    jar: CookieJar,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let invalid = || AppError::BadRequest("Token is invalid or has expired".to_string());
    let key = &state.config.jwt_signing_key;

    let digest = credentials::reset_token_digest(&token, key)?;
    let mut user: User = state
        .db
        .find_one_by_field(collections::USERS, "password_reset_digest", &digest)
        .await?
        .ok_or_else(invalid)?;

    let stored = user.password_reset_digest.as_deref().unwrap_or_default();
    let fresh = user
        .password_reset_expires
        .is_some_and(|expires| expires > Utc::now());
    if !fresh || !credentials::reset_token_matches(stored, &token, key) {
        return Err(invalid());
    }
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    set_password(&mut user, &req.password)?;
    state.db.upsert_user(&user).await?;
    tracing::info!(user_id = %user.id, "Password reset");

    session_response(&state, jar, &user)
}
