// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, authorization, rate limits, security headers).

pub mod auth;
pub mod rate_limit;
pub mod rbac;
pub mod security;

pub use auth::require_auth;
pub use rbac::RequireAdmin;
