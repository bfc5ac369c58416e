// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response envelopes and pagination shared by the API routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 100;

/// `{status:"success", data}`
#[derive(Debug, Serialize)]
pub struct Single<T> {
    pub status: &'static str,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<Single<T>> {
    Json(Single {
        status: "success",
        data,
    })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Single<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// `{status:"success", results, total, page, pages, data}`
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub status: &'static str,
    /// Items on this page
    pub results: usize,
    /// Items across all pages
    pub total: usize,
    pub page: u32,
    pub pages: u32,
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
}

impl<T> Page<T> {
    pub fn with_total_amount(mut self, amount: f64) -> Self {
        self.total_amount = Some(amount);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn page(self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Slice an already-sorted list into the requested page.
pub fn paginate<T>(items: Vec<T>, params: PageParams) -> Page<T> {
    let (page, limit) = (params.page(), params.limit());
    let total = items.len();
    let pages = total.div_ceil(limit as usize) as u32;
    let data: Vec<T> = items
        .into_iter()
        .skip((page as usize - 1) * limit as usize)
        .take(limit as usize)
        .collect();
    Page {
        status: "success",
        results: data.len(),
        total,
        page,
        pages,
        data,
        total_amount: None,
    }
}

/// Owners and admins pass; anyone else gets 403.
pub fn ensure_access(auth: &AuthUser, owner_id: &str) -> Result<()> {
    if auth.can_access(owner_id) {
        Ok(())
    } else {
        tracing::warn!(user_id = %auth.user_id, owner_id, "Access to another user's record denied");
        Err(AppError::Forbidden(
            "You do not have permission to access this record".to_string(),
        ))
    }
}

/// Validated month (1-12) and year (2000 or later).
pub fn month_year(month: Option<u32>, year: Option<i32>) -> Result<(u32, i32)> {
    let (Some(month), Some(year)) = (month, year) else {
        return Err(AppError::BadRequest(
            "Both month and year are required".to_string(),
        ));
    };
    if !(1..=12).contains(&month) {
        return Err(AppError::BadRequest(
            "Month must be between 1 and 12".to_string(),
        ));
    }
    if year < 2000 {
        return Err(AppError::BadRequest("Year must be 2000 or later".to_string()));
    }
    Ok((month, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=120).collect();
        let page = paginate(items.clone(), PageParams::default());
        assert_eq!(page.results, 50);
        assert_eq!(page.total, 120);
        assert_eq!(page.pages, 3);
        assert_eq!(page.data[0], 1);

        let last = paginate(items.clone(), PageParams { page: Some(3), limit: None });
        assert_eq!(last.results, 20);
        assert_eq!(last.data[0], 101);

        let capped = paginate(items, PageParams { page: None, limit: Some(500) });
        assert_eq!(capped.results, 100);
    }

    #[test]
    fn test_paginate_empty_and_past_end() {
        let page = paginate(Vec::<u32>::new(), PageParams::default());
        assert_eq!(page.pages, 0);
        assert_eq!(page.results, 0);

        let past = paginate(vec![1, 2, 3], PageParams { page: Some(9), limit: Some(2) });
        assert!(past.data.is_empty());
        assert_eq!(past.pages, 2);
    }

    #[test]
    fn test_month_year() {
        assert_eq!(month_year(Some(3), Some(2026)).unwrap(), (3, 2026));
        assert!(month_year(None, Some(2026)).is_err());
        assert!(month_year(Some(13), Some(2026)).is_err());
        assert!(month_year(Some(1), Some(1999)).is_err());
    }
}
