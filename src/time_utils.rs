// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse either an RFC3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Half-open `[start, end)` range covering a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()?;
    Some((start, end))
}

/// `(year, month)` of the month before the one containing `now`.
pub fn previous_month(now: DateTime<Utc>) -> (i32, u32) {
    if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    }
}

/// True when `date` falls in the given calendar month.
pub fn in_month(date: DateTime<Utc>, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let a = parse_date("2026-03-05").unwrap();
        assert_eq!(format_utc_rfc3339(a), "2026-03-05T00:00:00Z");

        let b = parse_date("2026-03-05T10:30:00+07:00").unwrap();
        assert_eq!(format_utc_rfc3339(b), "2026-03-05T03:30:00Z");

        assert!(parse_date("05/03/2026").is_none());
    }

    #[test]
    fn test_month_bounds_wraps_year() {
        let (start, end) = month_bounds(2025, 12).unwrap();
        assert_eq!(format_utc_rfc3339(start), "2025-12-01T00:00:00Z");
        assert_eq!(format_utc_rfc3339(end), "2026-01-01T00:00:00Z");
        assert!(month_bounds(2025, 13).is_none());
    }

    #[test]
    fn test_previous_month() {
        let jan = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(previous_month(jan), (2025, 12));
        let jul = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(previous_month(jul), (2026, 6));
    }
}
