// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for Dailymile timestamps.
//!
//! Dailymile exchanges every time as UTC in `%Y-%m-%dT%H:%M:%SZ`.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Wire format for `at` and `completed_at`.
pub const DAILYMILE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse an entry `at` value as UTC.
pub fn parse_dailymile_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(raw, DAILYMILE_TIME_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Render any timestamp in UTC with a `Z` suffix and no fractional seconds.
pub fn format_dailymile_time<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    date.with_timezone(&Utc)
        .format(DAILYMILE_TIME_FORMAT)
        .to_string()
}
