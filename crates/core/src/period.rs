// crates/core/src/period.rs
//! Inclusive date windows used to select sessions for aggregation.
//!
//! A [`Period`] is a pair of calendar dates (UTC). Membership is decided at
//! one-second resolution: a session belongs to the window when
//! `start 00:00:00 <= played_at < (end + 1 day) 00:00:00`, which makes both
//! boundary dates fully inclusive.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// Window length used when the caller omits `period_start`.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Wire format for period boundaries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct Period {
    #[serde(rename = "period_start")]
    #[ts(type = "string")]
    pub start: NaiveDate,
    #[serde(rename = "period_end")]
    #[ts(type = "string")]
    pub end: NaiveDate,
}

impl Period {
    /// Build a window from explicit bounds, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedPeriod {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Apply the defaults: `end` falls back to `today`, `start` to
    /// [`DEFAULT_WINDOW_DAYS`] before `end`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let end = end.unwrap_or(today);
        let start = match start {
            Some(start) => start,
            None => end
                .checked_sub_signed(TimeDelta::days(DEFAULT_WINDOW_DAYS))
                .ok_or_else(|| {
                    ValidationError::out_of_range(
                        "period_end",
                        format!("no {DEFAULT_WINDOW_DAYS}-day window ends on this date"),
                    )
                })?,
        };
        Self::new(start, end)
    }

    /// Same as [`Period::resolve`] but parses raw `YYYY-MM-DD` strings.
    /// Empty strings count as omitted.
    pub fn resolve_str(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let start = parse_optional_date("period_start", start)?;
        let end = parse_optional_date("period_end", end)?;
        Self::resolve(start, end, today)
    }

    /// First instant inside the window.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// First instant after the window.
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.end
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN).and_utc())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_instant() && at < self.end_exclusive()
    }

    /// `(start, end_exclusive)` as Unix seconds, the form the session table is
    /// indexed by.
    pub fn unix_bounds(&self) -> (i64, i64) {
        (
            self.start_instant().timestamp(),
            self.end_exclusive().timestamp(),
        )
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

/// Parse a `YYYY-MM-DD` date, reporting which field was malformed.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        }
    })
}

fn parse_optional_date(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_date(field, v).map(Some),
    }
}
