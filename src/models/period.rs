//! Period filters for entry queries
//!
//! All bounds are calendar dates in UTC and inclusive on both ends.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A span of calendar days used to filter entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PeriodFilter {
    /// A single day
    Day(NaiveDate),

    /// A calendar month (e.g., "2025-06")
    Month { year: i32, month: u32 },

    /// A calendar year
    Year(i32),

    /// Custom inclusive date range
    Range { start: NaiveDate, end: NaiveDate },
}

impl PeriodFilter {
    pub fn month(year: i32, month: u32) -> Self {
        Self::Month { year, month }
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        Self::Range { start, end }
    }

    /// The month containing `now`
    pub fn current_month(now: DateTime<Utc>) -> Self {
        Self::Month {
            year: now.year(),
            month: now.month(),
        }
    }

    /// First day of the period; `None` for an impossible month
    pub fn start_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Day(day) => Some(*day),
            Self::Month { year, month } => NaiveDate::from_ymd_opt(*year, *month, 1),
            Self::Year(year) => NaiveDate::from_ymd_opt(*year, 1, 1),
            Self::Range { start, .. } => Some(*start),
        }
    }

    /// Last day of the period (inclusive)
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Day(day) => Some(*day),
            Self::Month { year, month } => {
                let next = if *month == 12 {
                    NaiveDate::from_ymd_opt(*year + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(*year, *month + 1, 1)
                };
                next.map(|d| d - Duration::days(1))
            }
            Self::Year(year) => NaiveDate::from_ymd_opt(*year, 12, 31),
            Self::Range { end, .. } => Some(*end),
        }
    }

    /// Check if a timestamp falls within this period
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        let day = date.date_naive();
        match (self.start_date(), self.end_date()) {
            (Some(start), Some(end)) => day >= start && day <= end,
            _ => false,
        }
    }

    /// Parse "YYYY-MM-DD", "YYYY-MM", "YYYY", "START..END" or "current"
    pub fn parse(s: &str, now: DateTime<Utc>) -> Result<Self, PeriodParseError> {
        let s = s.trim();
        let invalid = || PeriodParseError(s.to_string());

        if s.eq_ignore_ascii_case("current") {
            return Ok(Self::current_month(now));
        }

        if let Some((start, end)) = s.split_once("..") {
            let start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
            let end = NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
            if end < start {
                return Err(invalid());
            }
            return Ok(Self::Range { start, end });
        }

        if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::Day(day));
        }

        let parts: Vec<&str> = s.split('-').collect();
        match parts.as_slice() {
            [year, month] => {
                let year: i32 = year.parse().map_err(|_| invalid())?;
                let month: u32 = month.parse().map_err(|_| invalid())?;
                if !(1..=12).contains(&month) {
                    return Err(invalid());
                }
                Ok(Self::Month { year, month })
            }
            [year] if year.len() == 4 => Ok(Self::Year(year.parse().map_err(|_| invalid())?)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for PeriodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            Self::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            Self::Year(year) => write!(f, "{:04}", year),
            Self::Range { start, end } => write!(f, "{}..{}", start, end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid period: {0} (expected YYYY-MM-DD, YYYY-MM, YYYY, START..END or 'current')")]
pub struct PeriodParseError(pub String);
