//! Timestamp utilities and week window arithmetic
//!
//! A week window is the half-open interval `[Monday 00:00, next Monday 00:00)`
//! measured in a fixed UTC offset. Windows are stored as Unix seconds.

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, Utc};
use serde::Serialize;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Build the offset that defines "local" Monday midnight
pub fn utc_offset(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| Error::Config(format!("invalid UTC offset: {} minutes", minutes)))
}

/// Convert stored Unix seconds back to a UTC instant
pub fn from_unix_seconds(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(Error::InvalidTimestamp(secs))
}

/// One Monday-to-Monday period, half-open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekWindow {
    /// The window containing `instant`
    pub fn containing(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        let start = week_start(instant, offset);
        Self {
            start,
            end: start + Duration::weeks(1),
        }
    }

    /// The upcoming window, i.e. the one starting at the first Monday
    /// midnight strictly after `instant`
    pub fn next_after(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::containing(instant, offset).following()
    }

    /// The last window that has fully elapsed at `instant`
    pub fn previous_before(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::containing(instant, offset).preceding()
    }

    pub fn following(&self) -> Self {
        Self {
            start: self.end,
            end: self.end + Duration::weeks(1),
        }
    }

    pub fn preceding(&self) -> Self {
        Self {
            start: self.start - Duration::weeks(1),
            end: self.start,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Rebuild a window from stored Unix seconds
    pub fn from_unix(start: i64, end: i64) -> Result<Self> {
        let window = Self {
            start: from_unix_seconds(start)?,
            end: from_unix_seconds(end)?,
        };
        if window.start >= window.end {
            return Err(Error::InvalidInput(format!(
                "empty week window [{}, {})",
                start, end
            )));
        }
        Ok(window)
    }

    pub fn start_unix(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_unix(&self) -> i64 {
        self.end.timestamp()
    }
}

/// Monday 00:00 (in `offset`) at or before `instant`
fn week_start(instant: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = instant.with_timezone(&offset);
    let days_since_monday = i64::from(local.weekday().num_days_from_monday());
    let monday = local.date_naive() - Duration::days(days_since_monday);
    let local_midnight = monday.and_time(NaiveTime::MIN);
    let utc_midnight = local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc_midnight, Utc)
}
