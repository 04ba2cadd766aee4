//! Polling schedule primitives
//!
//! A [`Period`] describes how often a source should be polled. The [`Period::is_due`]
//! predicate is pure and CPU-only so it can be tested without any I/O; the caller is
//! expected to invoke it at minute granularity (e.g. from cron or a timer loop).

use crate::{BoardSyncError, Result};
use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

/// Polling period kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Poll on every scheduler invocation; the interval is ignored
    Default,
    Day,
    Hour,
    Minute,
}

impl Default for PeriodType {
    fn default() -> Self {
        PeriodType::Default
    }
}

/// How often a source should be polled
///
/// Deserialized from configuration and immutable afterwards. The interval is kept
/// signed so that a negative value from the config surfaces as a validation error
/// rather than a silent wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(rename = "type", default)]
    pub period_type: PeriodType,

    #[serde(default)]
    pub interval: i32,
}

impl Default for Period {
    fn default() -> Self {
        Self {
            period_type: PeriodType::Default,
            interval: 0,
        }
    }
}

impl Period {
    /// Check whether a source with this period is due at the given instant.
    ///
    /// Day periods are due exactly once, at midnight, on qualifying days; hour
    /// periods on the hour. Validation failures mean the source is not due and
    /// should be skipped with the error reported.
    pub fn is_due(&self, now: DateTime<FixedOffset>) -> Result<bool> {
        let interval = self.interval;
        if interval < 0 {
            return Err(BoardSyncError::Config(format!(
                "period interval must be non-negative, got: '{}'",
                interval
            )));
        }

        match self.period_type {
            PeriodType::Default => Ok(true),
            PeriodType::Day => {
                Self::check_interval(interval, 31, "daily")?;
                Ok(now.day() as i32 % interval == 0 && now.hour() == 0 && now.minute() == 0)
            }
            PeriodType::Hour => {
                Self::check_interval(interval, 23, "hourly")?;
                Ok(now.hour() as i32 % interval == 0 && now.minute() == 0)
            }
            PeriodType::Minute => {
                Self::check_interval(interval, 60, "minute")?;
                Ok(now.minute() as i32 % interval == 0)
            }
        }
    }

    fn check_interval(interval: i32, max: i32, kind: &str) -> Result<()> {
        if interval == 0 {
            return Err(BoardSyncError::Config(format!(
                "{} interval cannot be zero",
                kind
            )));
        }
        if interval > max {
            return Err(BoardSyncError::Config(format!(
                "{} interval cannot be more than {}, got: '{}'",
                kind, max, interval
            )));
        }
        Ok(())
    }
}
