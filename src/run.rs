//! A single pump run: one contiguous interval during which the pump is on.
//!
//! Runs are immutable values. Two membership checks exist and differ on
//! purpose at the stop boundary:
//! - [`Run::contains_instant`] is half-open (`start <= t < stop`), so the stop
//!   instant already belongs to whatever follows.
//! - [`Run::is_upcoming_or_current`] is inclusive (`t <= stop`), so a run that
//!   stops exactly now is still reported as the next run.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt;

use crate::error::ScheduleError;

/// Convert a length in minutes (possibly fractional) to a chrono duration.
///
/// Lengths are resolved to the millisecond. Negative, non-finite, or
/// out-of-range values are rejected.
pub fn minutes_to_duration(minutes: f64) -> Result<Duration, ScheduleError> {
    if !minutes.is_finite() || minutes < 0.0 {
        return Err(ScheduleError::InvalidDuration(minutes));
    }
    let millis = (minutes * 60_000.0).round();
    if millis > i64::MAX as f64 {
        return Err(ScheduleError::InvalidDuration(minutes));
    }
    Duration::try_milliseconds(millis as i64).ok_or(ScheduleError::InvalidDuration(minutes))
}

/// One scheduled interval: `start` plus `duration_minutes`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Run {
    start: NaiveDateTime,
    stop: NaiveDateTime,
    duration_minutes: f64,
}

impl Run {
    /// Create a run starting at `start` and lasting `duration_minutes`.
    ///
    /// A zero-length run is allowed and degenerates to an empty interval.
    pub fn new(start: NaiveDateTime, duration_minutes: f64) -> Result<Self, ScheduleError> {
        let duration = minutes_to_duration(duration_minutes)?;
        let stop = start
            .checked_add_signed(duration)
            .ok_or(ScheduleError::InvalidDuration(duration_minutes))?;
        Ok(Self {
            start,
            stop,
            duration_minutes,
        })
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start
    }

    /// `start + duration`.
    pub fn stop_time(&self) -> NaiveDateTime {
        self.stop
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_minutes
    }

    /// Check if the provided time falls within this run's timeframe.
    pub fn contains_instant(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time < self.stop
    }

    /// Check if this run has not finished yet at `time` (running now or still to come).
    pub fn is_upcoming_or_current(&self, time: NaiveDateTime) -> bool {
        time <= self.stop
    }

    /// Human readable start/stop range, e.g. `07:15 - 08:45`.
    ///
    /// When the run starts on a different calendar day than `today`, the
    /// weekday is prepended (`Tue, 07:15 - 08:45`).
    pub fn format_range(&self, today: NaiveDate) -> String {
        let start = if self.start.date() != today {
            self.start.format("%a, %H:%M")
        } else {
            self.start.format("%H:%M")
        };
        format!("{} - {}", start, self.stop.format("%H:%M"))
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run(start={}, stop={}, duration={:.1} min)",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.stop.format("%Y-%m-%d %H:%M:%S"),
            self.duration_minutes
        )
    }
}
