//! Error types for schedule construction.

use thiserror::Error;

/// Errors raised while turning a start time and a duration list into runs.
///
/// Evaluation never fails: "no run matches now" is a plain `None`, not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// No start time was given for the first run
    #[error("Must provide start time for run")]
    MissingStartTime,

    /// The duration list was empty
    #[error("Must provide durations for run")]
    MissingDurations,

    /// A run or break length was negative, not finite, or out of range
    #[error("Invalid duration: {0} minutes")]
    InvalidDuration(f64),
}
