//! Daily run schedule derivation and evaluation.
//!
//! This module turns a day's sunrise, the total run-hours wanted for that day,
//! and a season policy into an ordered list of disjoint [`Run`]s, and answers
//! the two questions asked of it every cycle: should the pump be on now, and
//! which run is next.
//!
//! ## Shape of a day
//!
//! ```text
//! sunrise ─ offset ─▶ run A ─ break ─▶ run B
//! ```
//!
//! Both runs get half of the requested run time. Run starts are snapped
//! forward onto a 5-minute grid, so the break can grow by up to one grid step.
//!
//! ## Slack handling
//! - Less than 24 run-hours: when the remaining slack of the day cannot hold
//!   the configured offset plus break, both shrink to half of the slack.
//! - 24 run-hours or more: the break collapses to zero and the configured
//!   offset is kept as is, so the second run ends past the next sunrise.
//!
//! A schedule covers exactly one reference day. Looking past the last run of
//! the day means building the next day's schedule (see `manager`).

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

use crate::constants::{HOURS_PER_DAY, MINUTES_PER_HOUR, RUN_START_GRID_MINUTES};
use crate::error::ScheduleError;
use crate::logger::Log;
use crate::run::{Run, minutes_to_duration};
use crate::season::SeasonPolicy;

/// Offset after sunrise and the alternating run/break/run durations for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleParameters {
    pub offset_minutes: f64,
    /// Minutes, alternating run, break, run.
    pub durations: Vec<f64>,
}

impl ScheduleParameters {
    /// Derive the day's parameters from the total run-hours and a season policy.
    ///
    /// `run_hours_total` is taken as given; converting a sensor reading into
    /// run-hours happens before this point.
    pub fn derive(run_hours_total: f64, policy: &SeasonPolicy) -> Self {
        let mut offset = policy.offset_after_sunrise_minutes;
        let mut break_duration = policy.break_minutes;

        if run_hours_total < HOURS_PER_DAY {
            let breaks_maximum = (HOURS_PER_DAY - run_hours_total) * MINUTES_PER_HOUR;
            Log::log_debug(&format!(
                "Breaks maximum is {:.1} for offset {} and break {}",
                breaks_maximum, offset, break_duration
            ));
            if breaks_maximum < break_duration + offset {
                offset = breaks_maximum / 2.0;
                break_duration = breaks_maximum / 2.0;
                Log::log_debug(&format!(
                    "Shortened offset to {:.1} and break to {:.1}",
                    offset, break_duration
                ));
            }
        } else {
            // Continuous run. The offset is deliberately left untouched.
            break_duration = 0.0;
            Log::log_debug(&format!("Break shortened to {:.1}", break_duration));
        }

        let duration = run_hours_total * MINUTES_PER_HOUR * 0.5;
        Self {
            offset_minutes: offset,
            durations: vec![duration, break_duration, duration],
        }
    }
}

/// Snap a timestamp forward onto the next 5-minute, second-0 boundary.
///
/// Already aligned timestamps are returned unchanged. Any remainder, down to
/// a single nanosecond, moves the result to the following boundary, which may
/// be on the next day.
pub fn round_up_to_grid(time: NaiveDateTime) -> NaiveDateTime {
    let grid_secs = i64::from(RUN_START_GRID_MINUTES) * 60;
    let secs = i64::from(time.num_seconds_from_midnight());
    let remainder = secs % grid_secs;

    if remainder == 0 && time.nanosecond() == 0 {
        return time;
    }

    let floor = time.date().and_time(NaiveTime::MIN) + Duration::seconds(secs - remainder);
    floor + Duration::seconds(grid_secs)
}

/// Builder for a [`Schedule`] from a first start time and a duration list.
///
/// Durations alternate run, break, run, break, ... and must hold at least one
/// entry. Every run after the first starts at the previous run's stop plus the
/// break, rounded up onto the grid.
#[derive(Debug, Clone, Default)]
pub struct ScheduleBuilder {
    first_run_start: Option<NaiveDateTime>,
    durations: Vec<f64>,
}

impl ScheduleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_run_start(mut self, start: NaiveDateTime) -> Self {
        self.first_run_start = Some(start);
        self
    }

    pub fn durations(mut self, durations: impl Into<Vec<f64>>) -> Self {
        self.durations = durations.into();
        self
    }

    pub fn build(self) -> Result<Schedule, ScheduleError> {
        let mut start = self.first_run_start.ok_or(ScheduleError::MissingStartTime)?;
        if self.durations.is_empty() {
            return Err(ScheduleError::MissingDurations);
        }

        let mut runs = Vec::with_capacity(self.durations.len() / 2 + 1);
        let mut remaining = self.durations.as_slice();

        while let Some((&run_duration, rest)) = remaining.split_first() {
            let run = Run::new(start, run_duration)?;
            runs.push(run);

            match rest {
                [break_minutes, tail @ ..] if !tail.is_empty() => {
                    let break_duration = minutes_to_duration(*break_minutes)?;
                    let resume = run
                        .stop_time()
                        .checked_add_signed(break_duration)
                        .ok_or(ScheduleError::InvalidDuration(*break_minutes))?;
                    start = round_up_to_grid(resume);
                    remaining = tail;
                }
                _ => break,
            }
        }

        Ok(Schedule { runs })
    }
}

/// Build the schedule for the day whose sunrise is `sunrise`.
pub fn build_schedule(
    sunrise: NaiveDateTime,
    run_hours_total: f64,
    policy: &SeasonPolicy,
) -> Result<Schedule, ScheduleError> {
    let parameters = ScheduleParameters::derive(run_hours_total, policy);
    let offset = minutes_to_duration(parameters.offset_minutes)?;
    let first_run_start = sunrise
        .checked_add_signed(offset)
        .map(round_up_to_grid)
        .ok_or(ScheduleError::InvalidDuration(parameters.offset_minutes))?;

    ScheduleBuilder::new()
        .first_run_start(first_run_start)
        .durations(parameters.durations)
        .build()
}

/// Ordered, non-overlapping runs for one reference day.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    runs: Vec<Run>,
}

impl Schedule {
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Whether the pump should be running at `now`.
    ///
    /// A critical water level forces the pump off regardless of the runs.
    pub fn should_be_on_now(&self, now: NaiveDateTime, water_level_critical: bool) -> bool {
        if water_level_critical {
            return false;
        }
        self.active_run(now).is_some()
    }

    /// The run containing `now`, if any.
    pub fn active_run(&self, now: NaiveDateTime) -> Option<&Run> {
        self.runs.iter().find(|run| run.contains_instant(now))
    }

    /// The first run that has not finished at `now`, including one in progress.
    ///
    /// `None` once every run of this day is over.
    pub fn next_run(&self, now: NaiveDateTime) -> Option<&Run> {
        self.runs.iter().find(|run| run.is_upcoming_or_current(now))
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schedule[")?;
        for (i, run) in self.runs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", run)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::TEST_STANDARD_RUN_HOURS;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 18)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {} but got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_derive_standard_hours() {
        let params = ScheduleParameters::derive(TEST_STANDARD_RUN_HOURS, &SeasonPolicy::SWIMMING);
        assert_eq!(params.offset_minutes, 75.0);
        assert_eq!(params.durations, vec![180.0, 60.0, 180.0]);
    }

    #[test]
    fn test_derive_three_hours_gives_ninety_minute_runs() {
        // A 6 °C reading halves to 3 run-hours
        let params = ScheduleParameters::derive(3.0, &SeasonPolicy::SWIMMING);
        assert_eq!(params.offset_minutes, 75.0);
        assert_eq!(params.durations, vec![90.0, 60.0, 90.0]);
    }

    #[test]
    fn test_derive_off_season_offset() {
        let params = ScheduleParameters::derive(3.0, &SeasonPolicy::OFF_SEASON);
        assert_eq!(params.offset_minutes, 120.0);
        assert_eq!(params.durations, vec![90.0, 60.0, 90.0]);
    }

    #[test]
    fn test_derive_shrinks_offset_and_break_near_full_day() {
        let params = ScheduleParameters::derive(23.9, &SeasonPolicy::SWIMMING);
        assert_close(params.offset_minutes, 3.0);
        assert_close(params.durations[1], 3.0);
        assert_close(params.durations[0], 717.0);
        assert_close(params.durations[2], 717.0);
    }

    #[test]
    fn test_derive_no_shrink_at_exact_slack() {
        // 21.75 h leaves 135 minutes: exactly offset + break
        let params = ScheduleParameters::derive(21.75, &SeasonPolicy::SWIMMING);
        assert_eq!(params.offset_minutes, 75.0);
        assert_eq!(params.durations[1], 60.0);
    }

    #[test]
    fn test_derive_full_day_collapses_break_keeps_offset() {
        let params = ScheduleParameters::derive(24.0, &SeasonPolicy::SWIMMING);
        assert_eq!(params.offset_minutes, 75.0);
        assert_eq!(params.durations, vec![720.0, 0.0, 720.0]);
    }

    #[test]
    fn test_derive_zero_hours() {
        let params = ScheduleParameters::derive(0.0, &SeasonPolicy::SWIMMING);
        assert_eq!(params.durations, vec![0.0, 60.0, 0.0]);
    }

    #[test]
    fn test_round_up_to_grid_aligned_unchanged() {
        assert_eq!(round_up_to_grid(at(7, 15)), at(7, 15));
        assert_eq!(round_up_to_grid(at(0, 0)), at(0, 0));
    }

    #[test]
    fn test_round_up_to_grid_moves_forward() {
        assert_eq!(round_up_to_grid(at(7, 16)), at(7, 20));
        assert_eq!(round_up_to_grid(at(7, 19)), at(7, 20));
        assert_eq!(round_up_to_grid(at(7, 15) + Duration::seconds(1)), at(7, 20));
        assert_eq!(
            round_up_to_grid(at(7, 15) + Duration::milliseconds(1)),
            at(7, 20)
        );
    }

    #[test]
    fn test_round_up_to_grid_crosses_midnight() {
        let next_day = NaiveDate::from_ymd_opt(2024, 6, 19)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(round_up_to_grid(at(23, 57)), next_day);
    }

    #[test]
    fn test_builder_requires_start_time() {
        let result = ScheduleBuilder::new().durations(vec![90.0]).build();
        assert_eq!(result, Err(ScheduleError::MissingStartTime));
    }

    #[test]
    fn test_builder_requires_durations() {
        let result = ScheduleBuilder::new().first_run_start(at(7, 15)).build();
        assert_eq!(result, Err(ScheduleError::MissingDurations));
    }

    #[test]
    fn test_builder_rejects_negative_break() {
        let result = ScheduleBuilder::new()
            .first_run_start(at(7, 15))
            .durations(vec![90.0, -5.0, 90.0])
            .build();
        assert_eq!(result, Err(ScheduleError::InvalidDuration(-5.0)));
    }

    #[test]
    fn test_builder_single_duration() {
        let schedule = ScheduleBuilder::new()
            .first_run_start(at(7, 15))
            .durations(vec![30.0])
            .build()
            .unwrap();
        assert_eq!(schedule.runs().len(), 1);
        assert_eq!(schedule.runs()[0].stop_time(), at(7, 45));
    }

    #[test]
    fn test_builder_drops_trailing_break() {
        // A break with no run after it produces nothing
        let schedule = ScheduleBuilder::new()
            .first_run_start(at(7, 15))
            .durations(vec![30.0, 60.0])
            .build()
            .unwrap();
        assert_eq!(schedule.runs().len(), 1);
    }

    #[test]
    fn test_builder_longer_pattern() {
        let schedule = ScheduleBuilder::new()
            .first_run_start(at(7, 0))
            .durations(vec![30.0, 30.0, 30.0, 30.0, 30.0])
            .build()
            .unwrap();
        let starts: Vec<_> = schedule.runs().iter().map(|r| r.start_time()).collect();
        assert_eq!(starts, vec![at(7, 0), at(8, 0), at(9, 0)]);
    }

    #[test]
    fn test_builder_rounds_next_start_onto_grid() {
        let schedule = ScheduleBuilder::new()
            .first_run_start(at(7, 15))
            .durations(vec![97.5, 3.0, 97.5])
            .build()
            .unwrap();
        // 07:15 + 97.5 min = 08:52:30, + 3 min = 08:55:30 → 09:00
        assert_eq!(schedule.runs()[1].start_time(), at(9, 0));
    }

    #[test]
    fn test_build_schedule_reference_day() {
        let schedule = build_schedule(at(6, 0), 3.0, &SeasonPolicy::SWIMMING).unwrap();
        let runs = schedule.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].start_time(), at(7, 15));
        assert_eq!(runs[0].stop_time(), at(8, 45));
        assert_eq!(runs[1].start_time(), at(9, 45));
        assert_eq!(runs[1].stop_time(), at(11, 15));
    }

    #[test]
    fn test_build_schedule_rounds_first_start() {
        let sunrise = at(5, 52) + Duration::seconds(17);
        let schedule = build_schedule(sunrise, 3.0, &SeasonPolicy::SWIMMING).unwrap();
        // 05:52:17 + 75 min = 07:07:17 → 07:10
        assert_eq!(schedule.runs()[0].start_time(), at(7, 10));
    }

    #[test]
    fn test_build_schedule_negative_hours_rejected() {
        let result = build_schedule(at(6, 0), -2.0, &SeasonPolicy::SWIMMING);
        assert_eq!(result, Err(ScheduleError::InvalidDuration(-60.0)));
    }

    #[test]
    fn test_build_schedule_full_day_overflows_past_next_sunrise() {
        let schedule = build_schedule(at(6, 0), 24.0, &SeasonPolicy::SWIMMING).unwrap();
        let runs = schedule.runs();
        assert_eq!(runs[0].start_time(), at(7, 15));
        // No break: the second run starts where the first stops
        assert_eq!(runs[1].start_time(), runs[0].stop_time());
        assert!(runs[1].stop_time() - at(6, 0) > Duration::hours(24));
    }

    #[test]
    fn test_should_be_on_now() {
        let schedule = build_schedule(at(6, 0), 3.0, &SeasonPolicy::SWIMMING).unwrap();
        assert!(schedule.should_be_on_now(at(8, 0), false));
        assert!(!schedule.should_be_on_now(at(9, 0), false));
        assert!(schedule.should_be_on_now(at(9, 45), false));
        assert!(!schedule.should_be_on_now(at(11, 15), false));
        assert!(!schedule.should_be_on_now(at(5, 0), false));
    }

    #[test]
    fn test_critical_water_level_forces_off() {
        let schedule = build_schedule(at(6, 0), 3.0, &SeasonPolicy::SWIMMING).unwrap();
        assert!(!schedule.should_be_on_now(at(8, 0), true));
        assert!(!schedule.should_be_on_now(at(10, 0), true));
    }

    #[test]
    fn test_next_run() {
        let schedule = build_schedule(at(6, 0), 3.0, &SeasonPolicy::SWIMMING).unwrap();
        assert_eq!(schedule.next_run(at(5, 0)).unwrap().start_time(), at(7, 15));
        assert_eq!(schedule.next_run(at(8, 0)).unwrap().start_time(), at(7, 15));
        // Inclusive at the stop instant, unlike should_be_on_now
        assert_eq!(schedule.next_run(at(8, 45)).unwrap().start_time(), at(7, 15));
        assert_eq!(schedule.next_run(at(8, 46)).unwrap().start_time(), at(9, 45));
        assert!(schedule.next_run(at(12, 0)).is_none());
    }

    #[test]
    fn test_display_lists_runs() {
        let schedule = build_schedule(at(6, 0), 3.0, &SeasonPolicy::SWIMMING).unwrap();
        let rendered = schedule.to_string();
        assert!(rendered.starts_with("Schedule[Run(start=2024-06-18 07:15:00"));
        assert!(rendered.contains(", Run(start=2024-06-18 09:45:00"));
    }
}
