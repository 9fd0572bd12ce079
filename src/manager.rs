//! One check cycle of the pool pump.
//!
//! A cycle reads the host state once, builds today's schedule, works out the
//! label to show (next run, tomorrow's first run, or a status), decides whether
//! the pump should be on, and applies that decision to the switch.
//!
//! ```text
//! Idle ─▶ mode != Auto ─────────────────────────▶ Manual (switch untouched)
//!   └──▶ water level critical ─────────────────▶ Off
//!   └──▶ inside a run ─────────────────────────▶ On
//!   └──▶ otherwise ────────────────────────────▶ Off
//! ```
//!
//! Nothing is kept between cycles.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::constants::*;
use crate::host::{InputSnapshot, PoolStateReader, PumpSwitch, StatusSink, SwitchState};
use crate::logger::Log;
use crate::run::Run;
use crate::schedule::{Schedule, build_schedule};
use crate::season::Season;
use crate::sun::SunriseProvider;

/// What happened to the pump switch during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Already in the target state
    Unchanged(SwitchState),
    /// Switched from one state to the other
    Switched { from: SwitchState, to: SwitchState },
    /// No switch target configured; the decision could not be applied
    MissingTarget,
    /// The switch could not be read or written
    Unavailable,
}

/// Result of one check cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    /// Pump mode is not `Auto`; nothing was evaluated
    Manual { mode: String },
    /// Automatic control ran
    Auto {
        should_be_on: bool,
        schedule_label: String,
        switch: SwitchOutcome,
    },
}

/// Collaborators and policy for running check cycles.
pub struct PoolPumpManager<'a> {
    pub reader: &'a dyn PoolStateReader,
    pub sunrise: &'a dyn SunriseProvider,
    pub switch: Option<&'a dyn PumpSwitch>,
    pub status: &'a dyn StatusSink,
    pub season: Season,
}

impl<'a> PoolPumpManager<'a> {
    /// Build the schedule for the calendar day of `reference`.
    pub fn schedule_for(&self, reference: NaiveDate, run_hours_total: f64) -> Result<Schedule> {
        let sunrise = self
            .sunrise
            .sunrise_on(reference)
            .with_context(|| format!("Sunrise unavailable for {}", reference))?;
        let schedule = build_schedule(sunrise, run_hours_total, &self.season.policy())
            .with_context(|| format!("Failed to build schedule for {}", reference))?;
        Log::log_debug(&format!("Manager initialised: {}", schedule));
        Ok(schedule)
    }

    /// The run that is current or next at `now`, falling back to the first
    /// run of tomorrow's schedule once today's runs are over.
    pub fn upcoming_run(
        &self,
        now: NaiveDateTime,
        today: &Schedule,
        run_hours_total: f64,
    ) -> Result<Option<Run>> {
        if let Some(run) = today.next_run(now) {
            Log::log_debug(&format!("Next run: {}", run));
            return Ok(Some(*run));
        }

        let Some(tomorrow) = now.date().checked_add_days(Days::new(1)) else {
            return Ok(None);
        };
        let next_midnight = tomorrow.and_time(NaiveTime::MIN);
        Log::log_debug(&format!("Next midnight: {}", next_midnight));

        let schedule = self.schedule_for(tomorrow, run_hours_total)?;
        let run = schedule.next_run(next_midnight).copied();
        if let Some(run) = &run {
            Log::log_debug(&format!("Next run: {}", run));
        }
        Ok(run)
    }

    /// Run one full check cycle at `now`.
    pub fn check(&self, now: NaiveDateTime) -> Result<CycleReport> {
        let mode = self.reader.mode()?;
        Log::log_debug(&format!("Pool pump mode: {}", mode));

        if mode != POOL_PUMP_MODE_AUTO {
            self.publish(SCHEDULE_LABEL_MANUAL_MODE);
            return Ok(CycleReport::Manual { mode });
        }

        let inputs = InputSnapshot::resolve(self.reader)?;
        let today = self.schedule_for(now.date(), inputs.run_hours_total)?;

        let schedule_label = if inputs.water_level_critical {
            SCHEDULE_LABEL_WATER_LEVEL_CRITICAL.to_string()
        } else {
            match self.upcoming_run(now, &today, inputs.run_hours_total)? {
                Some(run) => run.format_range(now.date()),
                None => SCHEDULE_LABEL_NO_RUN.to_string(),
            }
        };
        self.publish(&schedule_label);

        let should_be_on = today.should_be_on_now(now, inputs.water_level_critical);
        if inputs.water_level_critical {
            Log::log_debug("Water level critical - pump should be off");
        } else if let Some(run) = today.active_run(now) {
            Log::log_debug(&format!("Pool pump should be on now: {}", run));
        } else {
            Log::log_debug("Pool pump should be off");
        }

        let switch = self.apply(SwitchState::from_decision(should_be_on));

        Ok(CycleReport::Auto {
            should_be_on,
            schedule_label,
            switch,
        })
    }

    fn publish(&self, label: &str) {
        if let Err(e) = self.status.publish_schedule(label) {
            Log::log_warning(&format!("Failed to publish schedule: {}", e));
        }
    }

    fn apply(&self, target: SwitchState) -> SwitchOutcome {
        let Some(switch) = self.switch else {
            Log::log_error("Switch target must be provided");
            return SwitchOutcome::MissingTarget;
        };

        let current = match switch.state() {
            Ok(state) => state,
            Err(e) => {
                Log::log_warning(&format!("Switch unavailable: {}", e));
                return SwitchOutcome::Unavailable;
            }
        };

        if current == target {
            Log::log_debug(&format!("Switch is in correct state: {}", target.as_str()));
            return SwitchOutcome::Unchanged(current);
        }

        match switch.set_state(target) {
            Ok(()) => {
                Log::log_info(&format!(
                    "Switching pool pump from '{}' to '{}'",
                    current.as_str(),
                    target.as_str()
                ));
                SwitchOutcome::Switched {
                    from: current,
                    to: target,
                }
            }
            Err(e) => {
                Log::log_warning(&format!("Switch unavailable: {}", e));
                SwitchOutcome::Unavailable
            }
        }
    }
}
