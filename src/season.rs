//! Season policy presets.
//!
//! The season decides how long after sunrise the first run starts and how long
//! the pump rests between runs. Which season applies is the caller's decision;
//! it is read from configuration and passed explicitly to schedule construction.

use serde::Deserialize;

use crate::constants::*;

/// Offset and break defaults for one season.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonPolicy {
    /// Minutes after sunrise before the first run begins
    pub offset_after_sunrise_minutes: f64,
    /// Rest interval between the two runs, in minutes
    pub break_minutes: f64,
}

impl SeasonPolicy {
    pub const SWIMMING: SeasonPolicy = SeasonPolicy {
        offset_after_sunrise_minutes: SWIMMING_SEASON_RUN_1_AFTER_SUNRISE_OFFSET_MINUTES,
        break_minutes: SWIMMING_SEASON_BREAK_MINUTES,
    };

    pub const OFF_SEASON: SeasonPolicy = SeasonPolicy {
        offset_after_sunrise_minutes: OFF_SEASON_RUN_1_AFTER_SUNRISE_OFFSET_MINUTES,
        break_minutes: OFF_SEASON_BREAK_MINUTES,
    };
}

/// Named season selecting one of the [`SeasonPolicy`] presets.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    #[default]
    Swimming,
    OffSeason,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Swimming => "swimming",
            Season::OffSeason => "off_season",
        }
    }

    pub fn policy(&self) -> SeasonPolicy {
        match self {
            Season::Swimming => SeasonPolicy::SWIMMING,
            Season::OffSeason => SeasonPolicy::OFF_SEASON,
        }
    }
}
