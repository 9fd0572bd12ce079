//! Application constants and default values for poolpump.
//!
//! This module contains the season presets, configuration defaults,
//! validation limits, and operational constants used throughout the application.

// ═══ Season Presets ═══
// Minutes after sunrise before the first run, and the break between the two runs

pub const SWIMMING_SEASON_RUN_1_AFTER_SUNRISE_OFFSET_MINUTES: f64 = 75.0;
pub const SWIMMING_SEASON_BREAK_MINUTES: f64 = 60.0;

pub const OFF_SEASON_RUN_1_AFTER_SUNRISE_OFFSET_MINUTES: f64 = 120.0;
pub const OFF_SEASON_BREAK_MINUTES: f64 = 60.0;

// ═══ Schedule Geometry ═══

pub const HOURS_PER_DAY: f64 = 24.0;
pub const MINUTES_PER_HOUR: f64 = 60.0;
pub const RUN_START_GRID_MINUTES: u32 = 5; // run starts snap to :00, :05, ... :55

// ═══ Host Integration ═══
// States and labels exchanged with the files the daemon watches

pub const POOL_PUMP_MODE_AUTO: &str = "Auto";
pub const STATE_ON: &str = "on";
pub const STATE_OFF: &str = "off";
pub const SCHEDULE_LABEL_WATER_LEVEL_CRITICAL: &str = "Water Level Critical";
pub const SCHEDULE_LABEL_MANUAL_MODE: &str = "Manual Mode";
pub const SCHEDULE_LABEL_NO_RUN: &str = "No Run Scheduled";

// Pool temperature (°C) is halved to get the total daily run-hours
pub const TEMPERATURE_TO_RUN_HOURS_DIVISOR: f64 = 2.0;

// ═══ Application Configuration Defaults ═══
// These values are used when config options are not specified by the user

pub const DEFAULT_SUNRISE: &str = "06:00:00"; // used when no coordinates are configured
pub const DEFAULT_SEASON: &str = "swimming";
pub const DEFAULT_SCAN_INTERVAL: u64 = 30; // seconds between checks
pub const DEFAULT_MODE_PATH: &str = "/run/poolpump/mode";
pub const DEFAULT_TEMPERATURE_PATH: &str = "/run/poolpump/temperature";
pub const DEFAULT_SWITCH_PATH: &str = "/run/poolpump/switch";
pub const DEFAULT_SCHEDULE_PATH: &str = "/run/poolpump/schedule";

// ═══ Validation Limits ═══

pub const MINIMUM_SCAN_INTERVAL: u64 = 5; // seconds
pub const MAXIMUM_SCAN_INTERVAL: u64 = 3600; // seconds (one check an hour at most)

// ═══ Operational Timing Constants ═══

pub const CHECK_INTERVAL_SECS: u64 = 1; // How often to check the running flag during sleep

// ═══ Exit Codes ═══

pub const EXIT_FAILURE: i32 = 1; // General failure

// ═══ Test Constants ═══
// Common values used in tests for consistency
#[cfg(test)]
pub mod test_constants {
    pub const TEST_STANDARD_SUNRISE: &str = "06:00:00";
    pub const TEST_STANDARD_SCAN_INTERVAL: u64 = 30;
    pub const TEST_STANDARD_RUN_HOURS: f64 = 6.0;
    pub const TEST_STANDARD_TEMPERATURE: f64 = 12.0; // halves to TEST_STANDARD_RUN_HOURS
}
